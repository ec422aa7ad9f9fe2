//! Response Dispatcher — routes chat text to the animation controller.
//!
//! Assistant replies drive expression, an optional reaction and lip-sync.
//! User messages only get a small attentive glance when they ask something.

use crate::animation::{AnimationController, SpeechOutcome};
use crate::config::SpeechConfig;
use crate::emotion::{self, Emotion};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// What a dispatched message ended up doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub emotion: Option<Emotion>,
    pub reaction: Option<&'static str>,
    /// Seconds of lip-sync that actually ran.
    pub spoke_for: Option<f32>,
    pub looked: bool,
}

/// Lip-sync length for a reply: per-word time, capped.
pub fn speaking_duration(text: &str, speech: &SpeechConfig) -> f32 {
    let words = text.split_whitespace().count() as f32;
    (words * speech.seconds_per_word).min(speech.max_seconds)
}

pub struct ResponseDispatcher {
    controller: AnimationController,
}

impl ResponseDispatcher {
    pub fn new(controller: AnimationController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    /// Animate in response to one chat message. Errors are logged here and
    /// never reach the caller.
    pub async fn on_text(&self, text: &str, role: Role) -> DispatchReport {
        match role {
            Role::Assistant => self.on_assistant_text(text).await,
            Role::User => self.on_user_text(text).await,
        }
    }

    /// The assistant started replying: glance somewhere briefly.
    pub async fn on_response_start(&self) {
        if let Err(e) = self.controller.glance().await {
            warn!("[Dispatcher] Glance failed: {}", e);
        }
    }

    async fn on_assistant_text(&self, text: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        let emotion = emotion::detect(text);
        report.emotion = Some(emotion);
        if let Err(e) = self.controller.set_emotion_adaptive(emotion).await {
            warn!("[Dispatcher] Expression failed: {}", e);
        }

        if emotion::should_emphasize(text) {
            match self.controller.play_reaction_adaptive(emotion).await {
                Ok(group) => report.reaction = group,
                Err(e) => warn!("[Dispatcher] Reaction failed: {}", e),
            }
        }

        let speech = &self.controller.config().speech;
        let duration = speaking_duration(text, speech);
        if duration > speech.min_seconds {
            match self
                .controller
                .speak_for_duration(duration, speech.intensity)
                .await
            {
                Ok(SpeechOutcome::Completed { .. }) => report.spoke_for = Some(duration),
                Ok(SpeechOutcome::Interrupted { frames }) => {
                    debug!("[Dispatcher] Speech cut short after {} frames", frames);
                }
                Ok(SpeechOutcome::Unsupported) => {}
                Err(e) => warn!("[Dispatcher] Speech failed: {}", e),
            }
        }

        report
    }

    async fn on_user_text(&self, text: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        if text.contains('?') {
            match self.controller.look_at_adaptive(0.1, 0.1).await {
                Ok(applied) => report.looked = applied > 0,
                Err(e) => warn!("[Dispatcher] Attentive look failed: {}", e),
            }
        }
        report
    }
}
