//! Idle Behaviors — small random movements while the character is not
//! speaking, so the model never looks frozen.
//!
//! The loop runs as a background task owned by the controller. Each turn
//! holds the speech turn while it acts, so a behavior never lands inside a
//! lip-sync sequence.

use super::controller::AnimationController;
use crate::error::Result;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const IDLE_GROUP: &str = "idle";

/// Stand-in for waits too long to represent.
const MAX_WAIT: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "params")]
pub enum IdleBehavior {
    #[serde(rename = "look_around")]
    LookAround { x: f32, y: f32 },
    #[serde(rename = "idle_motion")]
    IdleMotion,
}

/// Whether an idle motion may play, given when the last motion started.
pub fn motion_cooled_down(since_last: Option<Duration>, cooldown: Duration) -> bool {
    match since_last {
        Some(elapsed) => elapsed >= cooldown,
        None => true,
    }
}

fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(MAX_WAIT)
}

impl AnimationController {
    /// Spawn the idle loop unless one is already running. Returns whether a
    /// new task was started.
    pub async fn start_idle_behaviors(&self) -> bool {
        let mut slot = self.state.idle_task.lock().await;
        if let Some(handle) = slot.as_ref() {
            if !handle.is_finished() {
                debug!("[Idle] Behaviors already running");
                return false;
            }
        }

        let controller = self.clone();
        *slot = Some(tokio::spawn(async move {
            idle_loop(controller).await;
        }));
        info!("[Idle] Behaviors started");
        true
    }

    /// Cancel the idle loop and wait for it to wind down.
    pub async fn stop_idle_behaviors(&self) {
        let handle = self.state.idle_task.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("[Idle] Behaviors cancelled"),
                Err(e) => warn!("[Idle] Behavior task ended abnormally: {}", e),
            }
        }
    }

    pub async fn idle_running(&self) -> bool {
        self.state
            .idle_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// One scheduler turn: pick and perform a behavior, unless the
    /// foreground is busy. Returns what was performed.
    pub async fn idle_tick(&self) -> Result<Option<IdleBehavior>> {
        // Held until the behavior is sent; speech waits for it.
        let Ok(_turn) = self.state.speech_turn.try_lock() else {
            return Ok(None);
        };
        if self.is_speaking() {
            return Ok(None);
        }

        let idle = &self.state.config.idle;
        let choice = {
            let mut rng = self.state.rng.lock().await;
            if rng.gen_bool(0.5) {
                let rx = idle.gaze_range_x.abs().min(1.0);
                let ry = idle.gaze_range_y.abs().min(1.0);
                let x = rng.gen_range(-rx..=rx);
                let y = rng.gen_range(-ry..=ry);
                IdleBehavior::LookAround { x, y }
            } else {
                IdleBehavior::IdleMotion
            }
        };

        match choice {
            IdleBehavior::LookAround { x, y } => {
                if self.look_at_adaptive(x, y).await? > 0 {
                    return Ok(Some(choice));
                }
            }
            IdleBehavior::IdleMotion => {
                if self.idle_motion_in_turn().await? {
                    return Ok(Some(choice));
                }
            }
        }
        Ok(None)
    }

    /// Play a random `idle` motion if the model has one, nothing is being
    /// spoken and the cooldown since the last motion has passed.
    pub async fn try_idle_motion(&self) -> Result<bool> {
        let Ok(_turn) = self.state.speech_turn.try_lock() else {
            return Ok(false);
        };
        self.idle_motion_in_turn().await
    }

    /// Caller holds the speech turn.
    async fn idle_motion_in_turn(&self) -> Result<bool> {
        self.ensure_probed().await;
        if self.is_speaking() || !self.supports_group(IDLE_GROUP).await {
            return Ok(false);
        }

        let cooldown = secs(self.state.config.idle.motion_cooldown_secs);
        let since_last = {
            let last = self.state.last_motion.lock().await;
            last.map(|t| self.state.clock.now().saturating_duration_since(t))
        };
        if !motion_cooled_down(since_last, cooldown) {
            return Ok(false);
        }

        self.send_command(crate::display::DisplayCommand::play_random_motion(
            IDLE_GROUP,
        ))
        .await?;
        self.record_motion().await;
        debug!("[Idle] Idle animation");
        Ok(true)
    }

    async fn next_idle_interval(&self) -> Duration {
        let idle = &self.state.config.idle;
        let (lo, hi) = (idle.min_interval_secs, idle.max_interval_secs);
        let width = hi - lo;
        if !(width > 0.0 && width.is_finite()) {
            return secs(lo);
        }
        let value = self.state.rng.lock().await.gen_range(lo..=hi);
        secs(value)
    }
}

// Boxed with an explicit `Send` bound: the loop can reach
// `start_idle_behaviors` again, and the compiler cannot infer `Send`
// through that cycle of opaque futures.
fn idle_loop(controller: AnimationController) -> futures::future::BoxFuture<'static, ()> {
    Box::pin(async move {
        let recovery = secs(controller.state.config.idle.recovery_secs);
        loop {
            let wait = controller.next_idle_interval().await;
            controller.state.clock.sleep(wait).await;

            match controller.idle_tick().await {
                Ok(Some(behavior)) => debug!("[Idle] Performed {:?}", behavior),
                Ok(None) => {}
                Err(e) => {
                    warn!("[Idle] Behavior error: {}", e);
                    controller.state.clock.sleep(recovery).await;
                }
            }
        }
    })
}
