//! Adaptive Animation Controller — turns intents into display commands,
//! filtered by what the connected model supports.
//!
//! One controller owns one display link, one capability model and the idle
//! task. It is cheap to clone; clones share the same state.

use crate::capability::{CapabilityModel, CapabilityProbe, CapabilitySnapshot};
use crate::clock::{Clock, TokioClock};
use crate::config::AnimatorConfig;
use crate::display::{CommandResponse, DisplayCommand, ParameterValue, RemoteLink};
use crate::emotion::expression::{emotion_parameters, gaze_parameters, reaction_groups};
use crate::emotion::Emotion;
use crate::error::{AnimatorError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub(super) struct ControllerState {
    pub(super) link: Arc<dyn RemoteLink>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: AnimatorConfig,
    pub(super) capabilities: RwLock<CapabilityModel>,
    /// Foreground (lip-sync) in progress; the idle loop stays quiet.
    pub(super) speaking: AtomicBool,
    /// Last motion-group playback, idle or reaction.
    pub(super) last_motion: Mutex<Option<Instant>>,
    /// Held for the whole of a speak sequence so overlapping requests queue.
    pub(super) speech_turn: Mutex<()>,
    pub(super) rng: Mutex<StdRng>,
    pub(super) idle_task: Mutex<Option<JoinHandle<()>>>,
    /// Serializes probe runs.
    probe_turn: Mutex<()>,
    /// `initialize` could not reach the display; finish setup on first contact.
    setup_pending: AtomicBool,
}

#[derive(Clone)]
pub struct AnimationController {
    pub(super) state: Arc<ControllerState>,
}

/// Keeps `speaking` raised while alive.
pub struct ForegroundGuard {
    state: Arc<ControllerState>,
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        self.state.speaking.store(false, Ordering::SeqCst);
    }
}

impl AnimationController {
    pub fn new(link: Arc<dyn RemoteLink>, config: AnimatorConfig) -> Self {
        Self::with_clock(link, Arc::new(TokioClock), config)
    }

    pub fn with_clock(
        link: Arc<dyn RemoteLink>,
        clock: Arc<dyn Clock>,
        config: AnimatorConfig,
    ) -> Self {
        let rng = match config.idle.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Arc::new(ControllerState {
                link,
                clock,
                config,
                capabilities: RwLock::new(CapabilityModel::new()),
                speaking: AtomicBool::new(false),
                last_motion: Mutex::new(None),
                speech_turn: Mutex::new(()),
                rng: Mutex::new(rng),
                idle_task: Mutex::new(None),
                probe_turn: Mutex::new(()),
                setup_pending: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.state.config
    }

    // ── Lifecycle ──────────────────────────────────────

    /// Connect to the display. Returns false (and logs) when unreachable.
    pub async fn connect(&self) -> bool {
        match self.state.link.connect().await {
            Ok(()) => true,
            Err(e) => {
                warn!("[Animator] Connection failed: {}", e);
                false
            }
        }
    }

    /// Connect, probe, start idle behaviors and switch on the display's own
    /// breathing and blinking. Returns false if the display is unreachable;
    /// the rest of the setup then happens on the first successful contact.
    pub async fn initialize(&self) -> bool {
        if !self.connect().await {
            warn!("[Animator] Could not connect to Hime Display");
            self.state.setup_pending.store(true, Ordering::SeqCst);
            return false;
        }

        self.probe_capabilities().await;
        self.finish_setup().await;
        info!("[Animator] Initialized and ready");
        true
    }

    async fn finish_setup(&self) {
        self.state.setup_pending.store(false, Ordering::SeqCst);
        if self.state.config.idle.enabled {
            self.start_idle_behaviors().await;
        }

        if let Err(e) = self.set_auto_breath(true).await {
            warn!("[Animator] Could not enable auto breath: {}", e);
        }
        if let Err(e) = self.set_auto_eye_blink(true).await {
            warn!("[Animator] Could not enable auto eye blink: {}", e);
        }
    }

    /// Probe on first use when startup ran without a display. Until the
    /// display answers, the model stays unprobed and nothing is sent.
    pub(super) async fn ensure_probed(&self) {
        if self.state.capabilities.read().await.is_probed() {
            return;
        }
        if !self.is_connected() && self.state.link.connect().await.is_err() {
            return;
        }
        info!("[Animator] Display reachable, probing late");
        self.probe_capabilities().await;
        if self.state.setup_pending.swap(false, Ordering::SeqCst) {
            self.finish_setup().await;
        }
    }

    /// Discover model capabilities. Runs once per controller; later calls
    /// return immediately.
    pub async fn probe_capabilities(&self) {
        let _turn = self.state.probe_turn.lock().await;
        if self.state.capabilities.read().await.is_probed() {
            return;
        }

        let probe = CapabilityProbe::new(&self.state.config.probe);
        let found = probe
            .run(self.state.link.as_ref(), self.state.clock.as_ref())
            .await;

        self.state.capabilities.write().await.merge(found);
    }

    /// Stop the idle task, then close the link.
    pub async fn shutdown(&self) {
        info!("[Animator] Shutting down...");
        self.stop_idle_behaviors().await;
        if let Err(e) = self.state.link.close().await {
            warn!("[Animator] Close error: {}", e);
        }
    }

    // ── State queries ──────────────────────────────────

    pub fn is_speaking(&self) -> bool {
        self.state.speaking.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.state.link.is_connected()
    }

    pub async fn capabilities(&self) -> CapabilitySnapshot {
        self.state.capabilities.read().await.snapshot()
    }

    pub async fn supports_parameter(&self, id: &str) -> bool {
        self.state.capabilities.read().await.supports_parameter(id)
    }

    pub async fn supports_group(&self, group: &str) -> bool {
        self.state.capabilities.read().await.supports_group(group)
    }

    /// Raise the foreground flag until the guard is dropped.
    pub(crate) fn begin_foreground(&self) -> ForegroundGuard {
        self.state.speaking.store(true, Ordering::SeqCst);
        ForegroundGuard {
            state: self.state.clone(),
        }
    }

    // ── Command plumbing ───────────────────────────────

    /// Send one command. Transport failures and explicit refusals come back
    /// as errors; bare acknowledgments count as delivered.
    pub async fn send_command(&self, command: DisplayCommand) -> Result<CommandResponse> {
        let action = command.action();
        let response = self.state.link.send(command).await?;
        if response.is_rejected() {
            return Err(AnimatorError::Rejected {
                action: action.to_string(),
                reason: response
                    .error
                    .clone()
                    .unwrap_or_else(|| "no reason given".to_string()),
            });
        }
        Ok(response)
    }

    /// Log `message` the first time `key` comes up.
    async fn warn_once(&self, key: &str, message: &str) {
        if self.state.capabilities.write().await.should_warn(key) {
            info!("[Animator] {}", message);
        }
    }

    async fn supported_subset(&self, entries: &[(&str, f32)]) -> Vec<ParameterValue> {
        let caps = self.state.capabilities.read().await;
        entries
            .iter()
            .filter(|(id, _)| caps.supports_parameter(id))
            .map(|(id, value)| ParameterValue::new(*id, *value))
            .collect()
    }

    /// Send the supported part of `entries` as a single batch.
    async fn apply_batch(&self, entries: &[(&str, f32)], warn_key: &str, warning: &str) -> Result<usize> {
        self.ensure_probed().await;
        let params = self.supported_subset(entries).await;
        if params.is_empty() {
            self.warn_once(warn_key, warning).await;
            return Ok(0);
        }
        let count = params.len();
        self.send_command(DisplayCommand::set_parameters(params)).await?;
        Ok(count)
    }

    pub(super) async fn record_motion(&self) {
        *self.state.last_motion.lock().await = Some(self.state.clock.now());
    }

    // ── Adaptive operations ────────────────────────────

    /// Apply an emotion's expression. Returns how many parameters were set.
    pub async fn set_emotion_adaptive(&self, emotion: Emotion) -> Result<usize> {
        let applied = self
            .apply_batch(
                emotion_parameters(emotion),
                &format!("emotion:{}", emotion),
                &format!("No compatible parameters for emotion '{}'", emotion),
            )
            .await?;
        if applied > 0 {
            debug!("[Animator] Emotion {} — applied {} parameters", emotion, applied);
        }
        Ok(applied)
    }

    /// Same as [`set_emotion_adaptive`](Self::set_emotion_adaptive) for a raw
    /// tag; unknown tags use the neutral expression.
    pub async fn set_emotion_tag(&self, tag: &str) -> Result<usize> {
        self.set_emotion_adaptive(Emotion::from_tag_lossy(tag)).await
    }

    /// Point eyes (and, scaled down, the head) at `(x, y)` in `[-1, 1]`.
    pub async fn look_at_adaptive(&self, x: f32, y: f32) -> Result<usize> {
        let applied = self
            .apply_batch(
                &gaze_parameters(x, y),
                "gaze",
                "Model doesn't support gaze control",
            )
            .await?;
        if applied > 0 {
            debug!("[Animator] Looking (x={:.1}, y={:.1})", x, y);
        }
        Ok(applied)
    }

    /// Quick random glance, slightly biased upwards.
    pub async fn glance(&self) -> Result<usize> {
        let (x, y) = {
            let mut rng = self.state.rng.lock().await;
            (rng.gen_range(-0.3..=0.3), rng.gen_range(-0.1..=0.2))
        };
        self.look_at_adaptive(x, y).await
    }

    /// Play a random motion from the first supported group preferred for
    /// `emotion`. Returns the group played, if any.
    pub async fn play_reaction_adaptive(&self, emotion: Emotion) -> Result<Option<&'static str>> {
        self.ensure_probed().await;
        let group = {
            let caps = self.state.capabilities.read().await;
            if !caps.has_motions() {
                return Ok(None);
            }
            reaction_groups(emotion)
                .iter()
                .copied()
                .find(|g| caps.supports_group(g))
        };

        let Some(group) = group else {
            self.warn_once(
                &format!("reaction:{}", emotion),
                &format!("No compatible animation groups for '{}'", emotion),
            )
            .await;
            return Ok(None);
        };

        self.send_command(DisplayCommand::play_random_motion(group))
            .await?;
        self.record_motion().await;
        debug!("[Animator] Played animation: {}", group);
        Ok(Some(group))
    }

    /// Play a specific motion. Skipped when the group is not supported.
    pub async fn play_motion(&self, group: &str, index: u32) -> Result<bool> {
        self.ensure_probed().await;
        if !self.supports_group(group).await {
            self.warn_once(
                &format!("group:{}", group),
                &format!("Model has no '{}' motion group", group),
            )
            .await;
            return Ok(false);
        }
        self.send_command(DisplayCommand::PlayMotion {
            group: group.to_string(),
            index,
        })
        .await?;
        self.record_motion().await;
        Ok(true)
    }

    // ── Display toggles ────────────────────────────────

    pub async fn set_auto_breath(&self, enabled: bool) -> Result<()> {
        self.send_command(DisplayCommand::SetAutoBreath { enabled })
            .await
            .map(|_| ())
    }

    pub async fn set_auto_eye_blink(&self, enabled: bool) -> Result<()> {
        self.send_command(DisplayCommand::SetAutoEyeBlink { enabled })
            .await
            .map(|_| ())
    }

    pub async fn set_track_mouse(&self, enabled: bool) -> Result<()> {
        self.send_command(DisplayCommand::SetTrackMouse { enabled })
            .await
            .map(|_| ())
    }

    pub async fn show_display(&self) -> Result<()> {
        self.send_command(DisplayCommand::ShowDisplay {})
            .await
            .map(|_| ())
    }

    pub async fn hide_display(&self) -> Result<()> {
        self.send_command(DisplayCommand::HideDisplay {})
            .await
            .map(|_| ())
    }
}
