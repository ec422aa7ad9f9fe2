//! Lip-sync — the timed `Idle → Speaking → Idle` mouth sequence.
//!
//! [`SpeechSequence`] is a pure state machine that yields one action at a
//! time (send a command, or wait). The controller drives it against the link
//! and its clock, so the sequence itself never touches time or I/O.

use super::controller::AnimationController;
use crate::config::WaveformStyle;
use crate::display::DisplayCommand;
use crate::emotion::expression::PARAM_MOUTH_OPEN_Y;
use crate::error::Result;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mouth updates per second of speech.
pub const STEPS_PER_SECOND: u32 = 10;

/// Hand-tuned 8-sample mouth shapes; one is chosen per utterance.
pub const MOUTH_PATTERNS: [[f32; 8]; 3] = [
    [0.0, 0.5, 0.8, 0.5, 0.2, 0.6, 0.9, 0.4],
    [0.0, 0.3, 0.7, 0.9, 0.6, 0.3, 0.1, 0.5],
    [0.0, 0.6, 0.4, 0.8, 0.3, 0.7, 0.2, 0.5],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// Triangular open/close: 1.0, 0.5, 0.0, 0.5, ...
    Bounce,
    Pattern(&'static [f32; 8]),
}

impl Waveform {
    pub fn sample(&self, step: u32) -> f32 {
        match self {
            Waveform::Bounce => ((step % 4) as f32 - 2.0).abs() / 2.0,
            Waveform::Pattern(samples) => samples[step as usize % samples.len()],
        }
    }
}

/// Number of mouth frames for a duration. Partial steps are dropped.
pub fn step_count(seconds: f32) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * STEPS_PER_SECOND as f32) as u32
}

pub fn step_interval() -> Duration {
    Duration::from_millis(1000 / STEPS_PER_SECOND as u64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Nothing sent yet; next action silences auto-breath.
    Start,
    /// Mouth frame `step` is next; `waiting` when its pause is due.
    Active { step: u32, waiting: bool },
    CloseMouth,
    RestoreBreath,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechAction {
    Send(DisplayCommand),
    Wait(Duration),
    Done,
}

#[derive(Debug, Clone)]
pub struct SpeechSequence {
    phase: Phase,
    steps: u32,
    intensity: f32,
    waveform: Waveform,
}

impl SpeechSequence {
    pub fn new(seconds: f32, intensity: f32, waveform: Waveform) -> Self {
        Self {
            phase: Phase::Start,
            steps: step_count(seconds),
            intensity,
            waveform,
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Still in the entry or mouth-frame phase.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Start | Phase::Active { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Skip the remaining frames and go straight to the exit phase.
    pub fn abort(&mut self) {
        if self.is_active() {
            self.phase = Phase::CloseMouth;
        }
    }

    pub fn next_action(&mut self) -> SpeechAction {
        match self.phase {
            Phase::Start => {
                self.phase = Phase::Active {
                    step: 0,
                    waiting: false,
                };
                SpeechAction::Send(DisplayCommand::SetAutoBreath { enabled: false })
            }
            Phase::Active { step, .. } if step >= self.steps => {
                self.phase = Phase::RestoreBreath;
                SpeechAction::Send(DisplayCommand::set_parameter(PARAM_MOUTH_OPEN_Y, 0.0))
            }
            Phase::Active {
                step,
                waiting: false,
            } => {
                self.phase = Phase::Active {
                    step,
                    waiting: true,
                };
                let value = self.intensity * self.waveform.sample(step);
                SpeechAction::Send(DisplayCommand::set_parameter(PARAM_MOUTH_OPEN_Y, value))
            }
            Phase::Active {
                step,
                waiting: true,
            } => {
                self.phase = Phase::Active {
                    step: step + 1,
                    waiting: false,
                };
                SpeechAction::Wait(step_interval())
            }
            Phase::CloseMouth => {
                self.phase = Phase::RestoreBreath;
                SpeechAction::Send(DisplayCommand::set_parameter(PARAM_MOUTH_OPEN_Y, 0.0))
            }
            Phase::RestoreBreath => {
                self.phase = Phase::Finished;
                SpeechAction::Send(DisplayCommand::SetAutoBreath { enabled: true })
            }
            Phase::Finished => SpeechAction::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The model has no mouth parameter; nothing was sent.
    Unsupported,
    Completed { frames: u32 },
    /// A command failed mid-sequence; the exit phase still ran.
    Interrupted { frames: u32 },
}

impl AnimationController {
    /// Animate the mouth for `seconds` at `intensity` (0–1).
    ///
    /// Runs to completion. A second call made while one is running waits for
    /// it to finish rather than interleaving frames.
    pub async fn speak_for_duration(&self, seconds: f32, intensity: f32) -> Result<SpeechOutcome> {
        self.ensure_probed().await;
        if !self.supports_parameter(PARAM_MOUTH_OPEN_Y).await {
            return Ok(SpeechOutcome::Unsupported);
        }

        let _turn = self.state.speech_turn.lock().await;
        let waveform = self.pick_waveform().await;
        let mut sequence = SpeechSequence::new(seconds, intensity, waveform);

        let _foreground = self.begin_foreground();
        info!("[Animator] Speaking animation: {:.1}s", seconds);

        let mut frames = 0u32;
        let mut interrupted = false;
        loop {
            match sequence.next_action() {
                SpeechAction::Send(command) => {
                    // The closing zero leaves the active phase, so only real
                    // frames see `is_active()` here.
                    let is_frame = sequence.is_active()
                        && matches!(command, DisplayCommand::SetParameter(_));
                    match self.send_command(command).await {
                        Ok(_) => {
                            if is_frame {
                                frames += 1;
                            }
                        }
                        Err(e) if sequence.is_active() => {
                            warn!("[Animator] Speech interrupted: {}", e);
                            interrupted = true;
                            sequence.abort();
                        }
                        Err(e) => warn!("[Animator] Speech cleanup failed: {}", e),
                    }
                }
                SpeechAction::Wait(interval) => self.state.clock.sleep(interval).await,
                SpeechAction::Done => break,
            }
        }

        debug!("[Animator] Speech finished after {} frames", frames);
        Ok(if interrupted {
            SpeechOutcome::Interrupted { frames }
        } else {
            SpeechOutcome::Completed { frames }
        })
    }

    async fn pick_waveform(&self) -> Waveform {
        match self.state.config.speech.waveform {
            WaveformStyle::Bounce => Waveform::Bounce,
            WaveformStyle::Patterns => {
                let idx = self.state.rng.lock().await.gen_range(0..MOUTH_PATTERNS.len());
                Waveform::Pattern(&MOUTH_PATTERNS[idx])
            }
        }
    }
}
