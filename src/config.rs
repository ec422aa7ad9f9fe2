//! Animator configuration and the JSON load/save helpers behind it.
//!
//! Every field has a default, so a missing or partial config file still
//! yields a working setup. `HIME_DISPLAY_WS` overrides the display URL.

use crate::error::AnimatorError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DISPLAY_URL_ENV: &str = "HIME_DISPLAY_WS";
pub const CONFIG_PATH_ENV: &str = "HIME_ANIMATOR_CONFIG";

/// Upper bound for any configured wait, in seconds (one day).
pub const MAX_WAIT_SECS: f32 = 86_400.0;
/// Upper bound for a single lip-sync run, in seconds.
pub const MAX_SPEECH_SECS: f32 = 600.0;

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), AnimatorError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AnimatorError::Config(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )))
    }
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                warn!(
                    "[{}] Failed to parse config {}: {} — using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            info!(
                "[{}] No config file at {} — using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(
    path: &Path,
    config: &T,
    label: &str,
) -> Result<(), AnimatorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AnimatorError::Config(format!("Failed to create config directory: {}", e)))?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| AnimatorError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, json)
        .map_err(|e| AnimatorError::Config(format!("Failed to write config file: {}", e)))?;
    info!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

/// Resolve a setting: a non-empty environment variable wins over the
/// configured value.
pub fn resolve_env_override(configured: &str, env_var: &str) -> String {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => configured.to_string(),
    }
}

/// Default config location: `<data dir>/hime-animator/animator_config.json`,
/// unless `HIME_ANIMATOR_CONFIG` points elsewhere.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hime-animator")
        .join("animator_config.json")
}

// ── Display ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// WebSocket endpoint of the Hime Display API server.
    pub ws_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8765".to_string(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 5000,
        }
    }
}

// ── Probe ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Pause between parameter probes, so the display is not flooded.
    pub parameter_delay_ms: u64,
    /// Pause between animation-group probes.
    pub group_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            parameter_delay_ms: 50,
            group_delay_ms: 100,
        }
    }
}

// ── Idle ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub enabled: bool,
    pub min_interval_secs: f32,
    pub max_interval_secs: f32,
    /// No idle motion within this many seconds of the last group playback.
    pub motion_cooldown_secs: f32,
    /// Pause after a failed iteration before the loop resumes.
    pub recovery_secs: f32,
    /// Random gaze targets are drawn from `[-gaze_range_x, gaze_range_x]`.
    pub gaze_range_x: f32,
    pub gaze_range_y: f32,
    /// Fixed RNG seed for reproducible idle sequences.
    pub seed: Option<u64>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_secs: 3.0,
            max_interval_secs: 10.0,
            motion_cooldown_secs: 15.0,
            recovery_secs: 5.0,
            gaze_range_x: 0.3,
            gaze_range_y: 0.2,
            seed: None,
        }
    }
}

// ── Speech ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformStyle {
    /// Triangular open/close bounce.
    Bounce,
    /// One of the fixed 8-sample patterns, picked per utterance.
    Patterns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub seconds_per_word: f32,
    pub max_seconds: f32,
    /// Replies shorter than this do not animate the mouth.
    pub min_seconds: f32,
    pub intensity: f32,
    pub waveform: WaveformStyle,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            seconds_per_word: 0.15,
            max_seconds: 8.0,
            min_seconds: 0.3,
            intensity: 0.7,
            waveform: WaveformStyle::Patterns,
        }
    }
}

// ── Top-Level ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub display: DisplayConfig,
    pub probe: ProbeConfig,
    pub idle: IdleConfig,
    pub speech: SpeechConfig,
}

impl AnimatorConfig {
    /// Apply environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.display.ws_url = resolve_env_override(&self.display.ws_url, DISPLAY_URL_ENV);
        self
    }

    pub fn validate(&self) -> Result<(), AnimatorError> {
        let url = &self.display.ws_url;
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(AnimatorError::Config(format!(
                "display.ws_url must be a ws:// or wss:// URL, got '{}'",
                url
            )));
        }
        let idle = &self.idle;
        check_range("idle.min_interval_secs", idle.min_interval_secs, 0.0, MAX_WAIT_SECS)?;
        check_range("idle.max_interval_secs", idle.max_interval_secs, 0.0, MAX_WAIT_SECS)?;
        if idle.max_interval_secs < idle.min_interval_secs {
            return Err(AnimatorError::Config(format!(
                "idle interval bounds are invalid: [{}, {}]",
                idle.min_interval_secs, idle.max_interval_secs
            )));
        }
        check_range("idle.motion_cooldown_secs", idle.motion_cooldown_secs, 0.0, MAX_WAIT_SECS)?;
        check_range("idle.recovery_secs", idle.recovery_secs, 0.0, MAX_WAIT_SECS)?;
        check_range("idle.gaze_range_x", idle.gaze_range_x, 0.0, 1.0)?;
        check_range("idle.gaze_range_y", idle.gaze_range_y, 0.0, 1.0)?;

        let speech = &self.speech;
        check_range("speech.max_seconds", speech.max_seconds, 0.0, MAX_SPEECH_SECS)?;
        check_range("speech.min_seconds", speech.min_seconds, 0.0, MAX_SPEECH_SECS)?;
        check_range("speech.intensity", speech.intensity, 0.0, 1.0)?;
        if !(speech.seconds_per_word.is_finite() && speech.seconds_per_word > 0.0)
            || speech.max_seconds <= 0.0
        {
            return Err(AnimatorError::Config(
                "speech timing values must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load animator config from a JSON file. Falls back to defaults if the file
/// is missing or invalid.
pub fn load_config(path: &Path) -> AnimatorConfig {
    load_json_config::<AnimatorConfig>(path, "Config").with_env_overrides()
}

/// Save animator config to a JSON file.
pub fn save_config(path: &Path, config: &AnimatorConfig) -> Result<(), AnimatorError> {
    save_json_config(path, config, "Config")
}
