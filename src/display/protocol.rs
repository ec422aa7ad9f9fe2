//! Hime Display wire protocol — typed commands and acknowledgments.
//!
//! Requests are JSON objects of the form `{"action": "...", "data": {...}}`.
//! Responses are parsed into [`CommandResponse`] here so nothing above the
//! link ever looks at raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parameter assignment inside `setParameter` / `setParameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    pub parameter_id: String,
    pub value: f32,
}

impl ParameterValue {
    pub fn new(parameter_id: impl Into<String>, value: f32) -> Self {
        Self {
            parameter_id: parameter_id.into(),
            value,
        }
    }
}

/// Commands understood by the display process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum DisplayCommand {
    SetParameter(ParameterValue),
    SetParameters {
        parameters: Vec<ParameterValue>,
    },
    PlayMotion {
        group: String,
        index: u32,
    },
    PlayRandomMotion {
        group: String,
    },
    SetAutoBreath {
        enabled: bool,
    },
    SetAutoEyeBlink {
        enabled: bool,
    },
    SetTrackMouse {
        enabled: bool,
    },
    ShowDisplay {},
    HideDisplay {},
}

impl DisplayCommand {
    /// Wire name of the action, used for logging and error messages.
    pub fn action(&self) -> &'static str {
        match self {
            DisplayCommand::SetParameter(_) => "setParameter",
            DisplayCommand::SetParameters { .. } => "setParameters",
            DisplayCommand::PlayMotion { .. } => "playMotion",
            DisplayCommand::PlayRandomMotion { .. } => "playRandomMotion",
            DisplayCommand::SetAutoBreath { .. } => "setAutoBreath",
            DisplayCommand::SetAutoEyeBlink { .. } => "setAutoEyeBlink",
            DisplayCommand::SetTrackMouse { .. } => "setTrackMouse",
            DisplayCommand::ShowDisplay {} => "showDisplay",
            DisplayCommand::HideDisplay {} => "hideDisplay",
        }
    }

    pub fn set_parameter(parameter_id: impl Into<String>, value: f32) -> Self {
        DisplayCommand::SetParameter(ParameterValue::new(parameter_id, value))
    }

    pub fn set_parameters(parameters: Vec<ParameterValue>) -> Self {
        DisplayCommand::SetParameters { parameters }
    }

    pub fn play_random_motion(group: impl Into<String>) -> Self {
        DisplayCommand::PlayRandomMotion {
            group: group.into(),
        }
    }
}

/// Acknowledgment returned by the display for one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResponse {
    /// `Some(true)` / `Some(false)` when the display reported a status,
    /// `None` for bare acks that carry no success field.
    pub success: Option<bool>,
    /// Error detail, when the display supplied one.
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
        }
    }

    /// An acknowledgment without a status field (`{"type": "ack"}`).
    pub fn bare_ack() -> Self {
        Self::default()
    }

    /// Parse a raw response object.
    pub fn from_value(value: &Value) -> Self {
        let success = value.get("success").and_then(Value::as_bool);
        let error = value
            .get("error")
            .or_else(|| value.get("message").filter(|_| success == Some(false)))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { success, error }
    }

    /// True only when the display explicitly confirmed the command.
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    /// True when the display explicitly refused the command.
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }
}
