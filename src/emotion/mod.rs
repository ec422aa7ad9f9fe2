pub mod classifier;
pub mod expression;

pub use classifier::{detect, should_emphasize};
pub use expression::{emotion_parameters, reaction_groups};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete emotion tags the character can display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Surprised,
    Angry,
    Confused,
    #[default]
    Neutral,
    Worried,
    Excited,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Angry,
        Emotion::Confused,
        Emotion::Neutral,
        Emotion::Worried,
        Emotion::Excited,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Angry => "angry",
            Emotion::Confused => "confused",
            Emotion::Neutral => "neutral",
            Emotion::Worried => "worried",
            Emotion::Excited => "excited",
        }
    }

    /// Parse a tag, mapping anything unrecognized to `Neutral`.
    pub fn from_tag_lossy(tag: &str) -> Self {
        tag.parse().unwrap_or(Emotion::Neutral)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEmotion(pub String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emotion tag: {}", self.0)
    }
}

impl std::error::Error for UnknownEmotion {}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == tag)
            .ok_or(UnknownEmotion(s.to_string()))
    }
}
