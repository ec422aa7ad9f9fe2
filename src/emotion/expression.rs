//! Static expression tables — which Live2D parameters an emotion moves and
//! which motion groups a reaction prefers.
//!
//! The controller filters these against the probed capabilities before
//! anything goes out, so entries for parameters a model lacks are harmless.

use super::Emotion;

pub const PARAM_MOUTH_FORM: &str = "ParamMouthForm";
pub const PARAM_MOUTH_OPEN_Y: &str = "ParamMouthOpenY";
pub const PARAM_EYE_L_OPEN: &str = "ParamEyeLOpen";
pub const PARAM_EYE_R_OPEN: &str = "ParamEyeROpen";
pub const PARAM_EYE_BALL_X: &str = "ParamEyeBallX";
pub const PARAM_EYE_BALL_Y: &str = "ParamEyeBallY";
pub const PARAM_ANGLE_X: &str = "ParamAngleX";
pub const PARAM_ANGLE_Y: &str = "ParamAngleY";
pub const PARAM_BROW_L_Y: &str = "ParamBrowLY";
pub const PARAM_BROW_R_Y: &str = "ParamBrowRY";

/// Head turn per unit of horizontal gaze, in degrees.
pub const HEAD_YAW_PER_GAZE: f32 = 15.0;
/// Head tilt per unit of vertical gaze, in degrees.
pub const HEAD_PITCH_PER_GAZE: f32 = 10.0;

/// Parameter targets for an emotion, in send order.
pub fn emotion_parameters(emotion: Emotion) -> &'static [(&'static str, f32)] {
    match emotion {
        Emotion::Happy => &[
            (PARAM_MOUTH_FORM, 1.0),
            (PARAM_EYE_L_OPEN, 0.9),
            (PARAM_EYE_R_OPEN, 0.9),
        ],
        Emotion::Sad => &[
            (PARAM_MOUTH_FORM, -1.0),
            (PARAM_EYE_L_OPEN, 0.6),
            (PARAM_EYE_R_OPEN, 0.6),
            (PARAM_ANGLE_Y, -5.0),
        ],
        Emotion::Surprised => &[
            (PARAM_MOUTH_OPEN_Y, 0.8),
            (PARAM_EYE_L_OPEN, 1.0),
            (PARAM_EYE_R_OPEN, 1.0),
        ],
        Emotion::Angry => &[
            (PARAM_MOUTH_FORM, -0.5),
            (PARAM_EYE_L_OPEN, 0.7),
            (PARAM_EYE_R_OPEN, 0.7),
        ],
        Emotion::Confused => &[(PARAM_MOUTH_FORM, 0.2), (PARAM_ANGLE_X, 10.0)],
        Emotion::Neutral => &[
            (PARAM_MOUTH_FORM, 0.0),
            (PARAM_EYE_L_OPEN, 1.0),
            (PARAM_EYE_R_OPEN, 1.0),
        ],
        Emotion::Worried => &[
            (PARAM_MOUTH_FORM, -0.3),
            (PARAM_BROW_L_Y, 0.3),
            (PARAM_BROW_R_Y, 0.3),
        ],
        Emotion::Excited => &[
            (PARAM_MOUTH_FORM, 1.0),
            (PARAM_MOUTH_OPEN_Y, 0.3),
            (PARAM_EYE_L_OPEN, 1.0),
            (PARAM_EYE_R_OPEN, 1.0),
        ],
    }
}

/// Motion groups to try for a reaction, most preferred first.
pub fn reaction_groups(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &["motion", "greeting"],
        Emotion::Excited => &["greeting", "motion"],
        Emotion::Surprised => &["motion"],
        _ => &["idle", "motion"],
    }
}

/// Gaze targets: eyes follow `(x, y)` directly, the head turns a fraction.
pub fn gaze_parameters(x: f32, y: f32) -> [(&'static str, f32); 4] {
    [
        (PARAM_EYE_BALL_X, x),
        (PARAM_EYE_BALL_Y, y),
        (PARAM_ANGLE_X, x * HEAD_YAW_PER_GAZE),
        (PARAM_ANGLE_Y, y * HEAD_PITCH_PER_GAZE),
    ]
}
