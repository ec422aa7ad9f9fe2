pub mod controller;
pub mod idle;
pub mod speech;

pub use controller::{AnimationController, ForegroundGuard};
pub use idle::IdleBehavior;
pub use speech::{SpeechOutcome, SpeechSequence, Waveform};
