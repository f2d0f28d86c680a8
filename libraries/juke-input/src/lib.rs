//! Juke Input
//!
//! Converts raw button levels into classified gestures.
//!
//! One [`GestureClassifier`] exists per physical button. A polling loop
//! feeds it one [`ButtonSample`] per tick together with the current time;
//! the classifier disambiguates rapid presses into Single/Double/Hold
//! within configurable timing windows and has no side effects beyond its
//! own state and the gesture it returns.

mod gesture;

pub use gesture::{ButtonId, Gesture, GestureClassifier, GestureKind};
pub use juke_core::Timing;
pub use juke_core::types::ButtonSample;
