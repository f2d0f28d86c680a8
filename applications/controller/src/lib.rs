//! Juke controller daemon
//!
//! Wires the gesture classifier, the progress animation engine, and the
//! cancellation coordinator around a remote music player: tags select
//! what to play, buttons and the volume dial control playback, the LED
//! strip gives feedback.

pub mod bookmark;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod hw;
pub mod jobs;
pub mod loops;
pub mod mpd;
pub mod playback;

#[cfg(test)]
pub(crate) mod testing;
