//! Juke Display
//!
//! Everything that touches the LED strip:
//! - the static roman-numeral playlist view
//! - transient sweep flashes and the startup/shutdown wipes
//! - the progress animation engine for long tracks
//! - the cancellation coordinator that owns the strip and enforces the
//!   single-animation invariant
//!
//! The strip is a single exclusively-owned resource. Ownership moves
//! between the coordinator and at most one animation task; every other
//! render first reclaims it through the coordinator.

mod coordinator;
mod progress;
mod roman;
#[cfg(test)]
mod testing;
mod views;

pub use coordinator::{AnimationCoordinator, ShutdownToken};
pub use progress::{AnimationOutcome, AnimationPlan};
pub use roman::roman_leds;
pub use views::{goodbye, hello, sweep_flash, PlaylistView};
