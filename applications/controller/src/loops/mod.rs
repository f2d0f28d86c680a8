//! Long-running control loops
//!
//! Each input source gets its own task: one polling loop per button, one
//! for the rotary dial, one for the tag reader, and the idle loop that
//! follows the player and drives the LED display. Every loop holds a
//! [`ShutdownToken`](juke_display::ShutdownToken) and winds down on its
//! own once shutdown is broadcast.

pub mod buttons;
pub mod idle;
pub mod rotary;
pub mod tags;

pub use buttons::button_loop;
pub use idle::idle_loop;
pub use rotary::rotary_loop;
pub use tags::tag_loop;
