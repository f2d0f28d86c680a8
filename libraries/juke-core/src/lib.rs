//! Juke Core
//!
//! Core types, traits, and error handling for the Juke jukebox controller.
//!
//! This crate defines:
//! - **Domain Types**: [`Color`], [`PlayerStatus`], [`TrackInfo`], [`Bookmark`]
//! - **Collaborator Traits**: [`PlayerClient`], [`LedStrip`], [`TagReader`],
//!   [`ButtonProbe`], [`RotaryEvents`]
//! - **Tag Parsing**: the closed [`TagPayload`] grammar scanned off RFID tags
//! - **Error Handling**: unified [`CoreError`] and [`Result`] types
//!
//! Hardware backends and the player protocol implementation live at the
//! application edge; everything here is platform-agnostic.

pub mod error;
pub mod tag;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use tag::TagPayload;
pub use traits::{ButtonProbe, LedStrip, PlayerClient, RotaryEvents, TagReader, Timing};
pub use types::{
    Bookmark, ButtonSample, Color, PlaybackState, PlayerStatus, RotaryEvent, TagScan, TrackInfo,
};
