//! Collaborator traits
//!
//! The controller core never talks to hardware or the network directly;
//! it goes through these seams. The application supplies the concrete
//! backends (player protocol client, RFID reader, LED strip, buttons,
//! rotary encoder) and tests supply scripted fakes.

use crate::error::Result;
use crate::types::{ButtonSample, Color, PlayerStatus, RotaryEvent, TagScan, TrackInfo};
use async_trait::async_trait;
use std::time::Duration;

/// Remote player-control protocol client.
///
/// Every call is fallible: commands the player rejects surface as
/// [`CoreError::Command`](crate::CoreError::Command), transport failures
/// as [`CoreError::Connection`](crate::CoreError::Connection).
#[async_trait]
pub trait PlayerClient: Send + Sync {
    async fn connect(&mut self) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
    async fn ping(&mut self) -> Result<()>;

    async fn status(&mut self) -> Result<PlayerStatus>;

    /// Resume playback (current position)
    async fn play(&mut self) -> Result<()>;
    /// Start playback at a playlist position
    async fn play_pos(&mut self, pos: u32) -> Result<()>;
    async fn pause(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    /// Seek to an absolute offset within the song at `pos`
    async fn seek(&mut self, pos: u32, seconds: u64) -> Result<()>;
    /// Seek relative to the current position of the current song
    async fn seek_current(&mut self, delta_seconds: i64) -> Result<()>;
    async fn next(&mut self) -> Result<()>;
    async fn previous(&mut self) -> Result<()>;

    async fn clear(&mut self) -> Result<()>;
    async fn add(&mut self, uri: &str) -> Result<()>;
    async fn delete(&mut self, pos: u32) -> Result<()>;
    /// Party mode: remove songs from the playlist once played
    async fn consume(&mut self, on: bool) -> Result<()>;
    async fn set_volume(&mut self, volume: u8) -> Result<()>;

    /// Search the database by tag (`title`, `album`, ...), exact match
    async fn find(&mut self, tag: &str, needle: &str) -> Result<Vec<TrackInfo>>;
    /// Load a stored playlist by name onto the queue
    async fn load(&mut self, name: &str) -> Result<()>;
    /// Fetch playlist entries in `[start, end)`
    async fn playlist_range(&mut self, start: u32, end: u32) -> Result<Vec<TrackInfo>>;

    /// Block until one of the given subsystems ("player", "options", ...)
    /// changes; returns the names of the subsystems that did.
    async fn idle(&mut self, subsystems: &[&str]) -> Result<Vec<String>>;
}

/// Addressable LED strip.
///
/// No inter-frame persistence is assumed: a renderer sets every pixel it
/// cares about and calls [`LedStrip::show`] to latch the frame.
pub trait LedStrip: Send {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn set(&mut self, index: usize, color: Color);
    fn fill(&mut self, color: Color);
    /// Latch the current frame onto the hardware
    fn show(&mut self) -> Result<()>;
}

/// RFID/NFC tag reader
#[async_trait]
pub trait TagReader: Send {
    /// Block until a tag is present and return its id and text payload
    async fn read(&mut self) -> Result<TagScan>;
}

/// Raw button edge source, polled once per tick
pub trait ButtonProbe: Send {
    fn sample(&mut self) -> ButtonSample;
}

/// Rotary encoder event source
#[async_trait]
pub trait RotaryEvents: Send {
    /// Block until the dial moves or is pressed
    async fn next_event(&mut self) -> Result<RotaryEvent>;
}

/// Poll intervals and disambiguation windows, shared by the input loops.
///
/// These are configuration values rather than literals so tests can
/// shrink them for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Button/idle loop poll interval
    pub poll_interval: Duration,
    /// Window in which a second press upgrades a Single to a Double
    pub double_window: Duration,
    /// Window separating "hold alone" from "hold after a prior press"
    pub hold_reset: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            double_window: Duration::from_secs(1),
            hold_reset: Duration::from_secs(2),
        }
    }
}
