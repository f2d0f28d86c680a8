//! Domain types shared across the controller

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single LED color in the strip's native channel order (GRB hardware,
/// but callers never need to care - the driver owns the channel order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const RED: Color = Color(255, 0, 0);
    pub const YELLOW: Color = Color(255, 150, 0);
    pub const GREEN: Color = Color(0, 255, 0);
    pub const CYAN: Color = Color(0, 255, 255);
    pub const BLUE: Color = Color(0, 0, 255);
    pub const PURPLE: Color = Color(180, 0, 255);
    pub const OFF: Color = Color(0, 0, 0);
}

/// Player state as reported by the remote player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Play,
    Pause,
    Stop,
}

impl PlaybackState {
    /// Parse the state string the player protocol uses ("play"/"pause"/"stop")
    pub fn parse(s: &str) -> Option<PlaybackState> {
        match s {
            "play" => Some(PlaybackState::Play),
            "pause" => Some(PlaybackState::Pause),
            "stop" => Some(PlaybackState::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Play => "play",
            PlaybackState::Pause => "pause",
            PlaybackState::Stop => "stop",
        }
    }
}

/// Decoded player `status` response
///
/// `duration`/`elapsed` are only present while a song is loaded; `song` and
/// `next_song` are playlist positions, absent on an empty playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub volume: Option<u8>,
    pub song: Option<u32>,
    pub next_song: Option<u32>,
    pub playlist_length: u32,
    pub duration: Option<Duration>,
    pub elapsed: Option<Duration>,
}

impl PlayerStatus {
    /// Songs still ahead in the playlist, including the current one.
    /// This is what the static playlist view displays.
    pub fn yet_to_play(&self) -> u32 {
        match self.song {
            Some(pos) => self.playlist_length.saturating_sub(pos),
            None => self.playlist_length,
        }
    }
}

/// One playlist entry, as returned by `playlist_range`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// URI of the file within the player's database
    pub file: String,
    pub title: Option<String>,
    pub album: Option<String>,
    /// Position within the playlist
    pub position: u32,
}

/// Persisted resume point for one specific track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub album: Option<String>,
    pub elapsed_seconds: u64,
}

/// One successful read from the tag reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagScan {
    pub id: u64,
    pub text: String,
}

/// Raw button level delivered by the edge source on every poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSample {
    Released,
    Pressed,
    /// Pressed continuously for longer than the driver's hold time
    Held,
}

/// One movement or press of the volume dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotaryEvent {
    Clockwise,
    CounterClockwise,
    Press,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_state_round_trips_protocol_strings() {
        for s in ["play", "pause", "stop"] {
            assert_eq!(PlaybackState::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(PlaybackState::parse("playing"), None);
    }

    #[test]
    fn yet_to_play_counts_current_song() {
        let status = PlayerStatus {
            state: PlaybackState::Play,
            volume: Some(20),
            song: Some(3),
            next_song: Some(4),
            playlist_length: 10,
            duration: None,
            elapsed: None,
        };
        assert_eq!(status.yet_to_play(), 7);
    }

    #[test]
    fn yet_to_play_without_current_song_is_whole_playlist() {
        let status = PlayerStatus {
            state: PlaybackState::Stop,
            volume: None,
            song: None,
            next_song: None,
            playlist_length: 5,
            duration: None,
            elapsed: None,
        };
        assert_eq!(status.yet_to_play(), 5);
    }
}
