//! Tag payload grammar
//!
//! Tags carry either a selection payload `<kind>:<value>` with kind one of
//! `t` (title), `a` (album), `p` (playlist name), or a literal command
//! token from a fixed set. Anything else is rejected before any player
//! call is made.

use crate::error::{CoreError, Result};

/// Parsed content of a scanned tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPayload {
    /// `t:<title>` - look up and play by song title
    Track(String),
    /// `a:<album>` - look up and play by album title
    Album(String),
    /// `p:<name>` - load a stored playlist by name
    Playlist(String),
    /// Toggle play/pause (also starts playback from stop)
    TogglePause,
    /// Toggle whether a new selection clears the playlist first
    ToggleClearPlaylist,
    /// Toggle party mode (consume: songs leave the playlist once played)
    TogglePartyMode,
    /// `shutdown_in_<NN>` - schedule a power-off in 1-99 minutes;
    /// scanning again cancels the pending job
    ShutdownIn(u16),
    /// Arm/confirm the two-phase max-volume calibration
    SetMaxVolume,
}

impl TagPayload {
    /// Parse the free-text payload of a tag.
    ///
    /// The grammar is closed: unknown kinds, empty values, and malformed
    /// shutdown delays all return [`CoreError::UnknownTag`].
    pub fn parse(text: &str) -> Result<TagPayload> {
        let text = text.trim();

        match text {
            "toggle_pause" => return Ok(TagPayload::TogglePause),
            "toggle_clr_plist" => return Ok(TagPayload::ToggleClearPlaylist),
            "toggle_party_mode" => return Ok(TagPayload::TogglePartyMode),
            "set_max_volume" => return Ok(TagPayload::SetMaxVolume),
            _ => {}
        }

        if let Some(minutes) = text.strip_prefix("shutdown_in_") {
            let ok = (1..=2).contains(&minutes.len())
                && minutes.bytes().all(|b| b.is_ascii_digit());
            if ok {
                let minutes: u16 = minutes
                    .parse()
                    .map_err(|_| CoreError::UnknownTag(text.to_string()))?;
                if minutes >= 1 {
                    return Ok(TagPayload::ShutdownIn(minutes));
                }
            }
            return Err(CoreError::UnknownTag(text.to_string()));
        }

        if let Some((kind, value)) = text.split_once(':') {
            if value.is_empty() {
                return Err(CoreError::UnknownTag(text.to_string()));
            }
            return match kind {
                "t" => Ok(TagPayload::Track(value.to_string())),
                "a" => Ok(TagPayload::Album(value.to_string())),
                "p" => Ok(TagPayload::Playlist(value.to_string())),
                _ => Err(CoreError::UnknownTag(text.to_string())),
            };
        }

        Err(CoreError::UnknownTag(text.to_string()))
    }
}
