//! Controller configuration
//!
//! One flat TOML file carries both the persisted player state (clear
//! playlist flag, party mode, volume limits, pre-shutdown state) and the
//! tunables the loops read at spawn. Read once at startup, written back
//! at shutdown and after calibration.

use juke_core::{CoreError, Result, Timing};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config location; overridable through `JUKE_CONFIG`
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Clear the playlist before a new selection is added (append otherwise)
    #[serde(default = "default_true")]
    pub clr_plist: bool,

    /// Party mode: songs leave the playlist once played
    #[serde(default)]
    pub party_mode: bool,

    /// Current volume, 0-100
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// Upper volume bound enforced by the dial
    #[serde(default = "default_max_volume")]
    pub max_volume: u8,

    /// Playback state to restore after a power cycle ("play" or empty)
    #[serde(default)]
    pub ps_state: String,

    #[serde(default = "default_player")]
    pub player: PlayerSettings,

    #[serde(default = "default_display")]
    pub display: DisplaySettings,

    #[serde(default = "default_input")]
    pub input: InputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerSettings {
    /// Address of the player-control daemon
    #[serde(default = "default_addr")]
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    /// Number of LEDs on the strip
    #[serde(default = "default_leds")]
    pub leds: usize,

    /// Songs longer than this get the progress animation instead of the
    /// playlist view
    #[serde(default = "default_long_track")]
    pub long_track_secs: u64,

    /// Path of the persisted bookmark record
    #[serde(default = "default_bookmark_path")]
    pub bookmark_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputSettings {
    /// Button/idle loop poll interval
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,

    /// Window in which a second press upgrades Single to Double
    #[serde(default = "default_double_ms")]
    pub double_window_ms: u64,

    /// Window separating hold-alone from hold-after-press
    #[serde(default = "default_hold_reset_ms")]
    pub hold_reset_ms: u64,

    /// Seconds a double press seeks forward/backward
    #[serde(default = "default_seek_step")]
    pub seek_step_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_volume() -> u8 {
    20
}
fn default_max_volume() -> u8 {
    100
}
fn default_addr() -> String {
    "127.0.0.1:6600".to_string()
}
fn default_leds() -> usize {
    8
}
fn default_long_track() -> u64 {
    600
}
fn default_bookmark_path() -> PathBuf {
    PathBuf::from("bookmark.json")
}
fn default_poll_ms() -> u64 {
    100
}
fn default_double_ms() -> u64 {
    1000
}
fn default_hold_reset_ms() -> u64 {
    2000
}
fn default_seek_step() -> u64 {
    30
}

fn default_player() -> PlayerSettings {
    PlayerSettings {
        addr: default_addr(),
    }
}
fn default_display() -> DisplaySettings {
    DisplaySettings {
        leds: default_leds(),
        long_track_secs: default_long_track(),
        bookmark_path: default_bookmark_path(),
    }
}
fn default_input() -> InputSettings {
    InputSettings {
        poll_interval_ms: default_poll_ms(),
        double_window_ms: default_double_ms(),
        hold_reset_ms: default_hold_reset_ms(),
        seek_step_secs: default_seek_step(),
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            clr_plist: true,
            party_mode: false,
            volume: default_volume(),
            max_volume: default_max_volume(),
            ps_state: String::new(),
            player: default_player(),
            display: default_display(),
            input: default_input(),
        }
    }
}

impl ControllerConfig {
    /// Resolve the config path from the environment or the default.
    pub fn path() -> PathBuf {
        std::env::var("JUKE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Read the configuration; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                toml::from_str(&raw).map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the full configuration back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Gesture windows and poll interval for the input loops.
    pub fn timing(&self) -> Timing {
        Timing {
            poll_interval: Duration::from_millis(self.input.poll_interval_ms),
            double_window: Duration::from_millis(self.input.double_window_ms),
            hold_reset: Duration::from_millis(self.input.hold_reset_ms),
        }
    }

    pub fn long_track(&self) -> Duration {
        Duration::from_secs(self.display.long_track_secs)
    }
}
