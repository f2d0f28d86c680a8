//! Shared application state
//!
//! One [`AppContext`] behind an `Arc` is all the loops ever see. Lock
//! discipline: never hold two of the player/config/run mutexes at the
//! same time.

use crate::bookmark::BookmarkStore;
use crate::config::ControllerConfig;
use crate::jobs::ScheduledShutdown;
use juke_core::{Color, PlaybackState, PlayerClient, Timing};
use juke_display::{AnimationCoordinator, PlaylistView};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::warn;

/// Transient mode flags that never hit the config file
#[derive(Debug, Default)]
pub struct RunFlags {
    /// Max-volume calibration armed by the first calibration tag
    pub smv_armed: bool,
    /// Playback state to restore when calibration finishes
    pub smv_pre_state: Option<PlaybackState>,
    /// The dial moved while calibration was armed
    pub smv_changed: bool,
}

pub struct AppContext {
    pub player: Mutex<Box<dyn PlayerClient>>,
    pub coordinator: AnimationCoordinator,
    pub view: Mutex<PlaylistView>,
    pub config: Mutex<ControllerConfig>,
    pub run: Mutex<RunFlags>,
    pub bookmarks: BookmarkStore,
    /// Nudges the idle loop into an immediate status refresh
    pub refresh: Notify,
    /// Pending scheduled power-off, if a shutdown tag armed one
    pub shutdown_job: Mutex<Option<ScheduledShutdown>>,
    pub config_path: PathBuf,
    // snapshots taken at startup so the loops never need the config lock
    pub timing: Timing,
    pub long_track: Duration,
    pub segments: usize,
    pub seek_step: i64,
}

impl AppContext {
    pub fn new(
        config: ControllerConfig,
        config_path: PathBuf,
        player: Box<dyn PlayerClient>,
        strip: Box<dyn juke_core::LedStrip>,
    ) -> Self {
        let timing = config.timing();
        let long_track = config.long_track();
        let segments = config.display.leds;
        let seek_step = config.input.seek_step_secs as i64;
        let bookmarks = BookmarkStore::new(config.display.bookmark_path.clone());
        Self {
            player: Mutex::new(player),
            coordinator: AnimationCoordinator::new(strip),
            view: Mutex::new(PlaylistView::new()),
            config: Mutex::new(config),
            run: Mutex::new(RunFlags::default()),
            bookmarks,
            refresh: Notify::new(),
            shutdown_job: Mutex::new(None),
            config_path,
            timing,
            long_track,
            segments,
            seek_step,
        }
    }

    /// Ask the idle loop for a fresh status render.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Feedback flash, then put the cached playlist view back.
    pub async fn flash_and_restore(&self, color: Color) {
        if let Err(e) = self.coordinator.flash(color).await {
            warn!(%e, "feedback flash failed");
            return;
        }
        let view = self.view.lock().await;
        if let Err(e) = self.coordinator.render(|strip| view.restore(strip)).await {
            warn!(%e, "view restore failed");
        }
    }

    /// Green confirmation sweep.
    pub async fn flash_ok(&self) {
        self.flash_and_restore(Color::GREEN).await;
    }

    /// Write the current configuration back to disk.
    pub async fn save_config(&self) {
        let config = self.config.lock().await;
        if let Err(e) = config.save(&self.config_path) {
            warn!(%e, path = %self.config_path.display(), "could not write config");
        }
    }
}
