//! Scheduled power-off and process teardown
//!
//! A shutdown tag arms a timer task; scanning the same tag again while
//! the timer runs disarms it. When the timer fires the daemon goes
//! through the full power-off path: persist state, pause the player,
//! broadcast shutdown to every loop, run the goodbye wipe, and hand off
//! to the OS.

use crate::context::AppContext;
use crate::playback;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

/// Handle on an armed power-off timer
pub struct ScheduledShutdown {
    cancel: watch::Sender<bool>,
    pub minutes: u16,
}

/// Arm the power-off timer, or disarm a running one. Returns whether a
/// timer is armed afterwards.
pub async fn toggle_scheduled_shutdown(ctx: &Arc<AppContext>, minutes: u16) -> bool {
    let mut slot = ctx.shutdown_job.lock().await;
    if let Some(job) = slot.take() {
        let _ = job.cancel.send(true);
        info!(minutes = job.minutes, "scheduled power-off disarmed");
        return false;
    }

    let (cancel, mut cancelled) = watch::channel(false);
    let ctx = Arc::clone(ctx);
    let mut shutdown = ctx.coordinator.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            () = sleep(Duration::from_secs(u64::from(minutes) * 60)) => {
                info!(minutes, "scheduled power-off firing");
                power_off(&ctx).await;
            }
            _ = cancelled.changed() => {}
            () = shutdown.signalled() => {}
        }
    });
    *slot = Some(ScheduledShutdown { cancel, minutes });
    true
}

/// Persist state and stop every loop; leaves the strip dark.
///
/// Used both by the signal path and by [`power_off`].
pub async fn graceful_exit(ctx: &AppContext) {
    ctx.save_config().await;
    ctx.coordinator.broadcast_shutdown();
    if let Err(e) = ctx.coordinator.goodbye().await {
        warn!(%e, "goodbye wipe failed");
    }
}

/// Full power-off: remember a playing state for the next boot, pause,
/// tear the process down, then ask the OS to halt.
pub async fn power_off(ctx: &AppContext) {
    let state = {
        let mut player = ctx.player.lock().await;
        let state = playback::playback_state_for_restart(player.as_mut()).await;
        if matches!(&state, Ok(Some(_))) {
            if let Err(e) = player.pause().await {
                warn!(%e, "could not pause before power-off");
            }
        }
        state
    };
    match state {
        Ok(state) => ctx.config.lock().await.ps_state = state.unwrap_or_default(),
        Err(e) => warn!(%e, "could not capture playback state"),
    }

    graceful_exit(ctx).await;

    match tokio::process::Command::new("/usr/sbin/shutdown")
        .args(["--poweroff", "now"])
        .status()
        .await
    {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(%status, "shutdown command refused"),
        Err(e) => warn!(%e, "could not invoke shutdown"),
    }
}
