//! RFID tag loop
//!
//! Blocks on the reader, parses the scanned payload, and acts on it:
//! selections go to the playlist, admin tags flip modes or arm the
//! scheduled power-off, and the two-phase max-volume calibration lives
//! here. A malformed payload gets a purple flash and nothing else.
//!
//! After every scan the loop settles for a second so a tag resting on
//! the reader does not fire repeatedly.

use crate::context::AppContext;
use crate::jobs;
use crate::playback::{self, AddOutcome};
use juke_core::{Color, PlaybackState, TagPayload, TagReader};
use juke_display::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub async fn tag_loop(
    ctx: Arc<AppContext>,
    mut reader: Box<dyn TagReader>,
    mut shutdown: ShutdownToken,
) {
    info!("starting tag loop");
    loop {
        let scan = tokio::select! {
            scan = reader.read() => scan,
            () = shutdown.signalled() => break,
        };
        match scan {
            Ok(scan) => {
                debug!(id = scan.id, text = %scan.text, "tag scanned");
                handle_scan(&ctx, &scan.text).await;
            }
            Err(e) => warn!(%e, "tag read failed"),
        }

        // settle window
        tokio::select! {
            () = sleep(Duration::from_secs(1)) => {}
            () = shutdown.signalled() => break,
        }
    }
    debug!("tag loop stopped");
}

async fn handle_scan(ctx: &Arc<AppContext>, text: &str) {
    let payload = match TagPayload::parse(text) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(%e, "unreadable tag");
            ctx.flash_and_restore(Color::PURPLE).await;
            return;
        }
    };

    let armed = ctx.run.lock().await.smv_armed;
    match payload {
        TagPayload::SetMaxVolume => set_max_volume(ctx).await,

        // selections stay live during calibration so the ceiling can be
        // probed against real music
        TagPayload::Track(_) | TagPayload::Album(_) | TagPayload::Playlist(_) => {
            select(ctx, &payload).await;
        }

        TagPayload::TogglePause => {
            let result = {
                let mut player = ctx.player.lock().await;
                playback::toggle_pause(player.as_mut()).await
            };
            if let Err(e) = result {
                warn!(%e, "pause toggle failed");
                ctx.flash_and_restore(Color::RED).await;
            }
        }

        // mode toggles are ignored while calibration is armed
        TagPayload::ToggleClearPlaylist if !armed => {
            let clr_plist = {
                let mut config = ctx.config.lock().await;
                config.clr_plist = !config.clr_plist;
                config.clr_plist
            };
            info!(clr_plist, "clear-playlist mode toggled");
            ctx.flash_ok().await;
        }

        TagPayload::TogglePartyMode if !armed => {
            let party_mode = {
                let mut config = ctx.config.lock().await;
                config.party_mode = !config.party_mode;
                config.party_mode
            };
            info!(party_mode, "party mode toggled");
            // flash before consume: the mode change itself wakes the
            // idle loop and repaints the playlist view
            ctx.flash_ok().await;
            let result = {
                let mut player = ctx.player.lock().await;
                playback::set_party(player.as_mut(), party_mode).await
            };
            if let Err(e) = result {
                warn!(%e, "party mode change failed");
                ctx.flash_and_restore(Color::RED).await;
            }
        }

        TagPayload::ShutdownIn(minutes) if !armed => {
            let scheduled = jobs::toggle_scheduled_shutdown(ctx, minutes).await;
            info!(minutes, scheduled, "scheduled power-off toggled");
            ctx.flash_ok().await;
        }

        _ => debug!("tag ignored while calibration armed"),
    }
}

async fn select(ctx: &AppContext, payload: &TagPayload) {
    let clr_plist = ctx.config.lock().await.clr_plist;
    let result = {
        let mut player = ctx.player.lock().await;
        playback::add_and_play(player.as_mut(), payload, clr_plist).await
    };
    match result {
        Ok(AddOutcome::Started) => ctx.request_refresh(),
        Ok(AddOutcome::Queued) => {
            ctx.flash_ok().await;
            ctx.request_refresh();
        }
        Err(e) => {
            warn!(%e, "selection failed");
            ctx.flash_and_restore(Color::RED).await;
        }
    }
}

/// Two-phase max-volume calibration.
///
/// First scan arms it: the ceiling is lifted to 100 and, if nothing is
/// playing, playback starts so the dial can be judged by ear. The second
/// scan latches the current volume as the new ceiling (only if the dial
/// actually moved) and puts the player back into its pre-calibration
/// state.
async fn set_max_volume(ctx: &AppContext) {
    let armed = ctx.run.lock().await.smv_armed;
    if armed {
        confirm_max_volume(ctx).await;
    } else {
        arm_max_volume(ctx).await;
    }
}

async fn arm_max_volume(ctx: &AppContext) {
    let status = {
        let mut player = ctx.player.lock().await;
        player.status().await
    };
    let status = match status {
        Ok(status) => status,
        Err(e) => {
            warn!(%e, "calibration needs the player");
            ctx.flash_and_restore(Color::RED).await;
            return;
        }
    };
    // nothing to play at means nothing to calibrate against
    if status.playlist_length == 0 {
        warn!("calibration refused: playlist is empty");
        ctx.flash_and_restore(Color::RED).await;
        return;
    }

    let pre_state = (status.state != PlaybackState::Play).then_some(status.state);
    if pre_state.is_some() {
        let result = {
            let mut player = ctx.player.lock().await;
            player.play().await
        };
        if let Err(e) = result {
            warn!(%e, "calibration could not start playback");
            ctx.flash_and_restore(Color::RED).await;
            return;
        }
    }

    ctx.config.lock().await.max_volume = 100;
    {
        let mut run = ctx.run.lock().await;
        run.smv_armed = true;
        run.smv_changed = false;
        run.smv_pre_state = pre_state;
    }
    info!("max-volume calibration armed");
    ctx.flash_ok().await;
}

async fn confirm_max_volume(ctx: &AppContext) {
    let (pre_state, changed) = {
        let mut run = ctx.run.lock().await;
        run.smv_armed = false;
        (run.smv_pre_state.take(), run.smv_changed)
    };

    if changed {
        let mut config = ctx.config.lock().await;
        config.max_volume = config.volume;
        info!(max_volume = config.max_volume, "max volume latched");
    } else {
        info!("calibration confirmed without a dial move; ceiling unchanged");
    }

    let result = {
        let mut player = ctx.player.lock().await;
        match pre_state {
            Some(PlaybackState::Pause) => player.pause().await,
            Some(PlaybackState::Stop) => player.stop().await,
            _ => Ok(()),
        }
    };
    if let Err(e) = result {
        warn!(%e, "could not restore pre-calibration state");
    }
    ctx.flash_ok().await;
    ctx.request_refresh();
}
