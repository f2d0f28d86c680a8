//! Rotary dial loop
//!
//! Clockwise/counterclockwise steps move the volume by one inside
//! `[0, max_volume]`; pressing the dial toggles pause. A step taken
//! while max-volume calibration is armed marks the calibration as
//! changed so the confirm phase knows to latch the new ceiling.

use crate::context::AppContext;
use crate::playback;
use juke_core::{Color, RotaryEvent, RotaryEvents};
use juke_display::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub async fn rotary_loop(
    ctx: Arc<AppContext>,
    mut rotary: Box<dyn RotaryEvents>,
    mut shutdown: ShutdownToken,
) {
    info!("starting rotary loop");
    loop {
        let event = tokio::select! {
            event = rotary.next_event() => event,
            () = shutdown.signalled() => break,
        };
        match event {
            Ok(RotaryEvent::Clockwise) => volume_step(&ctx, 1).await,
            Ok(RotaryEvent::CounterClockwise) => volume_step(&ctx, -1).await,
            Ok(RotaryEvent::Press) => {
                let result = {
                    let mut player = ctx.player.lock().await;
                    playback::toggle_pause(player.as_mut()).await
                };
                if let Err(e) = result {
                    warn!(%e, "pause toggle failed");
                    ctx.flash_and_restore(Color::RED).await;
                }
            }
            Err(e) => {
                warn!(%e, "rotary source failed");
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
    debug!("rotary loop stopped");
}

async fn volume_step(ctx: &AppContext, direction: i8) {
    let (volume, max_volume) = {
        let config = ctx.config.lock().await;
        (config.volume, config.max_volume)
    };
    let target = if direction > 0 {
        volume.saturating_add(1).min(max_volume)
    } else {
        volume.saturating_sub(1)
    };
    if target == volume {
        return;
    }

    {
        let mut run = ctx.run.lock().await;
        if run.smv_armed {
            run.smv_changed = true;
        }
    }

    let result = {
        let mut player = ctx.player.lock().await;
        playback::set_volume(player.as_mut(), target).await
    };
    match result {
        Ok(()) => {
            debug!(volume = target, "volume changed");
            ctx.config.lock().await.volume = target;
        }
        Err(e) => {
            warn!(%e, "volume change failed");
            ctx.flash_and_restore(Color::RED).await;
        }
    }
}
