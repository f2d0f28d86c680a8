//! Player idle loop
//!
//! Follows the player over a dedicated connection and keeps the LED
//! display in sync: the roman-numeral playlist view normally, the
//! progress animation while a long track is playing.
//!
//! The loop blocks in `idle` until the player reports a change, or until
//! another loop nudges it through the refresh notifier. A nudge drops
//! the in-flight `idle` future mid-response, which desyncs the
//! line-oriented stream, so the connection is closed and reopened before
//! the next status fetch.

use crate::context::AppContext;
use juke_core::{PlaybackState, PlayerClient, PlayerStatus, Result};
use juke_display::{AnimationPlan, ShutdownToken};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub async fn idle_loop(
    ctx: Arc<AppContext>,
    mut client: Box<dyn PlayerClient>,
    mut shutdown: ShutdownToken,
) {
    info!("starting idle loop");

    // initial render before the first player event
    refresh_display(&ctx, client.as_mut()).await;

    loop {
        let woke = tokio::select! {
            result = client.idle(&["player", "options", "playlist"]) => Some(result),
            () = ctx.refresh.notified() => None,
            () = shutdown.signalled() => break,
        };

        match woke {
            Some(Ok(changed)) => debug!(?changed, "player event"),
            Some(Err(e)) => {
                warn!(%e, "idle failed");
                let _ = client.close().await;
                if let Err(e) = client.connect().await {
                    warn!(%e, "reconnect failed; retrying");
                    tokio::select! {
                        () = sleep(Duration::from_secs(1)) => continue,
                        () = shutdown.signalled() => break,
                    }
                }
            }
            // nudged: the dropped idle future left the stream desynced
            None => {
                let _ = client.close().await;
            }
        }

        refresh_display(&ctx, client.as_mut()).await;
    }
    debug!("idle loop stopped");
}

async fn refresh_display(ctx: &AppContext, client: &mut dyn PlayerClient) {
    match fetch_status(client).await {
        Ok(status) => render_status(ctx, &status).await,
        Err(e) => warn!(%e, "status refresh failed"),
    }
}

/// Fetch status with one reconnect-and-retry on connection trouble.
async fn fetch_status(client: &mut dyn PlayerClient) -> Result<PlayerStatus> {
    let status = match client.status().await {
        Err(e) if e.is_connection() => {
            let _ = client.close().await;
            client.connect().await?;
            client.status().await?
        }
        other => other?,
    };

    // right after a playlist swap the player can report play without a
    // duration yet; ask once more after a beat
    if status.state == PlaybackState::Play && status.duration.is_none() {
        sleep(Duration::from_millis(500)).await;
        return client.status().await;
    }
    Ok(status)
}

async fn render_status(ctx: &AppContext, status: &PlayerStatus) {
    let long_track = status
        .duration
        .is_some_and(|duration| duration > ctx.long_track);

    if long_track && status.state == PlaybackState::Play {
        let plan = AnimationPlan::new(
            status.duration.unwrap_or_default(),
            status.elapsed.unwrap_or_default(),
            ctx.segments,
        );
        if let Err(e) = ctx.coordinator.start_animation(plan).await {
            warn!(%e, "could not start progress animation");
        }
        return;
    }

    // paused/stopped long tracks and everything short: playlist view
    ctx.coordinator.cancel_active().await;
    let mut view = ctx.view.lock().await;
    let yet_to_play = status.yet_to_play();
    if let Err(e) = ctx
        .coordinator
        .render(|strip| view.render(strip, yet_to_play))
        .await
    {
        warn!(%e, "playlist view render failed");
    }
}
