//! Juke controller daemon
//!
//! Brings the pieces together: loads the config, restores persisted
//! player state, spawns one task per input source plus the idle loop,
//! then parks on signals. SIGUSR1 runs the full power-off path; the
//! usual termination signals save state and exit.

use anyhow::Context as _;
use juke_controller::{
    config::ControllerConfig, context::AppContext, hw, jobs, loops, mpd::MpdClient,
};
use juke_input::ButtonId;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "juke_controller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = ControllerConfig::path();
    let config = ControllerConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(path = %config_path.display(), "configuration loaded");

    let strip = hw::ConsoleStrip::new(config.display.leds);
    let reader = hw::StdinTagReader::new();
    let player = MpdClient::new(config.player.addr.clone());
    // the idle loop blocks its connection, so it gets its own
    let idle_client = MpdClient::new(config.player.addr.clone());

    let ctx = Arc::new(AppContext::new(
        config,
        config_path,
        Box::new(player),
        Box::new(strip),
    ));

    startup(&ctx).await;

    let mut handles = Vec::new();
    for button in [ButtonId::Forward, ButtonId::Backward, ButtonId::Playlist] {
        handles.push(tokio::spawn(loops::button_loop(
            Arc::clone(&ctx),
            button,
            Box::new(hw::IdleButton),
            ctx.coordinator.subscribe(),
        )));
    }
    handles.push(tokio::spawn(loops::rotary_loop(
        Arc::clone(&ctx),
        Box::new(hw::IdleRotary),
        ctx.coordinator.subscribe(),
    )));
    handles.push(tokio::spawn(loops::tag_loop(
        Arc::clone(&ctx),
        Box::new(reader),
        ctx.coordinator.subscribe(),
    )));
    handles.push(tokio::spawn(loops::idle_loop(
        Arc::clone(&ctx),
        Box::new(idle_client),
        ctx.coordinator.subscribe(),
    )));

    wait_for_signals(&ctx).await?;

    for handle in handles {
        let _ = handle.await;
    }
    info!("controller stopped");
    Ok(())
}

/// Greet on the strip and put the player back the way it was left.
async fn startup(ctx: &Arc<AppContext>) {
    if let Err(e) = ctx.coordinator.hello().await {
        warn!(%e, "hello wipe failed");
    }

    let (party_mode, volume, resume) = {
        let mut config = ctx.config.lock().await;
        let resume = config.ps_state == "play";
        config.ps_state.clear();
        (config.party_mode, config.volume, resume)
    };

    let mut player = ctx.player.lock().await;
    if let Err(e) = player.connect().await {
        warn!(%e, "player not reachable yet; connecting on demand");
        return;
    }
    if let Err(e) = player.consume(party_mode).await {
        warn!(%e, "could not restore party mode");
    }
    if let Err(e) = player.set_volume(volume).await {
        warn!(%e, "could not restore volume");
    }
    if resume {
        info!("resuming playback from before power-off");
        if let Err(e) = player.play().await {
            warn!(%e, "could not resume playback");
        }
    }
    drop(player);
    ctx.request_refresh();
}

async fn wait_for_signals(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received"),
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = sighup.recv() => info!("SIGHUP received"),
        _ = sigquit.recv() => info!("SIGQUIT received"),
        _ = sigusr1.recv() => {
            info!("SIGUSR1 received, powering off");
            jobs::power_off(ctx).await;
            return Ok(());
        }
    }
    jobs::graceful_exit(ctx).await;
    Ok(())
}
