//! Button polling loop
//!
//! One loop per physical button. Each tick feeds the raw level into the
//! gesture classifier; a committed gesture goes straight to dispatch.

use crate::context::AppContext;
use crate::dispatch;
use juke_core::ButtonProbe;
use juke_display::ShutdownToken;
use juke_input::{ButtonId, GestureClassifier};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub async fn button_loop(
    ctx: Arc<AppContext>,
    button: ButtonId,
    mut probe: Box<dyn ButtonProbe>,
    mut shutdown: ShutdownToken,
) {
    info!(?button, "starting button loop");
    let mut classifier = GestureClassifier::new(button, ctx.timing);
    let mut ticker = tokio::time::interval(ctx.timing.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = shutdown.signalled() => break,
        }
        let sample = probe.sample();
        if let Some(gesture) = classifier.tick(sample, Instant::now()) {
            dispatch::execute(&ctx, gesture).await;
        }
    }
    debug!(?button, "button loop stopped");
}
