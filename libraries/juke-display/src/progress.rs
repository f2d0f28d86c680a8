//! Progress animation engine
//!
//! For a long track the strip becomes a progress bar: the track duration
//! is split into one step per LED segment. Segments for time already
//! elapsed light up instantly (catching up), the partially elapsed step
//! sleeps out its remainder, then one segment lights per step until the
//! track ends or the task is cancelled.
//!
//! Cancellation is cooperative and checked at every segment boundary -
//! the task's only suspension point - so cancellation latency is bounded
//! by one step duration. The task exclusively owns the strip handle while
//! it runs and returns it on exit.

use crate::coordinator::ShutdownToken;
use juke_core::{Color, LedStrip};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

/// Fill color of elapsed segments
const FILL: Color = Color::YELLOW;

/// How one animation run terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// All segments filled
    Completed,
    /// A cancellation or shutdown token was observed at a segment boundary
    Cancelled,
}

/// Precomputed schedule for one animation run.
///
/// Pure data so the catching-up arithmetic is testable without time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationPlan {
    /// Number of LED segments representing the whole track
    pub segments: usize,
    /// Play time represented by one segment
    pub step: Duration,
    /// Segments filled instantly because their time has already elapsed
    pub prefilled: usize,
    /// Remainder of the partially elapsed step to sleep before the next
    /// segment lights; `None` when starting exactly on a boundary
    pub partial: Option<Duration>,
}

impl AnimationPlan {
    /// Split `duration` into `segments` steps and figure out where
    /// `elapsed` playback already is.
    pub fn new(duration: Duration, elapsed: Duration, segments: usize) -> Self {
        let step = duration / segments.max(1) as u32;
        if step.is_zero() {
            return Self {
                segments,
                step,
                prefilled: segments,
                partial: None,
            };
        }

        let prefilled =
            usize::try_from(elapsed.as_micros() / step.as_micros()).unwrap_or(usize::MAX);
        let prefilled = prefilled.min(segments);

        let partial = if prefilled < segments {
            let into_step = Duration::from_micros((elapsed.as_micros() % step.as_micros()) as u64);
            (!into_step.is_zero()).then(|| step - into_step)
        } else {
            None
        };

        Self {
            segments,
            step,
            prefilled,
            partial,
        }
    }
}

/// Drive one animation to completion or cancellation.
///
/// Owns the strip for the whole run and always flips `finished` before
/// returning, which is the self-deregistration the coordinator's
/// `sweep` relies on.
pub(crate) async fn run(
    mut strip: Box<dyn LedStrip>,
    plan: AnimationPlan,
    mut cancel: watch::Receiver<bool>,
    mut shutdown: ShutdownToken,
    finished: Arc<AtomicBool>,
) -> (Box<dyn LedStrip>, AnimationOutcome) {
    let outcome = drive(strip.as_mut(), plan, &mut cancel, &mut shutdown).await;
    finished.store(true, Ordering::Release);
    debug!(?outcome, "animation ended");
    (strip, outcome)
}

async fn drive(
    strip: &mut dyn LedStrip,
    plan: AnimationPlan,
    cancel: &mut watch::Receiver<bool>,
    shutdown: &mut ShutdownToken,
) -> AnimationOutcome {
    // Catching up: render the elapsed-time backlog in one frame.
    strip.fill(Color::OFF);
    for i in 0..plan.prefilled.min(strip.len()) {
        strip.set(i, FILL);
    }
    if strip.show().is_err() {
        return AnimationOutcome::Cancelled;
    }

    let mut next = plan.prefilled;

    // Finish the partially elapsed step before falling into the regular
    // cadence.
    if let Some(partial) = plan.partial {
        if !pause(partial, cancel, shutdown).await {
            return AnimationOutcome::Cancelled;
        }
        strip.set(next, FILL);
        if strip.show().is_err() {
            return AnimationOutcome::Cancelled;
        }
        next += 1;
    }

    // Running: one segment per step.
    for i in next..plan.segments.min(strip.len()) {
        if !pause(plan.step, cancel, shutdown).await {
            return AnimationOutcome::Cancelled;
        }
        strip.set(i, FILL);
        if strip.show().is_err() {
            return AnimationOutcome::Cancelled;
        }
    }

    AnimationOutcome::Completed
}

/// Sleep one step, but wake early when the cancel or shutdown token
/// fires. Returns false when the run should stop.
async fn pause(
    step: Duration,
    cancel: &mut watch::Receiver<bool>,
    shutdown: &mut ShutdownToken,
) -> bool {
    tokio::select! {
        () = sleep(step) => true,
        _ = cancel.changed() => false,
        () = shutdown.signalled() => false,
    }
}
