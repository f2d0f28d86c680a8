//! Cancellation coordinator
//!
//! Owns the strip and the (at most one) live animation task under a
//! single lock, and carries the global shutdown signal every loop
//! observes.
//!
//! Ownership of the strip only ever transfers through an explicit
//! hand-off: cancel the current owner, await its self-reported
//! termination, then render. A task that never observes its token leaks
//! until process exit; that is logged, not fatal, since tasks own
//! disjoint hardware-write state.

use crate::progress::{self, AnimationOutcome, AnimationPlan};
use crate::views;
use juke_core::{Color, CoreError, LedStrip, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Receiver half of the global shutdown signal.
///
/// Each loop holds its own token, so one broadcast reaches every
/// consumer without any re-emission protocol.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Resolves once shutdown has been broadcast. Also resolves when the
    /// coordinator is gone, which only happens on teardown anyway.
    pub async fn signalled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Non-blocking checkpoint for polling loops.
    pub fn is_signalled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// One registered background animation
struct AnimationTask {
    cancel: watch::Sender<bool>,
    /// Set by the task itself on any exit path; sweep only reaps tasks
    /// that flipped it
    finished: Arc<AtomicBool>,
    handle: JoinHandle<(Box<dyn LedStrip>, AnimationOutcome)>,
}

struct Inner {
    /// Present whenever no animation task owns the strip
    strip: Option<Box<dyn LedStrip>>,
    active: Option<AnimationTask>,
}

/// Registry of live animation tasks plus the shutdown broadcast.
///
/// Enforces the system-wide invariant of at most one active animation.
pub struct AnimationCoordinator {
    inner: Mutex<Inner>,
    shutdown: watch::Sender<bool>,
}

impl AnimationCoordinator {
    /// Take exclusive custody of the strip.
    pub fn new(strip: Box<dyn LedStrip>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Mutex::new(Inner {
                strip: Some(strip),
                active: None,
            }),
            shutdown,
        }
    }

    /// Hand a token to a loop so it can observe shutdown.
    pub fn subscribe(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.shutdown.subscribe(),
        }
    }

    /// Set the global shutdown signal observed by every loop.
    pub fn broadcast_shutdown(&self) {
        info!("broadcasting shutdown");
        self.shutdown.send_replace(true);
    }

    /// Register a new animation: cancel any live one, wait for its
    /// termination, then hand the strip to the new task.
    pub async fn start_animation(&self, plan: AnimationPlan) -> Result<()> {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await;

        let strip = inner
            .strip
            .take()
            .ok_or_else(|| CoreError::Hardware("LED strip handle lost".into()))?;

        debug!(?plan, "starting progress animation");
        let (cancel, cancel_rx) = watch::channel(false);
        let finished = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(progress::run(
            strip,
            plan,
            cancel_rx,
            self.subscribe(),
            Arc::clone(&finished),
        ));

        inner.active = Some(AnimationTask {
            cancel,
            finished,
            handle,
        });
        Ok(())
    }

    /// Request cancellation of the active animation and wait for its
    /// self-reported termination. Returns how it ended, if one ran.
    pub async fn cancel_active(&self) -> Option<AnimationOutcome> {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await
    }

    /// Reap the active task only if it has itself reported completion;
    /// reaping is never forced.
    pub async fn sweep(&self) {
        let mut inner = self.inner.lock().await;
        let done = inner
            .active
            .as_ref()
            .is_some_and(|task| task.finished.load(Ordering::Acquire));
        if done {
            Self::cancel_locked(&mut inner).await;
        }
    }

    /// Number of registered tasks that have not reported completion.
    pub async fn live_tasks(&self) -> usize {
        let inner = self.inner.lock().await;
        usize::from(
            inner
                .active
                .as_ref()
                .is_some_and(|task| !task.finished.load(Ordering::Acquire)),
        )
    }

    /// Reclaim the strip and draw one frame on it. The closure is
    /// responsible for latching via [`LedStrip::show`], so cached views
    /// can paint themselves without a second latch.
    pub async fn render<F>(&self, frame: F) -> Result<()>
    where
        F: FnOnce(&mut dyn LedStrip) -> Result<()>,
    {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await;
        frame(Self::strip_mut(&mut inner)?)
    }

    /// Sweep flash in the given color (GREEN success, RED error, PURPLE
    /// unknown tag).
    pub async fn flash(&self, color: Color) -> Result<()> {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await;
        views::sweep_flash(Self::strip_mut(&mut inner)?, color).await
    }

    /// Startup wipe.
    pub async fn hello(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await;
        views::hello(Self::strip_mut(&mut inner)?).await
    }

    /// Shutdown wipe; leaves the strip dark.
    pub async fn goodbye(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        Self::cancel_locked(&mut inner).await;
        views::goodbye(Self::strip_mut(&mut inner)?).await
    }

    /// Turn every pixel off.
    pub async fn all_off(&self) -> Result<()> {
        self.render(|strip| {
            strip.fill(Color::OFF);
            strip.show()
        })
        .await
    }

    fn strip_mut(inner: &mut Inner) -> Result<&mut (dyn LedStrip + 'static)> {
        inner
            .strip
            .as_mut()
            .map(AsMut::as_mut)
            .ok_or_else(|| CoreError::Hardware("LED strip handle lost".into()))
    }

    async fn cancel_locked(inner: &mut Inner) -> Option<AnimationOutcome> {
        let task = inner.active.take()?;
        // Wake the task's next segment-boundary check.
        let _ = task.cancel.send(true);
        match task.handle.await {
            Ok((strip, outcome)) => {
                inner.strip = Some(strip);
                debug!(?outcome, "animation task reaped");
                Some(outcome)
            }
            Err(err) => {
                // The strip handle is gone with the task. Documented
                // limitation: the leak lasts until process exit.
                error!(%err, "animation task did not terminate cleanly");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStrip;
    use std::time::Duration;
    use tokio::time::sleep;

    fn coordinator_with_strip() -> (AnimationCoordinator, TestStrip) {
        let strip = TestStrip::new(8);
        let mirror = strip.clone();
        (AnimationCoordinator::new(Box::new(strip)), mirror)
    }

    fn long_plan() -> AnimationPlan {
        AnimationPlan::new(Duration::from_secs(480), Duration::ZERO, 8)
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_mid_flight_leaves_zero_live_tasks() {
        let (coordinator, _mirror) = coordinator_with_strip();
        coordinator.start_animation(long_plan()).await.unwrap();
        assert_eq!(coordinator.live_tasks().await, 1);

        // let the task render a couple of segments
        sleep(Duration::from_secs(150)).await;

        let outcome = coordinator.cancel_active().await;
        assert_eq!(outcome, Some(AnimationOutcome::Cancelled));
        assert_eq!(coordinator.live_tasks().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_animation_reports_itself_and_sweeps_clean() {
        let (coordinator, mirror) = coordinator_with_strip();
        let plan = AnimationPlan::new(Duration::from_secs(8), Duration::ZERO, 8);
        coordinator.start_animation(plan).await.unwrap();

        sleep(Duration::from_secs(10)).await;

        // the task reported completion on its own
        assert_eq!(coordinator.live_tasks().await, 0);
        coordinator.sweep().await;

        // strip is back; the final frame is fully filled
        assert!(mirror.last_frame().iter().all(|c| *c == Color::YELLOW));
        coordinator.all_off().await.unwrap();
        assert!(mirror.last_frame().iter().all(|c| *c == Color::OFF));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_second_animation_cancels_the_first() {
        let (coordinator, mirror) = coordinator_with_strip();
        coordinator.start_animation(long_plan()).await.unwrap();
        sleep(Duration::from_secs(70)).await;

        // second animation for a track already two segments in
        let plan = AnimationPlan::new(Duration::from_secs(480), Duration::from_secs(120), 8);
        coordinator.start_animation(plan).await.unwrap();
        assert_eq!(coordinator.live_tasks().await, 1);

        sleep(Duration::from_millis(10)).await;
        let frame = mirror.last_frame();
        assert_eq!(&frame[..2], &[Color::YELLOW; 2]);
        assert_eq!(&frame[2..], &[Color::OFF; 6]);

        coordinator.cancel_active().await;
        assert_eq!(coordinator.live_tasks().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_broadcast_stops_the_animation() {
        let (coordinator, _mirror) = coordinator_with_strip();
        coordinator.start_animation(long_plan()).await.unwrap();

        coordinator.broadcast_shutdown();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(coordinator.live_tasks().await, 0);
        assert_eq!(coordinator.cancel_active().await, Some(AnimationOutcome::Cancelled));
    }

    #[tokio::test]
    async fn shutdown_token_observes_broadcast() {
        let (coordinator, _mirror) = coordinator_with_strip();
        let mut token = coordinator.subscribe();
        assert!(!token.is_signalled());

        coordinator.broadcast_shutdown();
        token.signalled().await;
        assert!(token.is_signalled());
    }

    #[tokio::test(start_paused = true)]
    async fn render_reclaims_the_strip_from_a_running_animation() {
        let (coordinator, mirror) = coordinator_with_strip();
        coordinator.start_animation(long_plan()).await.unwrap();
        sleep(Duration::from_secs(5)).await;

        coordinator
            .render(|strip| {
                strip.fill(Color::OFF);
                strip.set(0, Color::GREEN);
                strip.show()
            })
            .await
            .unwrap();

        assert_eq!(coordinator.live_tasks().await, 0);
        assert_eq!(mirror.last_frame()[0], Color::GREEN);
    }
}
