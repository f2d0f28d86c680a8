//! Per-button gesture state machine
//!
//! A press followed by a release stays pending for up to `double_window`;
//! a second press inside the window upgrades it to Double, otherwise it
//! commits as Single once the window has elapsed. Holds are tracked
//! independently of the press count and commit on release, split into
//! "hold alone" and "hold shortly after a prior press" by whether the
//! hold began more than `double_window` after the hold anchor (a press
//! remembered for up to `hold_reset`).

use juke_core::types::ButtonSample;
use juke_core::Timing;
use std::time::Instant;
use tracing::trace;

/// Identity of a physical button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Forward,
    Backward,
    Playlist,
}

/// A classified physical interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Single,
    Double,
    Hold {
        /// True when the hold began shortly after a separate press,
        /// selecting the second hold-triggered command
        after_press: bool,
    },
}

/// One committed gesture; produced once per disambiguation episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture {
    pub button: ButtonId,
    pub kind: GestureKind,
    pub at: Instant,
}

/// Timing-window state machine for a single button.
///
/// Exclusively owned and mutated by its button's polling loop; the
/// dispatcher only ever sees the committed [`Gesture`].
#[derive(Debug)]
pub struct GestureClassifier {
    button: ButtonId,
    timing: Timing,
    /// Presses seen in the current episode; saturates at 2
    press_count: u8,
    /// Time of the most recent Pressed sample
    last_press: Option<Instant>,
    /// Press time of the previously released group; a new press more than
    /// `double_window` after it discards pending partial state
    release_group: Option<Instant>,
    /// The current episode already committed; further presses inside its
    /// window are absorbed (Double is the finest granularity)
    spent: bool,
    /// Reference press for the hold-alone / hold-after-press split;
    /// forgotten once older than `hold_reset`
    hold_anchor: Option<Instant>,
    /// Start of the current hold episode, if any
    held_since: Option<Instant>,
}

impl GestureClassifier {
    pub fn new(button: ButtonId, timing: Timing) -> Self {
        Self {
            button,
            timing,
            press_count: 0,
            last_press: None,
            release_group: None,
            spent: false,
            hold_anchor: None,
            held_since: None,
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    /// Feed one raw sample. Returns a gesture when an episode commits.
    ///
    /// Gestures are strictly time-ordered per button: at most one commit
    /// per tick, and a commit always clears the episode that produced it.
    pub fn tick(&mut self, sample: ButtonSample, now: Instant) -> Option<Gesture> {
        let kind = match sample {
            ButtonSample::Held => {
                if self.held_since.is_none() {
                    trace!(button = ?self.button, "hold started");
                    self.held_since = Some(now);
                }
                None
            }
            ButtonSample::Pressed => {
                self.on_press(now);
                None
            }
            ButtonSample::Released => self.on_release(now),
        };

        kind.map(|kind| {
            trace!(button = ?self.button, ?kind, "gesture committed");
            Gesture {
                button: self.button,
                kind,
                at: now,
            }
        })
    }

    fn on_press(&mut self, now: Instant) {
        self.last_press = Some(now);

        match self.release_group {
            // A press long after the previous release group starts a new
            // episode and discards pending partial state.
            Some(group) if now.duration_since(group) > self.timing.double_window => {
                self.release_group = None;
                self.spent = false;
                self.press_count = 1;
            }
            None => {
                self.spent = false;
                self.press_count = 1;
            }
            // A third press inside an already-committed episode is
            // absorbed: Double is the finest granularity.
            Some(_) if self.spent => {}
            Some(_) => self.press_count = (self.press_count + 1).min(2),
        }

        if let Some(anchor) = self.hold_anchor {
            if now.duration_since(anchor) > self.timing.hold_reset {
                self.hold_anchor = None;
            }
        }
    }

    fn on_release(&mut self, now: Instant) -> Option<GestureKind> {
        // Adopt the episode's press as release group and hold anchor the
        // first time the button is seen up again.
        if self.release_group.is_none() {
            self.release_group = self.last_press;
        }
        if self.hold_anchor.is_none() {
            self.hold_anchor = self.last_press;
        }

        if let Some(held_since) = self.held_since.take() {
            let after_press = match self.hold_anchor {
                Some(anchor) => {
                    held_since.duration_since(anchor) >= self.timing.double_window
                }
                None => false,
            };
            self.press_count = 0;
            self.release_group = None;
            self.spent = false;
            self.hold_anchor = None;
            return Some(GestureKind::Hold { after_press });
        }

        let (last_press, group) = (self.last_press?, self.release_group?);

        if self.press_count == 2
            && last_press.duration_since(group) <= self.timing.double_window
        {
            self.press_count = 0;
            self.spent = true;
            return Some(GestureKind::Double);
        }

        // A lone press commits only once the disambiguation window has
        // passed without a second press.
        if self.press_count == 1
            && now.duration_since(last_press) > self.timing.double_window
        {
            self.press_count = 0;
            return Some(GestureKind::Single);
        }

        None
    }
}
