//! Static views and transient strip animations
//!
//! These render directly on a borrowed strip; the coordinator serializes
//! access so only one of them is ever in flight.

use crate::roman::roman_leds;
use juke_core::{Color, LedStrip, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Per-pixel delay of the sweep flash
const SWEEP_STEP: Duration = Duration::from_millis(30);
/// Settle time after a sweep so the flash reads as finished and the next
/// frame doesn't race it visually
const SWEEP_SETTLE: Duration = Duration::from_millis(500);
/// Per-pair delay of the startup/shutdown wipes
const WIPE_STEP: Duration = Duration::from_millis(600);

/// Largest count the roman view can show on 8 LEDs (XXXXVIII)
const MAX_ROMAN: u32 = 48;

/// The static playlist-length view with its last-good frame cached.
///
/// The cache lets error paths restore the display without a player
/// round-trip, which is the whole local-first recovery story: a failed
/// command flashes red and falls back to whatever was last shown.
#[derive(Debug, Default)]
pub struct PlaylistView {
    last: Vec<Color>,
}

impl PlaylistView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `yet_to_play` as roman-numeral LEDs and cache the frame.
    ///
    /// An empty playlist leaves the strip dark but keeps the previous
    /// cache, so error recovery still has something to restore.
    pub fn render(&mut self, strip: &mut dyn LedStrip, yet_to_play: u32) -> Result<()> {
        debug!(yet_to_play, "rendering playlist view");
        let shown = yet_to_play.min(MAX_ROMAN);
        if shown == 0 {
            strip.fill(Color::OFF);
            return strip.show();
        }
        self.last = roman_leds(shown);
        self.paint(strip)
    }

    /// Re-render the cached frame, e.g. after an error flash.
    pub fn restore(&self, strip: &mut dyn LedStrip) -> Result<()> {
        self.paint(strip)
    }

    fn paint(&self, strip: &mut dyn LedStrip) -> Result<()> {
        strip.fill(Color::OFF);
        for (i, color) in self.last.iter().enumerate().take(strip.len()) {
            strip.set(i, *color);
        }
        strip.show()
    }
}

/// Back-and-forth single-pixel sweep, green for success, red for errors,
/// purple for unrecognized tags.
pub async fn sweep_flash(strip: &mut dyn LedStrip, color: Color) -> Result<()> {
    strip.fill(Color::OFF);
    strip.show()?;

    let len = strip.len();
    let forward = 0..len;
    let backward = (0..len).rev();

    for (pass, range) in [forward.collect::<Vec<_>>(), backward.collect()]
        .into_iter()
        .enumerate()
    {
        for x in range {
            strip.set(x, color);
            strip.show()?;
            sleep(SWEEP_STEP).await;
            // trail off the pixel behind the moving one
            if pass == 0 && x > 0 {
                strip.set(x - 1, Color::OFF);
            } else if pass > 0 && x + 1 < len {
                strip.set(x + 1, Color::OFF);
            }
            strip.show()?;
        }
    }

    strip.set(0, Color::OFF);
    strip.show()?;
    sleep(SWEEP_SETTLE).await;
    Ok(())
}

/// Startup wipe: pairs light up green from the center outward.
pub async fn hello(strip: &mut dyn LedStrip) -> Result<()> {
    wipe(strip, Color::OFF, Color::GREEN).await
}

/// Shutdown wipe: a green strip goes dark from the center outward.
pub async fn goodbye(strip: &mut dyn LedStrip) -> Result<()> {
    wipe(strip, Color::GREEN, Color::OFF).await?;
    sleep(Duration::from_millis(300)).await;
    strip.fill(Color::OFF);
    strip.show()
}

async fn wipe(strip: &mut dyn LedStrip, from: Color, to: Color) -> Result<()> {
    strip.fill(from);
    strip.show()?;

    let half = strip.len() / 2;
    for x in 0..half {
        // inner pair first
        strip.set(half - 1 - x, to);
        strip.set(half + x, to);
        strip.show()?;
        sleep(WIPE_STEP).await;
    }
    Ok(())
}
