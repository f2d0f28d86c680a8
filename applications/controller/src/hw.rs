//! Development hardware backends
//!
//! Stand-ins for the physical reader, strip, buttons, and dial so the
//! daemon runs on a desk: tags are lines typed on stdin, LED frames go
//! to the log, buttons and dial stay silent.

use async_trait::async_trait;
use juke_core::{
    ButtonProbe, ButtonSample, Color, CoreError, LedStrip, Result, RotaryEvent, RotaryEvents,
    TagReader, TagScan,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

/// LED strip that logs each latched frame.
pub struct ConsoleStrip {
    pixels: Vec<Color>,
}

impl ConsoleStrip {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Color::OFF; len],
        }
    }
}

impl LedStrip for ConsoleStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn show(&mut self) -> Result<()> {
        info!(frame = ?self.pixels, "led frame");
        Ok(())
    }
}

/// Tag reader fed by lines on stdin; the whole line is the payload.
pub struct StdinTagReader {
    lines: Lines<BufReader<Stdin>>,
    scans: u64,
}

impl StdinTagReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            scans: 0,
        }
    }
}

impl Default for StdinTagReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for StdinTagReader {
    async fn read(&mut self) -> Result<TagScan> {
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                self.scans += 1;
                Ok(TagScan {
                    id: self.scans,
                    text: line.trim().to_string(),
                })
            }
            // stdin closed: no more scans will ever arrive
            Ok(None) => std::future::pending().await,
            Err(e) => Err(CoreError::Hardware(e.to_string())),
        }
    }
}

/// A button that is never pressed.
pub struct IdleButton;

impl ButtonProbe for IdleButton {
    fn sample(&mut self) -> ButtonSample {
        ButtonSample::Released
    }
}

/// A dial that never moves.
pub struct IdleRotary;

#[async_trait]
impl RotaryEvents for IdleRotary {
    async fn next_event(&mut self) -> Result<RotaryEvent> {
        std::future::pending().await
    }
}
