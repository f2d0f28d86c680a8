//! Test doubles shared by the display tests

use juke_core::{Color, LedStrip, Result};
use std::sync::{Arc, Mutex};

/// Strip double recording every latched frame
#[derive(Clone, Default)]
pub(crate) struct TestStrip {
    pixels: Vec<Color>,
    pub shows: Arc<Mutex<Vec<Vec<Color>>>>,
}

impl TestStrip {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Color::OFF; len],
            shows: Arc::default(),
        }
    }

    pub fn last_frame(&self) -> Vec<Color> {
        self.shows.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl LedStrip for TestStrip {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn set(&mut self, index: usize, color: Color) {
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn show(&mut self) -> Result<()> {
        self.shows.lock().unwrap().push(self.pixels.clone());
        Ok(())
    }
}
