//! Scripted in-memory player for unit tests
//!
//! Models just enough of the daemon to check operation sequences: a
//! library for `find`, a mutable playlist, and a call log the tests
//! assert against.

use async_trait::async_trait;
use juke_core::{
    CoreError, PlaybackState, PlayerClient, PlayerStatus, Result, TrackInfo,
};
use std::time::Duration;

pub struct FakePlayer {
    pub library: Vec<TrackInfo>,
    pub playlist: Vec<TrackInfo>,
    pub state: PlaybackState,
    pub song: Option<u32>,
    pub volume: u8,
    pub duration: Option<Duration>,
    pub elapsed: Option<Duration>,
    pub consume: bool,
    /// Every mutating call, in order
    pub calls: Vec<String>,
    /// When set, every call fails with this flavor of error
    pub fail_connection: bool,
}

impl Default for FakePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlayer {
    pub fn new() -> Self {
        Self {
            library: Vec::new(),
            playlist: Vec::new(),
            state: PlaybackState::Stop,
            song: None,
            volume: 20,
            duration: None,
            elapsed: None,
            consume: false,
            calls: Vec::new(),
            fail_connection: false,
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail_connection {
            Err(CoreError::Connection("scripted failure".into()))
        } else {
            Ok(())
        }
    }

    fn renumber(&mut self) {
        for (i, t) in self.playlist.iter_mut().enumerate() {
            t.position = i as u32;
        }
    }
}

#[async_trait]
impl PlayerClient for FakePlayer {
    async fn connect(&mut self) -> Result<()> {
        self.check()
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.check()
    }

    async fn status(&mut self) -> Result<PlayerStatus> {
        self.check()?;
        let len = self.playlist.len() as u32;
        Ok(PlayerStatus {
            state: self.state,
            volume: Some(self.volume),
            song: self.song,
            next_song: self
                .song
                .and_then(|s| (s + 1 < len).then_some(s + 1)),
            playlist_length: len,
            duration: self.duration,
            elapsed: self.elapsed,
        })
    }

    async fn play(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("play".into());
        self.state = PlaybackState::Play;
        if self.song.is_none() && !self.playlist.is_empty() {
            self.song = Some(0);
        }
        Ok(())
    }

    async fn play_pos(&mut self, pos: u32) -> Result<()> {
        self.check()?;
        self.calls.push(format!("play {pos}"));
        self.state = PlaybackState::Play;
        self.song = Some(pos);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("pause".into());
        self.state = PlaybackState::Pause;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("stop".into());
        self.state = PlaybackState::Stop;
        Ok(())
    }

    async fn seek(&mut self, pos: u32, seconds: u64) -> Result<()> {
        self.check()?;
        self.calls.push(format!("seek {pos} {seconds}"));
        self.song = Some(pos);
        self.elapsed = Some(Duration::from_secs(seconds));
        Ok(())
    }

    async fn seek_current(&mut self, delta_seconds: i64) -> Result<()> {
        self.check()?;
        self.calls.push(format!("seekcur {delta_seconds:+}"));
        Ok(())
    }

    async fn next(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("next".into());
        self.song = self.song.map(|s| s + 1);
        Ok(())
    }

    async fn previous(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("previous".into());
        self.song = self.song.map(|s| s.saturating_sub(1));
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.check()?;
        self.calls.push("clear".into());
        self.playlist.clear();
        self.song = None;
        self.state = PlaybackState::Stop;
        Ok(())
    }

    async fn add(&mut self, uri: &str) -> Result<()> {
        self.check()?;
        self.calls.push(format!("add {uri}"));
        let track = self
            .library
            .iter()
            .find(|t| t.file == uri)
            .cloned()
            .unwrap_or_else(|| TrackInfo {
                file: uri.to_string(),
                title: None,
                album: None,
                position: 0,
            });
        self.playlist.push(track);
        self.renumber();
        Ok(())
    }

    async fn delete(&mut self, pos: u32) -> Result<()> {
        self.check()?;
        self.calls.push(format!("delete {pos}"));
        if (pos as usize) < self.playlist.len() {
            self.playlist.remove(pos as usize);
            self.renumber();
        }
        Ok(())
    }

    async fn consume(&mut self, on: bool) -> Result<()> {
        self.check()?;
        self.calls.push(format!("consume {}", u8::from(on)));
        self.consume = on;
        Ok(())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.check()?;
        self.calls.push(format!("setvol {volume}"));
        self.volume = volume;
        Ok(())
    }

    async fn find(&mut self, tag: &str, needle: &str) -> Result<Vec<TrackInfo>> {
        self.check()?;
        self.calls.push(format!("find {tag} {needle}"));
        Ok(self
            .library
            .iter()
            .filter(|t| match tag {
                "title" => t.title.as_deref() == Some(needle),
                "album" => t.album.as_deref() == Some(needle),
                _ => false,
            })
            .cloned()
            .collect())
    }

    async fn load(&mut self, name: &str) -> Result<()> {
        self.check()?;
        self.calls.push(format!("load {name}"));
        Ok(())
    }

    async fn playlist_range(&mut self, start: u32, end: u32) -> Result<Vec<TrackInfo>> {
        self.check()?;
        let start = start as usize;
        let end = (end as usize).min(self.playlist.len());
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self.playlist[start..end].to_vec())
    }

    async fn idle(&mut self, _subsystems: &[&str]) -> Result<Vec<String>> {
        self.check()?;
        // a real daemon blocks here; tests never rely on it firing
        std::future::pending().await
    }
}
