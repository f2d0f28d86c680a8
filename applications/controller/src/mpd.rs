//! MPD protocol backend for [`PlayerClient`]
//!
//! Speaks the classic line-oriented MPD protocol over TCP. Commands the
//! daemon rejects come back as `ACK` lines and map to
//! [`CoreError::Command`]; socket trouble maps to
//! [`CoreError::Connection`] and drops the connection so the next call
//! reconnects.
//!
//! `idle` is not cancel-safe: dropping its future mid-response leaves
//! the stream desynced, so the idle loop closes and reconnects per
//! iteration.

use async_trait::async_trait;
use juke_core::{
    CoreError, PlaybackState, PlayerClient, PlayerStatus, Result, TrackInfo,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::{debug, trace};

pub struct MpdClient {
    addr: String,
    conn: Option<BufStream<TcpStream>>,
}

impl MpdClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: None,
        }
    }

    async fn ensure_connected(&mut self) -> Result<&mut BufStream<TcpStream>> {
        if self.conn.is_none() {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(|e| CoreError::Connection(format!("{}: {e}", self.addr)))?;
            let mut conn = BufStream::new(stream);

            let mut banner = String::new();
            conn.read_line(&mut banner)
                .await
                .map_err(|e| CoreError::Connection(e.to_string()))?;
            if !banner.starts_with("OK MPD") {
                return Err(CoreError::Connection(format!(
                    "unexpected banner: {}",
                    banner.trim_end()
                )));
            }
            debug!(addr = %self.addr, banner = %banner.trim_end(), "connected to player");
            self.conn = Some(conn);
        }
        // just inserted above if it was missing
        self.conn
            .as_mut()
            .ok_or_else(|| CoreError::Connection("not connected".into()))
    }

    /// Send one command and collect the response lines up to `OK`.
    async fn command(&mut self, cmd: &str) -> Result<Vec<String>> {
        trace!(%cmd, "player command");
        let res = async {
            let conn = self.ensure_connected().await?;
            conn.write_all(cmd.as_bytes()).await?;
            conn.write_all(b"\n").await?;
            conn.flush().await?;

            let mut lines = Vec::new();
            loop {
                let mut line = String::new();
                let n = conn.read_line(&mut line).await?;
                if n == 0 {
                    return Err(CoreError::Connection("connection closed".into()));
                }
                let line = line.trim_end().to_string();
                if line == "OK" {
                    return Ok(lines);
                }
                if let Some(ack) = line.strip_prefix("ACK ") {
                    return Err(CoreError::Command(ack.to_string()));
                }
                lines.push(line);
            }
        }
        .await;

        match res {
            Err(e) if e.is_connection() => {
                // force a reconnect on the next call
                self.conn = None;
                Err(e)
            }
            other => other,
        }
    }
}

/// Double-quote an argument, escaping backslashes and quotes.
fn quote(arg: &str) -> String {
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Split a `key: value` response line.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    line.split_once(": ")
}

/// Decode a `status` response.
fn parse_status(lines: &[String]) -> Result<PlayerStatus> {
    let mut state = None;
    let mut volume = None;
    let mut song = None;
    let mut next_song = None;
    let mut playlist_length = 0;
    let mut duration = None;
    let mut elapsed = None;

    for line in lines {
        let Some((key, value)) = split_pair(line) else {
            continue;
        };
        match key {
            "state" => state = PlaybackState::parse(value),
            "volume" => volume = value.parse().ok(),
            "song" => song = value.parse().ok(),
            "nextsong" => next_song = value.parse().ok(),
            "playlistlength" => playlist_length = value.parse().unwrap_or(0),
            "duration" => duration = value.parse::<f64>().ok().map(Duration::from_secs_f64),
            "elapsed" => elapsed = value.parse::<f64>().ok().map(Duration::from_secs_f64),
            _ => {}
        }
    }

    Ok(PlayerStatus {
        state: state.ok_or_else(|| CoreError::Command("status without state".into()))?,
        volume,
        song,
        next_song,
        playlist_length,
        duration,
        elapsed,
    })
}

/// Decode `find`/`playlistinfo` responses: entries start at `file:`.
fn parse_tracks(lines: &[String]) -> Vec<TrackInfo> {
    let mut tracks: Vec<TrackInfo> = Vec::new();
    for line in lines {
        let Some((key, value)) = split_pair(line) else {
            continue;
        };
        match key {
            "file" => tracks.push(TrackInfo {
                file: value.to_string(),
                title: None,
                album: None,
                position: 0,
            }),
            "Title" => {
                if let Some(t) = tracks.last_mut() {
                    t.title = Some(value.to_string());
                }
            }
            "Album" => {
                if let Some(t) = tracks.last_mut() {
                    t.album = Some(value.to_string());
                }
            }
            "Pos" => {
                if let Some(t) = tracks.last_mut() {
                    t.position = value.parse().unwrap_or(0);
                }
            }
            _ => {}
        }
    }
    tracks
}

#[async_trait]
impl PlayerClient for MpdClient {
    async fn connect(&mut self) -> Result<()> {
        self.ensure_connected().await.map(|_| ())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.write_all(b"close\n").await;
            let _ = conn.flush().await;
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.command("ping").await.map(|_| ())
    }

    async fn status(&mut self) -> Result<PlayerStatus> {
        let lines = self.command("status").await?;
        parse_status(&lines)
    }

    async fn play(&mut self) -> Result<()> {
        self.command("play").await.map(|_| ())
    }

    async fn play_pos(&mut self, pos: u32) -> Result<()> {
        self.command(&format!("play {pos}")).await.map(|_| ())
    }

    async fn pause(&mut self) -> Result<()> {
        self.command("pause 1").await.map(|_| ())
    }

    async fn stop(&mut self) -> Result<()> {
        self.command("stop").await.map(|_| ())
    }

    async fn seek(&mut self, pos: u32, seconds: u64) -> Result<()> {
        self.command(&format!("seek {pos} {seconds}")).await.map(|_| ())
    }

    async fn seek_current(&mut self, delta_seconds: i64) -> Result<()> {
        self.command(&format!("seekcur {delta_seconds:+}")).await.map(|_| ())
    }

    async fn next(&mut self) -> Result<()> {
        self.command("next").await.map(|_| ())
    }

    async fn previous(&mut self) -> Result<()> {
        self.command("previous").await.map(|_| ())
    }

    async fn clear(&mut self) -> Result<()> {
        self.command("clear").await.map(|_| ())
    }

    async fn add(&mut self, uri: &str) -> Result<()> {
        self.command(&format!("add {}", quote(uri))).await.map(|_| ())
    }

    async fn delete(&mut self, pos: u32) -> Result<()> {
        self.command(&format!("delete {pos}")).await.map(|_| ())
    }

    async fn consume(&mut self, on: bool) -> Result<()> {
        self.command(&format!("consume {}", u8::from(on))).await.map(|_| ())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.command(&format!("setvol {volume}")).await.map(|_| ())
    }

    async fn find(&mut self, tag: &str, needle: &str) -> Result<Vec<TrackInfo>> {
        let lines = self.command(&format!("find {tag} {}", quote(needle))).await?;
        Ok(parse_tracks(&lines))
    }

    async fn load(&mut self, name: &str) -> Result<()> {
        self.command(&format!("load {}", quote(name))).await.map(|_| ())
    }

    async fn playlist_range(&mut self, start: u32, end: u32) -> Result<Vec<TrackInfo>> {
        let lines = self.command(&format!("playlistinfo {start}:{end}")).await?;
        Ok(parse_tracks(&lines))
    }

    async fn idle(&mut self, subsystems: &[&str]) -> Result<Vec<String>> {
        let cmd = format!("idle {}", subsystems.join(" "));
        let lines = self.command(&cmd).await?;
        Ok(lines
            .iter()
            .filter_map(|l| split_pair(l))
            .filter(|(k, _)| *k == "changed")
            .map(|(_, v)| v.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn status_decodes_playing_long_track() {
        let status = parse_status(&lines(&[
            "volume: 20",
            "state: play",
            "song: 2",
            "nextsong: 3",
            "playlistlength: 9",
            "duration: 652.438",
            "elapsed: 65.002",
        ]))
        .unwrap();
        assert_eq!(status.state, PlaybackState::Play);
        assert_eq!(status.song, Some(2));
        assert_eq!(status.playlist_length, 9);
        assert_eq!(status.duration.unwrap().as_secs(), 652);
        assert_eq!(status.yet_to_play(), 7);
    }

    #[test]
    fn status_without_state_is_a_command_error() {
        assert!(matches!(
            parse_status(&lines(&["volume: 20"])),
            Err(CoreError::Command(_))
        ));
    }

    #[test]
    fn tracks_group_by_file() {
        let tracks = parse_tracks(&lines(&[
            "file: soad/toxicity/01.ogg",
            "Title: Prison Song",
            "Album: Toxicity",
            "Pos: 0",
            "file: soad/toxicity/02.ogg",
            "Title: Needles",
            "Album: Toxicity",
            "Pos: 1",
        ]));
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].title.as_deref(), Some("Needles"));
        assert_eq!(tracks[1].position, 1);
    }

    #[test]
    fn quoting_escapes_quotes_and_backslashes() {
        assert_eq!(quote(r#"a "b" c"#), r#""a \"b\" c""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    /// Scripted MPD server for one connection
    async fn fake_mpd(responses: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"OK MPD 0.23.5\n").await.unwrap();
            let mut buf = vec![0u8; 1024];
            for (expect, reply) in responses {
                let n = sock.read(&mut buf).await.unwrap();
                let got = String::from_utf8_lossy(&buf[..n]);
                assert_eq!(got.trim_end(), expect);
                sock.write_all(reply.as_bytes()).await.unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn talks_the_wire_protocol() {
        let addr = fake_mpd(vec![
            ("ping", "OK\n"),
            ("status", "state: stop\nplaylistlength: 0\nOK\n"),
            ("play 0", "ACK [55@0] {play} Bad song index\n"),
        ])
        .await;

        let mut client = MpdClient::new(addr);
        client.ping().await.unwrap();

        let status = client.status().await.unwrap();
        assert_eq!(status.state, PlaybackState::Stop);
        assert_eq!(status.playlist_length, 0);

        // rejected command surfaces as a protocol error, not a
        // connection error
        let err = client.play_pos(0).await.unwrap_err();
        assert!(matches!(err, CoreError::Command(_)));
        assert!(!err.is_connection());
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connection_error() {
        let mut client = MpdClient::new("127.0.0.1:1");
        let err = client.ping().await.unwrap_err();
        assert!(err.is_connection());
    }
}
