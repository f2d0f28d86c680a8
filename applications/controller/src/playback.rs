//! Playback operations
//!
//! Free functions over a [`PlayerClient`] implementing the jukebox
//! behaviors: tag selections, wrap-around song skips, album skips,
//! bounded seeks, playlist edits, and the bookmark pair. Every function
//! surfaces the player's errors unchanged; feedback and recovery are the
//! dispatcher's job.

use juke_core::{Bookmark, CoreError, PlaybackState, PlayerClient, Result, TagPayload};
use tracing::{debug, info};

/// How a tag selection ended up on the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Playback started at the head of the (fresh or empty) playlist
    Started,
    /// Tracks were appended behind something already playing
    Queued,
}

/// Look up a tag selection and put it on the playlist.
///
/// With `clr_plist` the playlist is replaced and playback starts at
/// position 0; otherwise the selection is appended, and only an empty
/// playlist starts playing.
pub async fn add_and_play(
    player: &mut dyn PlayerClient,
    payload: &TagPayload,
    clr_plist: bool,
) -> Result<AddOutcome> {
    let hits = match payload {
        TagPayload::Track(title) => player.find("title", title).await?,
        TagPayload::Album(album) => player.find("album", album).await?,
        TagPayload::Playlist(_) => Vec::new(),
        _ => return Err(CoreError::Command("not a selection payload".into())),
    };

    if matches!(payload, TagPayload::Track(_) | TagPayload::Album(_)) && hits.is_empty() {
        return Err(CoreError::Command(format!("no match for {payload:?}")));
    }

    let had_tracks = if clr_plist {
        player.clear().await?;
        false
    } else {
        player.status().await?.playlist_length > 0
    };

    match payload {
        TagPayload::Playlist(name) => player.load(name).await?,
        _ => {
            for hit in &hits {
                player.add(&hit.file).await?;
            }
        }
    }

    if had_tracks {
        info!(?payload, "selection queued behind current playlist");
        Ok(AddOutcome::Queued)
    } else {
        player.play_pos(0).await?;
        info!(?payload, "selection playing");
        Ok(AddOutcome::Started)
    }
}

/// Skip forward one song, cycling from the last back to the first.
/// Keeps a paused/stopped player paused by seeking instead of playing.
pub async fn next_song(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    if status.playlist_length == 0 {
        return Ok(());
    }
    let on_last = status
        .song
        .is_some_and(|song| song + 1 == status.playlist_length);

    if status.state == PlaybackState::Play {
        if on_last {
            player.play_pos(0).await
        } else {
            player.next().await
        }
    } else if let Some(next) = status.next_song {
        player.seek(next, 0).await
    } else if on_last {
        player.seek(0, 0).await
    } else {
        Ok(())
    }
}

/// Skip back one song, cycling from the first to the last.
pub async fn previous_song(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    let Some(song) = status.song else {
        return Ok(());
    };
    let last = status.playlist_length.saturating_sub(1);

    if status.state == PlaybackState::Play {
        if song == 0 {
            player.seek(last, 0).await
        } else {
            player.previous().await
        }
    } else if song > 0 {
        player.seek(song - 1, 0).await
    } else {
        player.seek(last, 0).await
    }
}

/// Jump to the first song of the next album on the playlist.
pub async fn next_album(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    let Some(song) = status.song else {
        return Ok(());
    };
    let rest = player.playlist_range(song, status.playlist_length).await?;
    let Some(current) = rest.first() else {
        return Ok(());
    };
    if let Some(other) = rest.iter().find(|t| t.album != current.album) {
        debug!(album = ?other.album, "skipping to next album");
        player.seek(other.position, 0).await?;
    }
    Ok(())
}

/// Jump back to the last song of the previous album.
pub async fn previous_album(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    let end = status.next_song.unwrap_or(status.playlist_length);
    let mut before = player.playlist_range(0, end).await?;
    before.reverse();
    let Some(current) = before.first() else {
        return Ok(());
    };
    if let Some(other) = before.iter().find(|t| t.album != current.album) {
        debug!(album = ?other.album, "skipping to previous album");
        player.seek(other.position, 0).await?;
    }
    Ok(())
}

/// Seek relative to the current position.
///
/// A forward seek from within the final quarter of the track degrades to
/// a song skip instead of running past the end; a backward seek that
/// would cross the start lands exactly on 0.
pub async fn seek_by(player: &mut dyn PlayerClient, delta_seconds: i64) -> Result<()> {
    let status = player.status().await?;
    let (Some(duration), Some(elapsed)) = (status.duration, status.elapsed) else {
        return Ok(());
    };

    if delta_seconds >= 0 {
        if elapsed >= duration.mul_f64(0.75) {
            debug!("forward seek near track end degrades to next song");
            return next_song(player).await;
        }
        player.seek_current(delta_seconds).await
    } else if elapsed.as_secs() <= delta_seconds.unsigned_abs() {
        match status.song {
            Some(song) => player.seek(song, 0).await,
            None => Ok(()),
        }
    } else {
        player.seek_current(delta_seconds).await
    }
}

/// Remove the current song from the playlist.
pub async fn remove_song(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    if let Some(song) = status.song {
        player.delete(song).await?;
    }
    Ok(())
}

/// Remove every song of the current album from the playlist.
pub async fn remove_album(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    let Some(song) = status.song else {
        return Ok(());
    };
    let playlist = player.playlist_range(0, status.playlist_length).await?;
    let Some(current) = playlist.iter().find(|t| t.position == song) else {
        return Ok(());
    };
    let album = current.album.clone();

    // delete back to front so the remaining positions stay valid
    let mut doomed: Vec<u32> = playlist
        .iter()
        .filter(|t| t.album == album)
        .map(|t| t.position)
        .collect();
    doomed.reverse();
    for pos in doomed {
        player.delete(pos).await?;
    }
    Ok(())
}

pub async fn clear_playlist(player: &mut dyn PlayerClient) -> Result<()> {
    player.clear().await
}

/// Toggle play/pause; a stopped player starts playing.
pub async fn toggle_pause(player: &mut dyn PlayerClient) -> Result<()> {
    let status = player.status().await?;
    match status.state {
        PlaybackState::Play => player.pause().await,
        PlaybackState::Pause | PlaybackState::Stop => player.play().await,
    }
}

/// Party mode maps to consume on the player: played songs leave the
/// playlist.
pub async fn set_party(player: &mut dyn PlayerClient, on: bool) -> Result<()> {
    player.consume(on).await
}

/// Validate and push a volume.
pub async fn set_volume(player: &mut dyn PlayerClient, volume: u8) -> Result<()> {
    if volume > 100 {
        return Err(CoreError::Command(format!("volume {volume} out of range")));
    }
    player.set_volume(volume).await
}

/// Capture the current track and position as a bookmark.
pub async fn save_bookmark(player: &mut dyn PlayerClient) -> Result<Bookmark> {
    let status = player.status().await?;
    let Some(song) = status.song else {
        return Err(CoreError::Command("nothing to bookmark".into()));
    };
    let entry = player
        .playlist_range(song, song + 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::Command("nothing to bookmark".into()))?;

    Ok(Bookmark {
        title: entry.title.unwrap_or(entry.file),
        album: entry.album,
        elapsed_seconds: status.elapsed.map_or(0, |e| e.as_secs()),
    })
}

/// Re-select a bookmarked track and jump to its stored position.
pub async fn recall_bookmark(
    player: &mut dyn PlayerClient,
    bookmark: &Bookmark,
    clr_plist: bool,
) -> Result<()> {
    let selection = TagPayload::Track(bookmark.title.clone());
    let outcome = add_and_play(player, &selection, clr_plist).await?;
    if outcome == AddOutcome::Started && bookmark.elapsed_seconds > 0 {
        let status = player.status().await?;
        player
            .seek(status.song.unwrap_or(0), bookmark.elapsed_seconds)
            .await?;
    }
    Ok(())
}

/// Remember a playing state across a power cycle.
pub async fn playback_state_for_restart(player: &mut dyn PlayerClient) -> Result<Option<String>> {
    let status = player.status().await?;
    Ok((status.state == PlaybackState::Play).then(|| "play".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlayer;
    use juke_core::TrackInfo;
    use std::time::Duration;

    fn track(file: &str, title: &str, album: &str, position: u32) -> TrackInfo {
        TrackInfo {
            file: file.to_string(),
            title: Some(title.to_string()),
            album: Some(album.to_string()),
            position,
        }
    }

    fn toxicity() -> Vec<TrackInfo> {
        vec![
            track("soad/01.ogg", "Prison Song", "Toxicity", 0),
            track("soad/02.ogg", "Needles", "Toxicity", 1),
            track("soad/06.ogg", "Chop Suey", "Toxicity", 2),
        ]
    }

    #[tokio::test]
    async fn tag_selection_with_clear_mode_starts_at_position_zero() {
        // payload "t:Chop Suey", empty playlist, clear-playlist mode on
        let mut player = FakePlayer::new();
        player.library = toxicity();

        let outcome = add_and_play(
            &mut player,
            &TagPayload::Track("Chop Suey".to_string()),
            true,
        )
        .await
        .unwrap();

        assert_eq!(outcome, AddOutcome::Started);
        assert_eq!(
            player.calls,
            vec!["find title Chop Suey", "clear", "add soad/06.ogg", "play 0"]
        );
        assert_eq!(player.playlist.len(), 1);
        assert_eq!(player.song, Some(0));
    }

    #[tokio::test]
    async fn tag_selection_without_clear_mode_queues_behind_playback() {
        let mut player = FakePlayer::new();
        player.library = toxicity();
        player.playlist = vec![track("x.ogg", "Something", "Else", 0)];
        player.song = Some(0);
        player.state = PlaybackState::Play;

        let outcome = add_and_play(
            &mut player,
            &TagPayload::Album("Toxicity".to_string()),
            false,
        )
        .await
        .unwrap();

        assert_eq!(outcome, AddOutcome::Queued);
        assert!(!player.calls.iter().any(|c| c == "clear"));
        assert_eq!(player.playlist.len(), 4);
    }

    #[tokio::test]
    async fn unmatched_selection_mutates_nothing() {
        let mut player = FakePlayer::new();
        let err = add_and_play(
            &mut player,
            &TagPayload::Track("No Such Song".to_string()),
            true,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::Command(_)));
        assert!(!player.calls.iter().any(|c| c.starts_with("clear")
            || c.starts_with("add")
            || c.starts_with("play")));
    }

    #[tokio::test]
    async fn next_song_wraps_from_last_to_first_while_playing() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(2);
        player.state = PlaybackState::Play;

        next_song(&mut player).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "play 0");
    }

    #[tokio::test]
    async fn next_song_while_paused_seeks_without_starting_playback() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(0);
        player.state = PlaybackState::Pause;

        next_song(&mut player).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seek 1 0");
        assert_eq!(player.state, PlaybackState::Pause);
    }

    #[tokio::test]
    async fn previous_song_wraps_from_first_to_last() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(0);
        player.state = PlaybackState::Play;

        previous_song(&mut player).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seek 2 0");
    }

    #[tokio::test]
    async fn forward_seek_near_track_end_degrades_to_song_skip() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(0);
        player.state = PlaybackState::Play;
        player.duration = Some(Duration::from_secs(400));
        player.elapsed = Some(Duration::from_secs(310));

        seek_by(&mut player, 30).await.unwrap();
        // 310s of 400s is inside the final quarter: no seekcur
        assert!(!player.calls.iter().any(|c| c.starts_with("seekcur")));
        assert_eq!(player.calls.last().unwrap(), "next");
    }

    #[tokio::test]
    async fn forward_seek_mid_track_seeks_relative() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(0);
        player.state = PlaybackState::Play;
        player.duration = Some(Duration::from_secs(400));
        player.elapsed = Some(Duration::from_secs(100));

        seek_by(&mut player, 30).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seekcur +30");
    }

    #[tokio::test]
    async fn backward_seek_across_the_start_lands_on_zero() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.song = Some(1);
        player.state = PlaybackState::Play;
        player.duration = Some(Duration::from_secs(400));
        player.elapsed = Some(Duration::from_secs(10));

        seek_by(&mut player, -30).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seek 1 0");
    }

    #[tokio::test]
    async fn album_skip_finds_the_next_album_boundary() {
        let mut player = FakePlayer::new();
        player.playlist = vec![
            track("a1.ogg", "A1", "First", 0),
            track("a2.ogg", "A2", "First", 1),
            track("b1.ogg", "B1", "Second", 2),
        ];
        player.song = Some(0);
        player.state = PlaybackState::Play;

        next_album(&mut player).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seek 2 0");
    }

    #[tokio::test]
    async fn remove_album_deletes_back_to_front() {
        let mut player = FakePlayer::new();
        player.playlist = vec![
            track("a1.ogg", "A1", "First", 0),
            track("b1.ogg", "B1", "Second", 1),
            track("b2.ogg", "B2", "Second", 2),
            track("c1.ogg", "C1", "Third", 3),
        ];
        player.song = Some(1);
        player.state = PlaybackState::Play;

        remove_album(&mut player).await.unwrap();
        let deletes: Vec<&String> = player
            .calls
            .iter()
            .filter(|c| c.starts_with("delete"))
            .collect();
        assert_eq!(deletes, vec!["delete 2", "delete 1"]);
    }

    #[tokio::test]
    async fn bookmark_round_trip_resumes_at_position() {
        let mut player = FakePlayer::new();
        player.library = toxicity();
        player.playlist = toxicity();
        player.song = Some(2);
        player.state = PlaybackState::Play;
        player.elapsed = Some(Duration::from_secs(123));
        player.duration = Some(Duration::from_secs(210));

        let bookmark = save_bookmark(&mut player).await.unwrap();
        assert_eq!(bookmark.title, "Chop Suey");
        assert_eq!(bookmark.elapsed_seconds, 123);

        let mut player = FakePlayer::new();
        player.library = toxicity();
        recall_bookmark(&mut player, &bookmark, true).await.unwrap();
        assert_eq!(player.calls.last().unwrap(), "seek 0 123");
    }

    #[tokio::test]
    async fn toggle_pause_starts_a_stopped_player() {
        let mut player = FakePlayer::new();
        player.playlist = toxicity();
        player.state = PlaybackState::Stop;

        toggle_pause(&mut player).await.unwrap();
        assert_eq!(player.state, PlaybackState::Play);
    }

    #[tokio::test]
    async fn out_of_range_volume_is_rejected_locally() {
        let mut player = FakePlayer::new();
        let err = set_volume(&mut player, 130).await.unwrap_err();
        assert!(matches!(err, CoreError::Command(_)));
        assert!(player.calls.is_empty());
    }
}
