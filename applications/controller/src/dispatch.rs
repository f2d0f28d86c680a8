//! Gesture dispatch
//!
//! Maps a committed button gesture onto one playback command, cancels
//! any running progress animation before commands that move the play
//! position, and turns failures into a red feedback flash.

use crate::context::AppContext;
use crate::playback;
use juke_core::{Color, CoreError, Result};
use juke_input::{ButtonId, Gesture, GestureKind};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextSong,
    PreviousSong,
    SeekForward,
    SeekBackward,
    NextAlbum,
    PreviousAlbum,
    SaveBookmark,
    RecallBookmark,
    RemoveSong,
    RemoveAlbum,
    ClearPlaylist,
}

/// The full gesture table.
pub fn command_for(button: ButtonId, kind: GestureKind) -> Command {
    match (button, kind) {
        (ButtonId::Forward, GestureKind::Single) => Command::NextSong,
        (ButtonId::Forward, GestureKind::Double) => Command::SeekForward,
        (ButtonId::Forward, GestureKind::Hold { after_press: false }) => Command::NextAlbum,
        (ButtonId::Forward, GestureKind::Hold { after_press: true }) => Command::RecallBookmark,
        (ButtonId::Backward, GestureKind::Single) => Command::PreviousSong,
        (ButtonId::Backward, GestureKind::Double) => Command::SeekBackward,
        (ButtonId::Backward, GestureKind::Hold { after_press: false }) => Command::PreviousAlbum,
        (ButtonId::Backward, GestureKind::Hold { after_press: true }) => Command::SaveBookmark,
        (ButtonId::Playlist, GestureKind::Single) => Command::RemoveSong,
        (ButtonId::Playlist, GestureKind::Double) => Command::RemoveAlbum,
        (ButtonId::Playlist, GestureKind::Hold { .. }) => Command::ClearPlaylist,
    }
}

impl Command {
    /// Commands that invalidate a running progress animation.
    pub fn affects_position(self) -> bool {
        !matches!(self, Command::SaveBookmark)
    }
}

/// Run one gesture end to end: cancel, execute, feed back.
pub async fn execute(ctx: &AppContext, gesture: Gesture) {
    let command = command_for(gesture.button, gesture.kind);
    info!(button = ?gesture.button, kind = ?gesture.kind, ?command, "dispatching gesture");

    if command.affects_position() {
        ctx.coordinator.cancel_active().await;
    }

    match run_command(ctx, command).await {
        Ok(()) => ctx.request_refresh(),
        Err(e) => {
            warn!(%e, ?command, "command failed");
            ctx.flash_and_restore(Color::RED).await;
        }
    }
}

async fn run_command(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::SaveBookmark => {
            let bookmark = {
                let mut player = ctx.player.lock().await;
                playback::save_bookmark(player.as_mut()).await?
            };
            ctx.bookmarks.save(&bookmark)?;
            ctx.flash_ok().await;
            Ok(())
        }
        Command::RecallBookmark => {
            let Some(bookmark) = ctx.bookmarks.load()? else {
                return Err(CoreError::Command("no bookmark saved".into()));
            };
            let clr_plist = ctx.config.lock().await.clr_plist;
            let mut player = ctx.player.lock().await;
            playback::recall_bookmark(player.as_mut(), &bookmark, clr_plist).await
        }
        _ => {
            let mut player = ctx.player.lock().await;
            let player = player.as_mut();
            match command {
                Command::NextSong => playback::next_song(player).await,
                Command::PreviousSong => playback::previous_song(player).await,
                Command::SeekForward => playback::seek_by(player, ctx.seek_step).await,
                Command::SeekBackward => playback::seek_by(player, -ctx.seek_step).await,
                Command::NextAlbum => playback::next_album(player).await,
                Command::PreviousAlbum => playback::previous_album(player).await,
                Command::RemoveSong => playback::remove_song(player).await,
                Command::RemoveAlbum => playback::remove_album(player).await,
                Command::ClearPlaylist => playback::clear_playlist(player).await,
                Command::SaveBookmark | Command::RecallBookmark => unreachable!(),
            }
        }
    }
}
