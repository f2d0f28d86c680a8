//! Bookmark persistence
//!
//! A single JSON record {title, album, elapsed_seconds} that lets a
//! specific track be resumed later. Written at bookmark time and on
//! shutdown, read on recall.

use juke_core::{Bookmark, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BookmarkStore {
    path: PathBuf,
}

impl BookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the bookmark, if one was ever written.
    pub fn load(&self) -> Result<Option<Bookmark>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the bookmark.
    pub fn save(&self, bookmark: &Bookmark) -> Result<()> {
        debug!(title = %bookmark.title, elapsed = bookmark.elapsed_seconds, "saving bookmark");
        let raw = serde_json::to_string_pretty(bookmark)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_bookmark_is_none() {
        let dir = tempdir().unwrap();
        let store = BookmarkStore::new(dir.path().join("bookmark.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn bookmark_round_trips() {
        let dir = tempdir().unwrap();
        let store = BookmarkStore::new(dir.path().join("bookmark.json"));

        let bookmark = Bookmark {
            title: "Chop Suey".to_string(),
            album: Some("Toxicity".to_string()),
            elapsed_seconds: 123,
        };
        store.save(&bookmark).unwrap();
        assert_eq!(store.load().unwrap(), Some(bookmark));
    }
}
