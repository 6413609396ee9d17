//! Playlists on disk, one JSON document per period.
//!
//! File names are derived from the scope only, so the presence of a file
//! is what tells a later run that the period was already built.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Datelike;
use walkdir::WalkDir;

use crate::{
    domain::{playlist::Playlist, scope::Scope},
    storage::error::StorageError,
};

const PREFIX: &str = "playlist-";
const EXTENSION: &str = "json";

pub struct PlaylistStore {
    root: PathBuf,
}

impl PlaylistStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Day playlists go under `YYYY/MM/`, everything else sits at the root.
    pub fn path_for(&self, scope: &Scope) -> PathBuf {
        let file = format!("{PREFIX}{}.{EXTENSION}", scope.slug());
        match scope {
            Scope::Day { date } => self
                .root
                .join(format!("{:04}", date.year()))
                .join(format!("{:02}", date.month()))
                .join(file),
            _ => self.root.join(file),
        }
    }

    pub fn exists(&self, scope: &Scope) -> bool {
        self.path_for(scope).is_file()
    }

    /// Writes the playlist next to a temporary file first so an interrupted
    /// run never leaves a half written marker behind.
    pub fn save(&self, playlist: &Playlist) -> Result<PathBuf, StorageError> {
        let path = self.path_for(&playlist.scope);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(playlist)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        log::debug!("saved {} to {}", playlist.title(), path.to_string_lossy());
        Ok(path)
    }

    pub fn load(&self, scope: &Scope) -> Result<Playlist, StorageError> {
        let path = self.path_for(scope);
        if !path.is_file() {
            return Err(StorageError::NotFound(path));
        }
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> Result<Playlist, StorageError> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every playlist file directly under the root. Unreadable files are
    /// logged and skipped.
    pub fn load_all(&self) -> Result<Vec<Playlist>, StorageError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| match e {
                Ok(e) => Some(e),
                Err(err) => {
                    log::warn!(
                        "error while listing {}, skipping an entry: {err}",
                        self.root.to_string_lossy()
                    );
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_playlist_file(p))
            .collect();
        files.sort();

        Ok(files
            .iter()
            .filter_map(|path| match Self::load_file(path) {
                Ok(playlist) => Some(playlist),
                Err(err) => {
                    log::warn!("skipping {}: {err}", path.to_string_lossy());
                    None
                }
            })
            .collect())
    }

    pub fn load_months(&self) -> Result<Vec<Playlist>, StorageError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|p| matches!(p.scope, Scope::Month { .. }))
            .collect())
    }
}

fn is_playlist_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PREFIX));
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == EXTENSION);
    name_ok && ext_ok
}
