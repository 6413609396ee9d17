//! Memoizing front of the search backend.
//!
//! A query that produced a match is sent to the backend at most once for the
//! lifetime of the snapshot file, and its full result set is kept. A query
//! without a usable match is not stored, so a later call may search again.

use std::{
    collections::BTreeMap,
    fs,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    search::{ArtistItem, SearchBackend, SearchResult, TrackItem, error::SearchError},
    storage::error::StorageError,
};

const SNAPSHOT_VERSION: u32 = 1;

/// Splits "artist a and artist b" / "a & b" into single artists.
static CONJUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\band\b|&").expect("valid conjunction regex"));

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    matches: BTreeMap<String, SearchResult>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    matches: &'a BTreeMap<String, SearchResult>,
}

pub struct LookupCache {
    matches: BTreeMap<String, SearchResult>,
    backend: Box<dyn SearchBackend>,
    path: Option<PathBuf>,
    dirty: bool,
    calls: usize,
}

impl LookupCache {
    /// Opens the snapshot at `path`, starting empty when there is none yet.
    /// A snapshot that exists but cannot be decoded is an error: silently
    /// starting over would re-run every search.
    pub fn load(path: impl Into<PathBuf>, backend: Box<dyn SearchBackend>) -> Result<Self, StorageError> {
        let path = path.into();
        let matches = if path.is_file() {
            read_snapshot(&path)?
        } else {
            log::info!(
                "no lookup cache at {}, starting empty",
                path.to_string_lossy()
            );
            BTreeMap::new()
        };
        log::info!("lookup cache has {} queries", matches.len());

        Ok(Self {
            matches,
            backend,
            path: Some(path),
            dirty: false,
            calls: 0,
        })
    }

    /// Cache that is never written anywhere.
    pub fn in_memory(backend: Box<dyn SearchBackend>) -> Self {
        Self {
            matches: BTreeMap::new(),
            backend,
            path: None,
            dirty: false,
            calls: 0,
        }
    }

    /// Best track match for `query`.
    pub fn track_info(&mut self, query: &str) -> Result<TrackItem, SearchError> {
        self.resolve(query, has_track)?
            .tracks
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::NotFound(query.to_string()))
    }

    /// Best artist match for `query`. When the query names several artists
    /// ("x and y", "x & y") and has no match of its own, each of them is
    /// tried in turn and the first hit wins.
    pub fn artist_info(&mut self, query: &str) -> Result<ArtistItem, SearchError> {
        let result = self.resolve(query, has_artist)?;
        if let Some(artist) = result.artists.into_iter().find(|a| !a.browse_id.is_empty()) {
            return Ok(artist);
        }

        let lowered = query.to_lowercase();
        if CONJUNCTION.is_match(&lowered) {
            let segments: Vec<String> = CONJUNCTION
                .split(&lowered)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            for segment in segments {
                match self.artist_info(&segment) {
                    Ok(artist) => return Ok(artist),
                    Err(err) if err.is_not_found() => continue,
                    Err(err) => return Err(err),
                }
            }
        }

        Err(SearchError::NotFound(query.to_string()))
    }

    /// Result set of `query`, from the cache or from one backend call. A
    /// fresh result is only stored when `usable` accepts it.
    fn resolve(
        &mut self,
        query: &str,
        usable: fn(&SearchResult) -> bool,
    ) -> Result<SearchResult, SearchError> {
        if let Some(hit) = self.matches.get(query) {
            return Ok(hit.clone());
        }

        self.calls += 1;
        let result = self.backend.search(query)?;
        log::debug!(
            "{query}: {} tracks, {} artists",
            result.tracks.len(),
            result.artists.len()
        );
        if usable(&result) {
            self.matches.insert(query.to_string(), result.clone());
            self.dirty = true;
        }
        Ok(result)
    }

    /// Writes the snapshot if anything was added since the last save.
    pub fn save(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            write_snapshot(path, &self.matches)?;
            log::info!(
                "saved {} lookups to {}",
                self.matches.len(),
                path.to_string_lossy()
            );
        }
        self.dirty = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Backend calls made by this instance.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Stored queries without any track, kept for their artists only.
    pub fn misses(&self) -> usize {
        self.matches.values().filter(|r| r.tracks.is_empty()).count()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn has_track(result: &SearchResult) -> bool {
    !result.tracks.is_empty()
}

fn has_artist(result: &SearchResult) -> bool {
    result.artists.iter().any(|a| !a.browse_id.is_empty())
}

impl Drop for LookupCache {
    fn drop(&mut self) {
        if let Err(err) = self.save() {
            log::error!("failed to save lookup cache: {err}");
        }
    }
}

fn read_snapshot(path: &Path) -> Result<BTreeMap<String, SearchResult>, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(GzDecoder::new(file));
    let snapshot: Snapshot =
        serde_json::from_reader(reader).map_err(|source| StorageError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    if snapshot.version != SNAPSHOT_VERSION {
        log::warn!(
            "lookup cache {} has version {}, expected {SNAPSHOT_VERSION}",
            path.to_string_lossy(),
            snapshot.version
        );
    }
    Ok(snapshot.matches)
}

fn write_snapshot(path: &Path, matches: &BTreeMap<String, SearchResult>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        matches,
    })?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let bytes = encoder.finish()?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
