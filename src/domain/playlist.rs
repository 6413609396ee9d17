use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{scope::Scope, track::Track},
    search::cache::LookupCache,
};

/// Ordered, deduplicated tracks of one period.
///
/// Identity keys are unique within a playlist; the merge in
/// [`Playlist::add_tracks`] is what keeps them so.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub scope: Scope,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Outcome of [`Playlist::populate_yt_ids`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichReport {
    pub resolved: usize,
    pub missing: usize,
}

impl Playlist {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            tracks: Vec::new(),
        }
    }

    /// Merges raw occurrences: a track already in the playlist gets its
    /// count bumped by one, a new one is appended with a count of one.
    pub fn add_tracks<I: IntoIterator<Item = Track>>(&mut self, tracks: I) {
        for mut incoming in tracks {
            let key = incoming.key();
            match self.tracks.iter_mut().find(|t| t.key() == key) {
                Some(existing) => existing.count = existing.count.saturating_add(1),
                None => {
                    incoming.count = 1;
                    self.tracks.push(incoming);
                }
            }
        }
    }

    /// Most played first. Order among equal counts is not specified.
    pub fn sort(&mut self) {
        self.tracks.sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Looks up every track that has no YouTube Music info yet.
    /// Individual failures are logged by [`Track::enrich`] and skipped.
    pub fn populate_yt_ids(&mut self, cache: &mut LookupCache) -> EnrichReport {
        let mut report = EnrichReport::default();
        for track in &mut self.tracks {
            if track.enrich(cache) {
                report.resolved += 1;
            } else {
                report.missing += 1;
            }
        }
        log::info!(
            "{}: {} tracks with YouTube Music info, {} without",
            self.title(),
            report.resolved,
            report.missing
        );
        report
    }

    pub fn truncate(&mut self, len: usize) {
        self.tracks.truncate(len);
    }

    /// Rank (0 based) of the track with the given identity key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.key() == key)
    }

    pub fn title(&self) -> String {
        self.scope.title()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn total_plays(&self) -> u64 {
        self.tracks.iter().map(|t| u64::from(t.count)).sum()
    }
}

impl Display for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Playlist: {}", self.title())?;
        for track in &self.tracks {
            match track.aired_at {
                Some(at) => writeln!(f, "{} : {} @ {}", track.artist, track.title, at.format("%H:%M"))?,
                None => writeln!(f, "{} : {} [{}]", track.artist, track.title, track.count)?,
            }
        }
        Ok(())
    }
}
