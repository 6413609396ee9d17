//! Folds period playlists into wider ones (days into a month, months into
//! a year or into the all time chart).

use std::collections::{HashMap, hash_map::Entry};

use crate::{
    domain::{playlist::Playlist, scope::Scope, track::Track},
    search::cache::LookupCache,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Aggregator {
    /// keep only the most played tracks, `None` keeps everything
    pub top_n: Option<usize>,
}

impl Aggregator {
    pub fn new(top_n: Option<usize>) -> Self {
        Self { top_n }
    }

    /// Sums play counts by identity key over every playlist that belongs
    /// to `target`. Inputs already carry counts, so counts are added, not
    /// occurrences.
    ///
    /// The result is ordered by summed count, ties broken by key so the
    /// output (and any truncation) is the same from one run to the next.
    pub fn fold<'a, I>(&self, target: Scope, playlists: I) -> Playlist
    where
        I: IntoIterator<Item = &'a Playlist>,
    {
        let mut acc: HashMap<String, Track> = HashMap::new();

        for playlist in playlists {
            if !target.contains(&playlist.scope) {
                log::debug!(
                    "{} is not part of {}, skipping",
                    playlist.title(),
                    target.title()
                );
                continue;
            }
            for track in &playlist.tracks {
                match acc.entry(track.key()) {
                    Entry::Occupied(mut entry) => {
                        let seen = entry.get_mut();
                        seen.count = seen.count.saturating_add(track.count);
                        if seen.yt_music.is_none() {
                            seen.yt_music = track.yt_music.clone();
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(Track {
                            artist: track.artist.clone(),
                            title: track.title.clone(),
                            aired_at: None,
                            img_url: track.img_url.clone(),
                            store_url: track.store_url.clone(),
                            count: track.count,
                            yt_music: track.yt_music.clone(),
                        });
                    }
                }
            }
        }

        let mut ranked: Vec<(String, Track)> = acc.into_iter().collect();
        ranked.sort_by(|(key_a, a), (key_b, b)| b.count.cmp(&a.count).then_with(|| key_a.cmp(key_b)));
        if let Some(n) = self.top_n {
            ranked.truncate(n);
        }

        Playlist {
            scope: target,
            tracks: ranked.into_iter().map(|(_, track)| track).collect(),
        }
    }

    /// [`Aggregator::fold`] followed by a YouTube Music pass, since the
    /// copies may come from playlists that were never enriched.
    pub fn aggregate<'a, I>(&self, target: Scope, playlists: I, cache: &mut LookupCache) -> Playlist
    where
        I: IntoIterator<Item = &'a Playlist>,
    {
        let mut playlist = self.fold(target, playlists);
        playlist.populate_yt_ids(cache);
        playlist
    }
}
