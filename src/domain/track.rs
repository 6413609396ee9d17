use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{
    domain::normalize::titles_match,
    search::{TrackItem, cache::LookupCache},
};

/// One song as aired on the radio.
///
/// `artist` and `title` are normalized once at ingestion, the identity of a
/// track is the plain concatenation of both (see [`Track::key`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub aired_at: Option<NaiveTime>,
    #[serde(default)]
    pub img_url: String,
    /// Spotify link scraped along with the track
    #[serde(default)]
    pub store_url: String,
    pub count: u32,
    #[serde(default)]
    pub yt_music: Option<TrackItem>,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            aired_at: None,
            img_url: String::new(),
            store_url: String::new(),
            count: 1,
            yt_music: None,
        }
    }

    pub fn key(&self) -> String {
        format!("{}|{}", self.artist, self.title)
    }

    pub fn search_query(&self) -> String {
        format!("{} by {}", self.title, self.artist)
    }

    pub fn is_enriched(&self) -> bool {
        self.yt_music.is_some()
    }

    /// Fills the YouTube Music slot if it is empty. Returns whether the
    /// track ends up enriched. A failed lookup leaves the slot empty so a
    /// later run can try again.
    pub fn enrich(&mut self, cache: &mut LookupCache) -> bool {
        if self.yt_music.is_some() {
            return true;
        }
        match cache.track_info(&self.search_query()) {
            Ok(item) => {
                if !titles_match(&self.title, &item.title) {
                    log::warn!(
                        "we might have a bad match for {} by {}: got \"{}\"",
                        self.title,
                        self.artist,
                        item.title
                    );
                }
                self.yt_music = Some(item);
                true
            }
            Err(err) => {
                log::warn!("no YouTube Music info for {} by {}: {err}", self.title, self.artist);
                false
            }
        }
    }

    pub fn yt_music_url(&self) -> Option<String> {
        self.yt_music
            .as_ref()
            .map(|info| format!("https://music.youtube.com/watch?v={}", info.video_id))
    }

    /// Largest thumbnail of the match, or the scraped artwork.
    pub fn thumb_url(&self) -> &str {
        self.yt_music
            .as_ref()
            .and_then(|info| info.thumbnails.last())
            .map(|thumb| thumb.url.as_str())
            .unwrap_or(self.img_url.as_str())
    }

    pub fn yt_duration(&self) -> Option<String> {
        let secs = self.yt_music.as_ref()?.duration_secs;
        if secs == 0 {
            return None;
        }
        Some(format!("{}:{:02}", secs / 60, secs % 60))
    }

    /// Channel page of the first credited artist. Falls back to an artist
    /// search when the match carries no artist id.
    pub fn primary_artist_url(&self, cache: &mut LookupCache) -> Option<String> {
        let info = self.yt_music.as_ref()?;
        if let Some(artist) = info.artists.iter().find(|a| !a.id.is_empty()) {
            return Some(channel_url(&artist.id));
        }
        match cache.artist_info(&self.artist) {
            Ok(artist) => {
                log::debug!("found artist {} for {}", artist.name, self.artist);
                Some(channel_url(&artist.browse_id))
            }
            Err(err) => {
                log::debug!("no artist page for {}: {err}", self.artist);
                None
            }
        }
    }
}

fn channel_url(id: &str) -> String {
    format!("https://music.youtube.com/channel/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        search::{ArtistItem, ArtistRef, SearchResult, Thumbnail},
        testing::{FakeSearch, track_item},
    };

    #[test]
    fn key_is_artist_pipe_title() {
        let track = Track::new("daft punk", "one more time");
        assert_eq!(track.key(), "daft punk|one more time");
    }

    #[test]
    fn key_ignores_count_and_enrichment() {
        let mut track = Track::new("daft punk", "one more time");
        let before = track.key();
        track.count = 42;
        track.yt_music = Some(track_item("abc", "One More Time"));
        assert_eq!(track.key(), before);
        assert_eq!(track.key(), track.key());
    }

    #[test]
    fn enrich_fills_empty_slot_once() {
        let search = FakeSearch::new().with_track("one more time by daft punk", "vid1", "One More Time");
        let calls = search.calls();
        let mut cache = LookupCache::in_memory(Box::new(search));

        let mut track = Track::new("daft punk", "one more time");
        assert!(track.enrich(&mut cache));
        assert_eq!(track.yt_music.as_ref().unwrap().video_id, "vid1");

        // already enriched: no lookup at all
        assert!(track.enrich(&mut cache));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn enrich_never_overwrites() {
        let search = FakeSearch::new().with_track("x by y", "new", "x");
        let mut cache = LookupCache::in_memory(Box::new(search));

        let mut track = Track::new("y", "x");
        track.yt_music = Some(track_item("old", "x"));
        track.enrich(&mut cache);
        assert_eq!(track.yt_music.unwrap().video_id, "old");
    }

    #[test]
    fn enrich_failure_leaves_slot_empty() {
        let mut cache = LookupCache::in_memory(Box::new(FakeSearch::new()));
        let mut track = Track::new("nobody", "nothing");
        assert!(!track.enrich(&mut cache));
        assert!(track.yt_music.is_none());
    }

    #[test]
    fn read_surface() {
        let mut track = Track::new("a", "b");
        track.img_url = "http://img/nova.jpg".into();
        assert_eq!(track.thumb_url(), "http://img/nova.jpg");
        assert_eq!(track.yt_music_url(), None);
        assert_eq!(track.yt_duration(), None);

        let mut item = track_item("vid", "b");
        item.duration_secs = 225;
        item.thumbnails = vec![
            Thumbnail {
                url: "small".into(),
                width: 60,
                height: 60,
            },
            Thumbnail {
                url: "large".into(),
                width: 120,
                height: 120,
            },
        ];
        track.yt_music = Some(item);
        assert_eq!(track.thumb_url(), "large");
        assert_eq!(
            track.yt_music_url().as_deref(),
            Some("https://music.youtube.com/watch?v=vid")
        );
        assert_eq!(track.yt_duration().as_deref(), Some("3:45"));
    }

    #[test]
    fn primary_artist_url_prefers_match_then_search() {
        let search = FakeSearch::new().with_result(
            "a",
            SearchResult {
                tracks: vec![],
                artists: vec![ArtistItem {
                    name: "A".into(),
                    browse_id: "UCsearched".into(),
                }],
            },
        );
        let mut cache = LookupCache::in_memory(Box::new(search));

        let mut track = Track::new("a", "b");
        assert_eq!(track.primary_artist_url(&mut cache), None);

        track.yt_music = Some(track_item("vid", "b"));
        assert_eq!(
            track.primary_artist_url(&mut cache).as_deref(),
            Some("https://music.youtube.com/channel/UCsearched")
        );

        let mut item = track_item("vid", "b");
        item.artists = vec![ArtistRef {
            name: "A".into(),
            id: "UCdirect".into(),
        }];
        track.yt_music = Some(item);
        assert_eq!(
            track.primary_artist_url(&mut cache).as_deref(),
            Some("https://music.youtube.com/channel/UCdirect")
        );
    }
}
