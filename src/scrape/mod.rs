//! Getting aired tracks out of the radio's website.

use chrono::{NaiveDate, NaiveTime};

use crate::{
    domain::{
        normalize::{normalize_artist, normalize_title},
        track::Track,
    },
    scrape::error::FetchError,
};

pub mod error;
pub mod nova;
pub mod parse;
pub mod retry;

/// A track as found on the page, nothing normalized yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrack {
    pub artist: String,
    pub title: String,
    /// `HH:MM`, empty when the page had none
    pub time: String,
    pub img_url: String,
    pub store_url: String,
}

impl RawTrack {
    pub fn into_track(self) -> Track {
        let mut track = Track::new(normalize_artist(&self.artist), normalize_title(&self.title));
        track.aired_at = parse_time(&self.time);
        track.img_url = self.img_url;
        track.store_url = self.store_url;
        track
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match NaiveTime::parse_from_str(text, "%H:%M") {
        Ok(time) => Some(time),
        Err(err) => {
            log::debug!("ignoring air time {text:?}: {err}");
            None
        }
    }
}

/// Where the aired tracks of a day come from, one page at a time.
pub trait PlaylistSource {
    /// Tracks on `page` (1 based) of `date`, and whether asking for the
    /// next page makes sense.
    fn fetch_raw_tracks(&self, date: NaiveDate, page: u32) -> Result<(Vec<RawTrack>, bool), FetchError>;
}

/// Every track aired on `date`: pages are read from 1 until one comes back
/// empty, or `max_pages` is reached.
pub fn fetch_day(
    source: &dyn PlaylistSource,
    date: NaiveDate,
    max_pages: u32,
) -> Result<Vec<RawTrack>, FetchError> {
    let mut tracks = Vec::new();
    for page in 1..=max_pages {
        let (found, has_more) = source.fetch_raw_tracks(date, page)?;
        log::info!("{date} page {page}: {} items", found.len());
        tracks.extend(found);
        if !has_more {
            break;
        }
    }
    Ok(tracks)
}
