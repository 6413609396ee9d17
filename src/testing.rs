//! In-memory stand-ins for the network collaborators.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

use chrono::NaiveDate;

use crate::{
    scrape::{PlaylistSource, RawTrack, error::FetchError},
    search::{SearchBackend, SearchResult, TrackItem, error::SearchError},
};

pub fn track_item(video_id: &str, title: &str) -> TrackItem {
    TrackItem {
        video_id: video_id.to_string(),
        title: title.to_string(),
        artists: Vec::new(),
        duration_secs: 0,
        thumbnails: Vec::new(),
    }
}

pub fn raw(artist: &str, title: &str, time: &str) -> RawTrack {
    RawTrack {
        artist: artist.to_string(),
        title: title.to_string(),
        time: time.to_string(),
        ..RawTrack::default()
    }
}

/// Answers from a fixed table, unknown queries get an empty result.
#[derive(Default)]
pub struct FakeSearch {
    results: HashMap<String, SearchResult>,
    failing: HashSet<String>,
    calls: Rc<Cell<usize>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(self, query: &str, video_id: &str, title: &str) -> Self {
        self.with_result(
            query,
            SearchResult {
                tracks: vec![track_item(video_id, title)],
                artists: Vec::new(),
            },
        )
    }

    pub fn with_result(mut self, query: &str, result: SearchResult) -> Self {
        self.results.insert(query.to_string(), result);
        self
    }

    pub fn with_failure(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    /// Shared counter, still readable once the fake is boxed into a cache.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl SearchBackend for FakeSearch {
    fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.contains(query) {
            return Err(SearchError::Io(std::io::Error::other("connection reset")));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Serves pre-baked pages per day; a day it knows nothing about is empty.
#[derive(Default)]
pub struct FakeSource {
    days: HashMap<NaiveDate, Vec<Vec<RawTrack>>>,
    failing: HashSet<NaiveDate>,
    requests: RefCell<Vec<(NaiveDate, u32)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, date: NaiveDate, pages: Vec<Vec<RawTrack>>) -> Self {
        self.days.insert(date, pages);
        self
    }

    pub fn failing_on(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }

    pub fn requests(&self) -> Vec<(NaiveDate, u32)> {
        self.requests.borrow().clone()
    }
}

impl PlaylistSource for FakeSource {
    fn fetch_raw_tracks(&self, date: NaiveDate, page: u32) -> Result<(Vec<RawTrack>, bool), FetchError> {
        self.requests.borrow_mut().push((date, page));
        if self.failing.contains(&date) {
            return Err(FetchError::Exhausted {
                attempts: 5,
                last: "503 Service Unavailable".to_string(),
            });
        }
        let tracks = self
            .days
            .get(&date)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default();
        let has_more = !tracks.is_empty();
        Ok((tracks, has_more))
    }
}
