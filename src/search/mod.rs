//! YouTube Music search: result types, the backend seam and the memoizing
//! lookup cache.

use serde::{Deserialize, Serialize};

use crate::search::error::SearchError;

pub mod cache;
pub mod error;
pub mod ytmusic;

/// Everything one search call returned. Stored verbatim in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub tracks: Vec<TrackItem>,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub duration_secs: u32,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

/// Artist credited on a track. `id` is empty when the result only had a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistItem {
    pub name: String,
    #[serde(default)]
    pub browse_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Free text search against the music service.
pub trait SearchBackend {
    fn search(&self, query: &str) -> Result<SearchResult, SearchError>;
}
