//! Client for the (undocumented) YouTube Music web search endpoint.

use std::time::Duration;

use serde_json::{Value, json};

use crate::{
    config::SearchConfig,
    search::{ArtistItem, ArtistRef, SearchBackend, SearchResult, Thumbnail, TrackItem, error::SearchError},
};

const ARTIST_PAGE: &str = "MUSIC_PAGE_TYPE_ARTIST";

pub struct YtMusicClient {
    agent: ureq::Agent,
    config: SearchConfig,
}

impl YtMusicClient {
    pub fn new(config: SearchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(config.timeout_secs))
            .timeout_write(Duration::from_secs(config.timeout_secs))
            .build();
        Self { agent, config }
    }

    fn request_body(&self, query: &str) -> Value {
        json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": self.config.client_version,
                    "hl": self.config.language,
                }
            },
            "query": query,
        })
    }
}

impl SearchBackend for YtMusicClient {
    fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        log::info!("ytmusic search for {query}");
        let response: Value = self
            .agent
            .post(&self.config.endpoint)
            .query("alt", "json")
            .set("Origin", "https://music.youtube.com")
            .set("Referer", "https://music.youtube.com/")
            .send_json(self.request_body(query))?
            .into_json()?;
        Ok(parse_search_response(&response))
    }
}

/// Pulls songs and artists out of a search response. Unknown shapes are
/// skipped rather than rejected, the layout changes often.
pub fn parse_search_response(response: &Value) -> SearchResult {
    let mut items = Vec::new();
    collect_list_items(response, &mut items);

    let mut result = SearchResult::default();
    for item in items {
        if let Some(track) = parse_track(item) {
            result.tracks.push(track);
        } else if let Some(artist) = parse_artist(item) {
            result.artists.push(artist);
        }
    }
    result
}

fn collect_list_items<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == "musicResponsiveListItemRenderer" {
                    out.push(v);
                } else {
                    collect_list_items(v, out);
                }
            }
        }
        Value::Array(values) => {
            for v in values {
                collect_list_items(v, out);
            }
        }
        _ => {}
    }
}

fn column_runs(item: &Value, column: usize) -> &[Value] {
    item.pointer(&format!(
        "/flexColumns/{column}/musicResponsiveListItemFlexColumnRenderer/text/runs"
    ))
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn run_text(run: &Value) -> Option<&str> {
    run.get("text").and_then(Value::as_str)
}

fn run_browse_id(run: &Value) -> Option<&str> {
    run.pointer("/navigationEndpoint/browseEndpoint/browseId")
        .and_then(Value::as_str)
}

fn parse_track(item: &Value) -> Option<TrackItem> {
    let video_id = item
        .pointer("/playlistItemData/videoId")
        .or_else(|| {
            item.pointer("/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId")
        })
        .and_then(Value::as_str)?;
    let title = column_runs(item, 0).first().and_then(run_text)?;

    let details = column_runs(item, 1);
    let artists = details
        .iter()
        .filter_map(|run| {
            let id = run_browse_id(run)?;
            id.starts_with("UC").then(|| ArtistRef {
                name: run_text(run).unwrap_or_default().to_string(),
                id: id.to_string(),
            })
        })
        .collect();
    let duration_secs = details
        .iter()
        .filter_map(run_text)
        .find_map(parse_duration)
        .unwrap_or(0);

    Some(TrackItem {
        video_id: video_id.to_string(),
        title: title.to_string(),
        artists,
        duration_secs,
        thumbnails: parse_thumbnails(item),
    })
}

fn parse_artist(item: &Value) -> Option<ArtistItem> {
    let endpoint = item.pointer("/navigationEndpoint/browseEndpoint")?;
    let page_type = endpoint
        .pointer("/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType")
        .and_then(Value::as_str)?;
    if page_type != ARTIST_PAGE {
        return None;
    }
    let browse_id = endpoint.get("browseId").and_then(Value::as_str)?;
    let name = column_runs(item, 0).first().and_then(run_text)?;
    Some(ArtistItem {
        name: name.to_string(),
        browse_id: browse_id.to_string(),
    })
}

fn parse_thumbnails(item: &Value) -> Vec<Thumbnail> {
    item.pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(|t| serde_json::from_value(t.clone()).ok())
        .unwrap_or_default()
}

/// `"3:45"` or `"1:02:03"` to seconds.
pub fn parse_duration(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    parts.iter().try_fold(0u32, |acc, part| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        acc.checked_mul(60)?.checked_add(part.parse::<u32>().ok()?)
    })
}
