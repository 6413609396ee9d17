//! Radio Nova "c'était quoi ce titre" pages.
//!
//! The site serves a day's programme through its WordPress ajax endpoint,
//! which wants a nonce scraped from the public page first. Requests are
//! serialized and spaced out, and every page that came back is kept in the
//! page cache.

use std::{
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::ScrapeConfig,
    scrape::{PlaylistSource, RawTrack, error::FetchError, parse::parse_page, retry::with_backoff},
    storage::page_cache::PageCache,
};

const PLAYLIST_PAGE: &str = "/c-etait-quoi-ce-titre/";
const AJAX_ENDPOINT: &str = "/wp-admin/admin-ajax.php";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

static NONCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"ajax_nonce"\s*:\s*"([^"]+)""#).expect("valid nonce regex"));

struct State {
    pages: PageCache,
    nonce: Option<String>,
    last_request: Option<Instant>,
}

pub struct NovaSource {
    agent: ureq::Agent,
    config: ScrapeConfig,
    state: Mutex<State>,
}

impl NovaSource {
    pub fn new(config: ScrapeConfig, pages: PageCache) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            config,
            state: Mutex::new(State {
                pages,
                nonce: None,
                last_request: None,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Sleeps until the configured delay since the previous network request
    /// has passed.
    fn throttle(&self, state: &mut State) {
        if let Some(last) = state.last_request {
            let delay = self.config.request_delay();
            let elapsed = last.elapsed();
            if elapsed < delay {
                thread::sleep(delay - elapsed);
            }
        }
        state.last_request = Some(Instant::now());
    }

    fn nonce(&self, state: &mut State) -> Result<String, FetchError> {
        if let Some(nonce) = &state.nonce {
            return Ok(nonce.clone());
        }

        let url = self.url(PLAYLIST_PAGE);
        let body = with_backoff(&self.config.backoff_schedule(), |attempt| {
            self.throttle(state);
            log::debug!("fetching nonce from {url} (attempt {attempt})");
            let body = self
                .agent
                .get(&url)
                .set("Accept", "text/html,application/xhtml+xml")
                .set("Accept-Language", "fr-FR,fr;q=0.9")
                .call()?
                .into_string()?;
            Ok(body)
        })?;

        let nonce = extract_nonce(&body).ok_or(FetchError::Nonce(url))?;
        log::info!("got ajax nonce {nonce}");
        state.nonce = Some(nonce.clone());
        Ok(nonce)
    }

    fn download(&self, state: &mut State, date: NaiveDate, page: u32) -> Result<String, FetchError> {
        let nonce = self.nonce(state)?;
        let url = self.url(AJAX_ENDPOINT);
        let day = date.format("%Y-%m-%d").to_string();
        let page_str = page.to_string();
        let radio = self.config.radio_id.to_string();

        with_backoff(&self.config.backoff_schedule(), |attempt| {
            self.throttle(state);
            log::debug!("fetching {day} page {page} (attempt {attempt})");
            let body = self
                .agent
                .post(&url)
                .set("Accept", "*/*")
                .set("Accept-Language", "fr-FR,fr;q=0.9")
                .set("Origin", &self.url(""))
                .set("Referer", &self.url(PLAYLIST_PAGE))
                .set("X-Requested-With", "XMLHttpRequest")
                .send_form(&[
                    ("action", "loadmore_programs"),
                    ("afp_nonce", nonce.as_str()),
                    ("date", day.as_str()),
                    ("time", "23:59"),
                    ("page", page_str.as_str()),
                    ("radio", radio.as_str()),
                ])?
                .into_string()?;
            Ok(body)
        })
    }
}

impl PlaylistSource for NovaSource {
    fn fetch_raw_tracks(&self, date: NaiveDate, page: u32) -> Result<(Vec<RawTrack>, bool), FetchError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let body = match state.pages.get(date, page)? {
            Some(cached) => {
                log::debug!(
                    "{date} page {page} from cache ({})",
                    cached.fetched_at.format("%Y-%m-%d %H:%M")
                );
                cached.body
            }
            None => {
                let body = self.download(&mut state, date, page)?;
                state.pages.put(date, page, &body)?;
                body
            }
        };

        let tracks = parse_page(&body);
        let has_more = !tracks.is_empty();
        Ok((tracks, has_more))
    }
}

pub fn extract_nonce(html: &str) -> Option<String> {
    NONCE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
