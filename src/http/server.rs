use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::{
    config::HttpConfig,
    domain::{playlist::Playlist, scope::Scope},
    http::error::ApiError,
    storage::{error::StorageError, playlists::PlaylistStore},
};

const INDEX_FILE: &str = "index.html";

/// Local preview of the rendered site, plus the saved charts as JSON.
pub struct HttpServer {
    web_dir: PathBuf,
    store: PlaylistStore,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(web_dir: impl Into<PathBuf>, store: PlaylistStore, config: HttpConfig) -> Self {
        Self {
            web_dir: web_dir.into(),
            store,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        info!(
            "serving {} on http://{addr}/",
            self.web_dir.to_string_lossy()
        );
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/api/playlists) => {
                self.handle_list_playlists()
            },
            (GET) (/api/playlists/{slug: String}) => {
                self.handle_get_playlist(&slug)
            },
            _ => {
                if request.method() == "GET" {
                    self.handle_static(&request.url())
                } else {
                    Response::empty_404()
                }
            }
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn handle_list_playlists(&self) -> Response {
        match self.store.load_all() {
            Ok(playlists) => {
                let mut summaries: Vec<PlaylistSummary> =
                    playlists.iter().map(PlaylistSummary::from_domain).collect();
                summaries.sort_by(|a, b| a.slug.cmp(&b.slug));
                Response::json(&summaries)
            }
            Err(e) => ApiError::from(e).into_response(),
        }
    }

    fn get_playlist(&self, slug: &str) -> Result<Playlist, ApiError> {
        if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ApiError::BadRequest(format!("invalid playlist slug: {slug}")));
        }
        let playlists = self.store.load_all()?;
        playlists
            .into_iter()
            .find(|p| p.scope.slug() == slug)
            .ok_or_else(|| ApiError::NotFound(format!("playlist {slug} not found")))
    }

    fn handle_get_playlist(&self, slug: &str) -> Response {
        match self.get_playlist(slug) {
            Ok(playlist) => Response::json(&playlist),
            Err(e) => e.into_response(),
        }
    }

    fn handle_static(&self, url: &str) -> Response {
        match self.static_file(url) {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    /// returns Response with ok status, or ApiError
    fn static_file(&self, url: &str) -> Result<Response, ApiError> {
        let relative = safe_relative_path(url)
            .ok_or_else(|| ApiError::NotFound(format!("{url} not found")))?;
        let mut path = self.web_dir.join(relative);
        if path.is_dir() {
            path.push(INDEX_FILE);
        }
        if !path.is_file() {
            return Err(StorageError::NotFound(path).into());
        }

        let mime = mime_guess::from_path(&path).first_or_octet_stream().to_string();
        let file = std::fs::File::open(&path).map_err(StorageError::Fs)?;
        log::debug!(
            "STATIC {} -> 200 OK, path: {}, MIME type: {}",
            url,
            path.to_string_lossy(),
            mime
        );
        Ok(Response::from_file(mime, file))
    }
}

/// Maps a url path onto a path below the web root. Anything that could
/// step outside of it (`..`, absolute or prefixed components) is refused.
fn safe_relative_path(url: &str) -> Option<PathBuf> {
    let trimmed = url.trim_start_matches('/');
    let mut out = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

#[derive(Serialize, Deserialize)]
struct PlaylistSummary {
    slug: String,
    title: String,
    scope: Scope,
    tracks: usize,
    plays: u64,
}

impl PlaylistSummary {
    fn from_domain(playlist: &Playlist) -> Self {
        Self {
            slug: playlist.scope.slug(),
            title: playlist.title(),
            scope: playlist.scope.clone(),
            tracks: playlist.len(),
            plays: playlist.total_plays(),
        }
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::Track;

    use rouille::Request;
    use std::{fs, io::Read};
    use tempfile::{TempDir, tempdir};

    pub fn parse_text_response(response: rouille::Response) -> String {
        let mut buf = String::new();
        let mut reader = response.data.into_reader_and_size().0;
        reader.read_to_string(&mut buf).unwrap();
        buf
    }

    fn create_server(tmp: &TempDir) -> HttpServer {
        let web = tmp.path().join("web");
        fs::create_dir_all(web.join("images")).unwrap();
        fs::write(web.join("index.html"), "<h1>Radio Nova - Playlists</h1>").unwrap();
        fs::write(web.join("January-2024.html"), "<h1>Radio Nova January 2024</h1>").unwrap();
        fs::write(web.join("images").join("spotify.svg"), "<svg/>").unwrap();
        fs::write(tmp.path().join("secret.txt"), "top secret").unwrap();

        let store = PlaylistStore::new(tmp.path().join("data"));
        let mut playlist = Playlist::new(Scope::month(2024, 1));
        playlist.add_tracks(vec![Track::new("air", "sexy boy"), Track::new("air", "sexy boy")]);
        store.save(&playlist).unwrap();

        HttpServer::new(
            web,
            store,
            HttpConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 8080,
            },
        )
    }

    fn get(server: &HttpServer, url: &str) -> Response {
        let request = Request::fake_http("GET", url, vec![], vec![]);
        server.handle_request(&request)
    }

    #[test]
    fn test_root_serves_index() {
        let tmp = tempdir().unwrap();
        let server = create_server(&tmp);

        let response = get(&server, "/");
        assert_eq!(response.status_code, 200);
        assert!(parse_text_response(response).contains("Radio Nova - Playlists"));
    }

    #[test]
    fn test_page_and_asset_with_mime() {
        let tmp = tempdir().unwrap();
        let server = create_server(&tmp);

        let response = get(&server, "/January-2024.html");
        assert_eq!(response.status_code, 200);
        let content_type = response
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("Content-Type"))
            .map(|(_, v)| v.to_string())
            .unwrap();
        assert!(content_type.starts_with("text/html"));

        let response = get(&server, "/images/spotify.svg");
        assert_eq!(response.status_code, 200);
        assert_eq!(parse_text_response(response), "<svg/>");
    }

    #[test]
    fn test_missing_file_is_404() {
        let tmp = tempdir().unwrap();
        let server = create_server(&tmp);
        assert_eq!(get(&server, "/February-2024.html").status_code, 404);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let tmp = tempdir().unwrap();
        let server = create_server(&tmp);

        assert_eq!(get(&server, "/../secret.txt").status_code, 404);
        assert_eq!(get(&server, "/images/../../secret.txt").status_code, 404);
        assert_eq!(safe_relative_path("/a/../b"), None);
        assert_eq!(safe_relative_path("/a/./b"), Some(PathBuf::from("a/b")));
    }

    #[test]
    fn test_non_get_is_404() {
        let tmp = tempdir().unwrap();
        let server = create_server(&tmp);
        let request = Request::fake_http("POST", "/index.html", vec![], vec![]);
        assert_eq!(server.handle_request(&request).status_code, 404);
    }

    #[test]
    fn test_api_lists_and_gets_playlists() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let server = create_server(&tmp);

        let response = get(&server, "/api/playlists");
        assert_eq!(response.status_code, 200);
        let summaries: Vec<PlaylistSummary> = parse_json_response(response)?;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].slug, "January-2024");
        assert_eq!(summaries[0].tracks, 1);
        assert_eq!(summaries[0].plays, 2);

        let response = get(&server, "/api/playlists/January-2024");
        assert_eq!(response.status_code, 200);
        let playlist: Playlist = parse_json_response(response)?;
        assert_eq!(playlist.tracks[0].count, 2);

        assert_eq!(get(&server, "/api/playlists/nope").status_code, 404);
        assert_eq!(get(&server, "/api/playlists/a.b").status_code, 400);
        Ok(())
    }
}
