//! Static html pages for the charts and the index linking them.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use crate::{
    domain::{chain::PlaylistChain, playlist::Playlist},
    search::cache::LookupCache,
    storage::error::StorageError,
};

const INDEX_FILE: &str = "index.html";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `▲n` for a track that climbed, `▼n` for one that fell, `=` when it kept
/// its place and nothing for a new entry.
pub fn rank_badge(delta: Option<i64>) -> String {
    match delta {
        None => String::new(),
        Some(0) => "=".to_string(),
        Some(d) if d > 0 => format!("▲{d}"),
        Some(d) => format!("▼{}", d.unsigned_abs()),
    }
}

pub fn page_name(playlist: &Playlist) -> String {
    format!("{}.html", playlist.scope.slug())
}

fn nav_link(playlist: Option<&Playlist>, class: &str) -> String {
    match playlist {
        Some(p) => format!(
            r#"<a href="{}" class="{class}">{}</a>"#,
            escape(&page_name(p)),
            escape(&p.title())
        ),
        None => String::new(),
    }
}

/// Page for the playlist at `index` of the chain. The cache is only used to
/// find artist pages for matches that did not carry one.
pub fn render_playlist(chain: &PlaylistChain, index: usize, cache: &mut LookupCache) -> Option<String> {
    let playlist = chain.get(index)?;
    let title = escape(&playlist.title());

    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html>
<head>
	<meta charset="utf-8">
	<title>Radio Nova {title} - Playlist</title>
	<link rel="stylesheet" type="text/css" href="playlist.css">
	<script src="playlist.js"></script>
</head>
<body>
	<h1>Radio Nova {title}</h1>
	<nav>
		{prev}
		<a href="./">All Playlists</a>
		{next}
	</nav>
	<table class="playlist">
		<thead>
			<tr>
				<th class="position">#</th>
				<th class="rank">&plusmn;</th>
				<th>Artwork</th>
				<th>Track</th>
				<th>Play</th>
				<th>Duration</th>
				<th>Plays</th>
			</tr>
		</thead>
		<tbody class="playlist">
"#,
        prev = nav_link(chain.previous(index), "prev"),
        next = nav_link(chain.next(index), "next"),
    ));

    for (position, track) in playlist.tracks.iter().enumerate() {
        let yt_url = escape(&track.yt_music_url().unwrap_or_default());
        let artist_url = escape(&track.primary_artist_url(cache).unwrap_or_else(|| "#".into()));
        html.push_str(&format!(
            r#"			<tr class="playlist-entry" data-title="{title}">
				<td class="position">{position}</td>
				<td class="rank">{badge}</td>
				<td class="artwork"><a href="{yt_url}" target="_blank"><img src="{thumb}" class="artwork" loading="lazy" /></a></td>
				<td class="track"><a href="{yt_url}" target="_blank"><span class="title">{title}</span></a>
				by <a href="{artist_url}" target="_blank"><span class="artist-name">{artist}</span></a></td>
				<td class="dsp-links">
					<a class="ytmusic" href="{yt_url}" target="_blank"><img src="images/youtube-music.svg"/></a>
					<a class="spotify" href="{store_url}" target="_blank"><img src="images/spotify.svg"/></a>
				</td>
				<td class="duration">{duration}</td>
				<td class="playcount">{count}</td>
			</tr>
"#,
            title = escape(&track.title),
            position = position + 1,
            badge = rank_badge(chain.rank_delta(index, position)),
            thumb = escape(track.thumb_url()),
            artist = escape(&track.artist),
            store_url = escape(&track.store_url),
            duration = track.yt_duration().unwrap_or_default(),
            count = track.count,
        ));
    }

    html.push_str(
        r#"		</tbody>
	</table>
	<button id="random-button">Select a Random Song</button>
</body>
</html>
"#,
    );
    Some(html)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub title: String,
    pub href: String,
    pub start: Option<NaiveDate>,
}

impl IndexEntry {
    pub fn for_playlist(playlist: &Playlist) -> Self {
        Self {
            title: playlist.title(),
            href: page_name(playlist),
            start: playlist.scope.start_date(),
        }
    }
}

/// Oldest first, undated pages (all time) at the end.
pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut sorted: Vec<&IndexEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| (e.start.is_none(), e.start));

    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
	<meta charset="utf-8">
	<title>Radio Nova - Playlists</title>
	<link rel="stylesheet" type="text/css" href="playlist.css">
</head>
<body>
	<h1>Radio Nova - Playlists</h1>
	<h2>Below are the playlists of <a href="https://nova.fr" target="_blank">Radio Nova</a>.</h2>
	<ul id="playlists">
"#,
    );
    for entry in sorted {
        html.push_str(&format!(
            "\t\t<li><a href=\"{}\">{}</a></li>\n",
            escape(&entry.href),
            escape(&entry.title)
        ));
    }
    html.push_str("\t</ul>\n</body>\n</html>\n");
    html
}

/// The rendered web directory.
pub struct Site {
    web_dir: PathBuf,
}

impl Site {
    pub fn new(web_dir: impl Into<PathBuf>) -> Self {
        Self {
            web_dir: web_dir.into(),
        }
    }

    pub fn web_dir(&self) -> &Path {
        &self.web_dir
    }

    /// Writes one page per playlist of the chain.
    pub fn write_chain(
        &self,
        chain: &PlaylistChain,
        cache: &mut LookupCache,
    ) -> Result<Vec<IndexEntry>, StorageError> {
        fs::create_dir_all(&self.web_dir)?;
        let mut entries = Vec::with_capacity(chain.len());
        for index in 0..chain.len() {
            let (Some(playlist), Some(html)) = (chain.get(index), render_playlist(chain, index, cache))
            else {
                continue;
            };
            let path = self.web_dir.join(page_name(playlist));
            fs::write(&path, html)?;
            log::info!("wrote {}", path.to_string_lossy());
            entries.push(IndexEntry::for_playlist(playlist));
        }
        Ok(entries)
    }

    pub fn write_index(&self, entries: &[IndexEntry]) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.web_dir)?;
        let path = self.web_dir.join(INDEX_FILE);
        fs::write(&path, render_index(entries))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{scope::Scope, track::Track},
        testing::{FakeSearch, track_item},
    };

    fn playlist(scope: Scope, keys: &[(&str, &str)]) -> Playlist {
        Playlist {
            scope,
            tracks: keys.iter().map(|(a, t)| Track::new(*a, *t)).collect(),
        }
    }

    #[test]
    fn badges() {
        assert_eq!(rank_badge(None), "");
        assert_eq!(rank_badge(Some(0)), "=");
        assert_eq!(rank_badge(Some(3)), "▲3");
        assert_eq!(rank_badge(Some(-2)), "▼2");
    }

    #[test]
    fn escaping() {
        assert_eq!(
            escape(r#"<b>"rock" & 'roll'</b>"#),
            "&lt;b&gt;&quot;rock&quot; &amp; &#39;roll&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn playlist_page_has_navigation_and_deltas() {
        let chain = PlaylistChain::link(vec![
            playlist(Scope::month(2024, 1), &[("a", "one"), ("b", "two")]),
            playlist(Scope::month(2024, 2), &[("b", "two"), ("a", "one"), ("c", "<three>")]),
            playlist(Scope::month(2024, 3), &[]),
        ]);
        let mut cache = LookupCache::in_memory(Box::new(FakeSearch::new()));

        let html = render_playlist(&chain, 1, &mut cache).unwrap();
        assert!(html.contains("<h1>Radio Nova February 2024</h1>"));
        assert!(html.contains(r#"<a href="January-2024.html" class="prev">January 2024</a>"#));
        assert!(html.contains(r#"<a href="March-2024.html" class="next">March 2024</a>"#));
        assert!(html.contains(r#"<td class="rank">▲1</td>"#));
        assert!(html.contains(r#"<td class="rank">▼1</td>"#));
        assert!(html.contains("&lt;three&gt;"));
        assert!(!html.contains("<three>"));

        let first = render_playlist(&chain, 0, &mut cache).unwrap();
        assert!(!first.contains("class=\"prev\""));
        assert!(first.contains(r#"<td class="rank"></td>"#));

        assert!(render_playlist(&chain, 9, &mut cache).is_none());
    }

    #[test]
    fn enriched_tracks_link_to_youtube_music() {
        let mut p = playlist(Scope::month(2024, 1), &[("air", "sexy boy")]);
        let mut item = track_item("vid1", "Sexy Boy");
        item.duration_secs = 298;
        p.tracks[0].yt_music = Some(item);
        p.tracks[0].count = 4;

        let chain = PlaylistChain::link(vec![p]);
        let mut cache = LookupCache::in_memory(Box::new(FakeSearch::new()));
        let html = render_playlist(&chain, 0, &mut cache).unwrap();
        assert!(html.contains("https://music.youtube.com/watch?v=vid1"));
        assert!(html.contains(r#"<td class="duration">4:58</td>"#));
        assert!(html.contains(r#"<td class="playcount">4</td>"#));
        // no artist id on the match and no artist found by name
        assert!(html.contains(r##"by <a href="#" target="_blank">"##));
    }

    #[test]
    fn index_is_chronological() {
        let entries = vec![
            IndexEntry::for_playlist(&playlist(Scope::AllTime, &[])),
            IndexEntry::for_playlist(&playlist(Scope::month(2024, 2), &[])),
            IndexEntry::for_playlist(&playlist(Scope::month(2023, 12), &[])),
        ];
        let html = render_index(&entries);
        let dec = html.find("December 2023").unwrap();
        let feb = html.find("February 2024").unwrap();
        let all = html.find("All time").unwrap();
        assert!(dec < feb && feb < all);
        assert!(html.contains(r#"<a href="all-time.html">"#));
    }

    #[test]
    fn site_writes_pages_and_index() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let site = Site::new(tmp.path().join("web"));
        let chain = PlaylistChain::link(vec![
            playlist(Scope::month(2024, 1), &[("a", "one")]),
            playlist(Scope::year(2024), &[("a", "one")]),
        ]);
        let mut cache = LookupCache::in_memory(Box::new(FakeSearch::new()));

        let entries = site.write_chain(&chain, &mut cache)?;
        site.write_index(&entries)?;

        assert!(site.web_dir().join("January-2024.html").is_file());
        assert!(site.web_dir().join("2024.html").is_file());
        assert!(site.web_dir().join("index.html").is_file());
        Ok(())
    }
}
