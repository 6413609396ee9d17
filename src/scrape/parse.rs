//! Extraction of aired tracks from a "c'était quoi ce titre" page.
//!
//! The markup is scanned block by block (`div.wwtt_content`) with small
//! local regexes rather than a full HTML parser; only a handful of fields
//! are needed and the blocks are flat.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scrape::RawTrack;

static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div\b[^>]*\bclass\s*=\s*"[^"]*\bwwtt_content\b[^"]*"[^>]*>"#)
        .expect("valid block regex")
});
static ARTIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2>").expect("valid artist regex"));
// a <p> with no attributes at all
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\s*>(.*?)</p>").expect("valid title regex"));
static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<p\b[^>]*\bclass\s*=\s*"[^"]*\btime\b[^"]*"[^>]*>(.*?)</p>"#)
        .expect("valid time regex")
});
static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*\bsrc\s*=\s*"([^"]*)""#).expect("valid img regex")
});
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li>").expect("valid li regex"));
static LINK_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bhref\s*=\s*"([^"]*)""#).expect("valid href regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex")
});

/// All tracks on the page, in page order. A page without any block yields
/// an empty list, which is how the end of a day is detected.
pub fn parse_page(html: &str) -> Vec<RawTrack> {
    let starts: Vec<usize> = BLOCK_START.find_iter(html).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            parse_block(&html[start..end])
        })
        .collect()
}

fn parse_block(block: &str) -> RawTrack {
    let text = |re: &Regex| {
        re.captures(block)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default()
    };
    let attr = |re: &Regex, within: &str| {
        re.captures(within)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default()
    };

    // the streaming links sit in a list, spotify is the second entry
    let store_url = LIST_ITEM
        .captures_iter(block)
        .nth(1)
        .and_then(|c| c.get(1))
        .map(|li| attr(&*LINK_HREF, li.as_str()))
        .unwrap_or_default();

    RawTrack {
        artist: text(&*ARTIST),
        title: text(&*TITLE),
        time: text(&*TIME),
        img_url: attr(&*IMG_SRC, block),
        store_url,
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, "");
    decode_entities(stripped.trim())
}

pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
