//! Text normalization applied when scraped records become tracks,
//! plus the looser title comparison used to flag doubtful search matches.

use any_ascii::any_ascii;

/// Lowercases the artist, turns `/` separated collaborations into
/// `a and b` and collapses whitespace.
pub fn normalize_artist(raw: &str) -> String {
    collapse_whitespace(&raw.to_lowercase().replace('/', " and "))
}

pub fn normalize_title(raw: &str) -> String {
    collapse_whitespace(&raw.to_lowercase())
}

/// Title used only for comparing a track against its search match:
/// transliterated to ASCII, lowercase, without commas and without the
/// first parenthesised group ("(feat. x)", "(radio edit)", ...).
pub fn clean_title(title: &str) -> String {
    let mut t = any_ascii(title).to_lowercase().replace(',', "");
    if let (Some(start), Some(end)) = (t.find('('), t.find(')')) {
        if end > start {
            t.replace_range(start..=end, " ");
        }
    }
    collapse_whitespace(&t)
}

pub fn titles_match(a: &str, b: &str) -> bool {
    clean_title(a) == clean_title(b)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
