use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

pub const DISCOVER_WEEKLY_NAME: &str = "Discover Weekly";

static PLAYLIST_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:playlist[/:])([A-Za-z0-9]+)").expect("static regex is valid")
});

/// Case-insensitive name comparison used for every destination lookup
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Extract a Spotify playlist id from a raw id, a share link
/// (`https://open.spotify.com/[user/<u>/]playlist/<id>?si=...`)
/// or a `spotify:playlist:<id>` URI.
pub fn parse_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(caps) = PLAYLIST_ID_RE.captures(input) {
        return Some(caps[1].to_string());
    }
    if input.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(input.to_string());
    }
    None
}

/// "Discover Weekly: 2024 - 7" for any day of ISO week 7 of 2024
pub fn weekly_archive_name(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}: {} - {}", DISCOVER_WEEKLY_NAME, week.year(), week.week())
}
