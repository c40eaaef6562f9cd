use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recent post, in the shape shared by every feed source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostSummary {
    pub title: String,
    pub link: String,
    pub raw_date: String,
    pub display_date: String,
    pub source: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PostSummary {
    /// Publication instant, if `raw_date` parses.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_feed_date(&self.raw_date)
    }

    /// Short source name shown next to the date (`news.example.com` -> `news`).
    pub fn source_label(&self) -> &str {
        self.source.split('.').next().unwrap_or(&self.source)
    }
}

/// Parses Blogger (RFC 3339) and WordPress (naive local, read as UTC) timestamps.
pub fn parse_feed_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(value).map(|naive| naive.and_utc())
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Formats `raw` for display in the author's own offset; unparsable dates
/// are shown as given.
pub fn format_display_date(raw: &str, format: &str) -> String {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format(format).to_string();
    }
    match parse_naive(value) {
        Some(naive) => naive.format(format).to_string(),
        None => raw.to_string(),
    }
}
