pub mod blogger;
pub mod wordpress;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;
use crate::post::PostSummary;

pub use blogger::BloggerSource;
pub use wordpress::WordPressSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    WordPress,
    Blogger,
}

impl SourceKind {
    /// Prefix used in cache keys.
    pub fn cache_prefix(self) -> &'static str {
        match self {
            SourceKind::WordPress => "wp",
            SourceKind::Blogger => "blg",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::WordPress => write!(f, "wordpress"),
            SourceKind::Blogger => write!(f, "blogger"),
        }
    }
}

/// One per-source request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery<'a> {
    pub source: &'a str,
    pub category: Option<&'a str>,
    pub count: usize,
    /// Retry once without the category when the scoped request fails.
    /// Only single-source Blogger slots set this.
    pub unscoped_fallback: bool,
}

impl<'a> FeedQuery<'a> {
    pub fn new(source: &'a str, category: Option<&'a str>, count: usize) -> Self {
        Self {
            source,
            category,
            count,
            unscoped_fallback: false,
        }
    }

    pub fn with_unscoped_fallback(mut self, enabled: bool) -> Self {
        self.unscoped_fallback = enabled;
        self
    }
}

/// Fetch strategy for one blogging platform.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, query: FeedQuery<'_>) -> Result<Vec<PostSummary>, FetchError>;
}

/// A source string resolved to a base URL plus the host shown to readers.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub base: Url,
    pub host: String,
}

impl Endpoint {
    /// Accepts a bare host (`https://` implied) or a full `http(s)://` base URL.
    pub fn parse(source: &str) -> Result<Self, FetchError> {
        let trimmed = source.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(FetchError::InvalidSource(source.to_string()));
        }
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let mut base =
            Url::parse(&with_scheme).map_err(|_| FetchError::InvalidSource(source.to_string()))?;
        let host = base
            .host_str()
            .ok_or_else(|| FetchError::InvalidSource(source.to_string()))?
            .to_string();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, host })
    }

    /// Joins a relative API path (`wp-json/...`) onto the base.
    pub fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| FetchError::InvalidSource(self.base.to_string()))
    }
}
