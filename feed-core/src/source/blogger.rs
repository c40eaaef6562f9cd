use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::jsonp::CallbackRegistry;
use crate::normalize::{normalize_blogger, BloggerResponse, NormalizeOptions};
use crate::post::PostSummary;
use crate::source::{Endpoint, FeedQuery, FeedSource};

/// Recent posts from a Blogger JSON-in-script feed.
#[derive(Debug, Clone)]
pub struct BloggerSource {
    client: Client,
    registry: CallbackRegistry,
    timeout: Duration,
    options: NormalizeOptions,
}

impl BloggerSource {
    pub fn new(
        client: Client,
        registry: CallbackRegistry,
        timeout: Duration,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            client,
            registry,
            timeout,
            options,
        }
    }

    /// `/feeds/posts/default[/-/{label}]?alt=json-in-script&orderby=published&max-results=N&callback=NAME`
    pub fn feed_url(
        endpoint: &Endpoint,
        label: Option<&str>,
        count: usize,
        callback: &str,
    ) -> Result<Url, FetchError> {
        let mut url = endpoint.join("feeds/posts/default")?;
        if let Some(label) = label {
            url.path_segments_mut()
                .map_err(|_| FetchError::InvalidSource(endpoint.base.to_string()))?
                .push("-")
                .push(label);
        }
        url.query_pairs_mut()
            .append_pair("alt", "json-in-script")
            .append_pair("orderby", "published")
            .append_pair("max-results", &count.to_string())
            .append_pair("callback", callback);
        Ok(url)
    }

    /// One script load: register a callback, fetch the script, deliver it.
    async fn load_script(
        &self,
        endpoint: &Endpoint,
        label: Option<&str>,
        count: usize,
    ) -> Result<Vec<PostSummary>, FetchError> {
        let pending = self.registry.register();
        let url = Self::feed_url(endpoint, label, count, pending.name())?;
        debug!(%url, "blogger script request");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let script = response.text().await.map_err(FetchError::from_reqwest)?;
        self.registry.deliver(&script)?;

        let payload = pending.wait(self.timeout).await?;
        let feed: BloggerResponse = serde_json::from_value(payload)?;
        Ok(feed
            .feed
            .entry
            .iter()
            .map(|entry| normalize_blogger(entry, &endpoint.host, &self.options))
            .collect())
    }
}

#[async_trait]
impl FeedSource for BloggerSource {
    async fn fetch(&self, query: FeedQuery<'_>) -> Result<Vec<PostSummary>, FetchError> {
        let endpoint = Endpoint::parse(query.source)?;
        let (category, count) = (query.category, query.count);
        match self.load_script(&endpoint, category, count).await {
            Ok(posts) => Ok(posts),
            Err(e) if category.is_some() && query.unscoped_fallback => {
                // Label feed failed: one retry against the full feed.
                warn!(source = %endpoint.host, label = ?category, error = %e, "label feed failed, falling back to all posts");
                self.load_script(&endpoint, None, count).await
            }
            Err(e) => Err(e),
        }
    }
}
