use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::cache::CacheStore;
use crate::error::FetchError;
use crate::normalize::{
    normalize_wordpress, NormalizeOptions, WordPressCategory, WordPressMedia, WordPressPost,
};
use crate::post::PostSummary;
use crate::source::{Endpoint, FeedQuery, FeedSource};

const POST_FIELDS: &str = "id,date,link,title,featured_media";
const MEDIA_FIELDS: &str = "id,source_url";
const CATEGORY_FIELDS: &str = "id,slug,name";
const CATEGORY_SEARCH_PAGE: usize = 20;
// WordPress caps per_page at 100
const MAX_PER_PAGE: usize = 100;

/// Recent posts from the WordPress REST API (`/wp-json/wp/v2`).
#[derive(Debug, Clone)]
pub struct WordPressSource {
    client: Client,
    cache: CacheStore,
    timeout: Duration,
    options: NormalizeOptions,
}

impl WordPressSource {
    pub fn new(client: Client, cache: CacheStore, timeout: Duration, options: NormalizeOptions) -> Self {
        Self {
            client,
            cache,
            timeout,
            options,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "wordpress request");
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
        let bytes = response.bytes().await.map_err(FetchError::from_reqwest)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Numeric categories pass through; names are looked up and the id cached.
    pub async fn resolve_category(&self, endpoint: &Endpoint, category: &str) -> Result<u64, FetchError> {
        let category = category.trim();
        if let Ok(id) = category.parse::<u64>() {
            return Ok(id);
        }

        let key = format!("wp_cat_{}_{}", endpoint.host, category);
        if let Some(id) = self.cache.get::<u64>(&key).await {
            return Ok(id);
        }

        let mut url = endpoint.join("wp-json/wp/v2/categories")?;
        url.query_pairs_mut()
            .append_pair("search", category)
            .append_pair("per_page", &CATEGORY_SEARCH_PAGE.to_string())
            .append_pair("_fields", CATEGORY_FIELDS);
        let candidates: Vec<WordPressCategory> = self.get_json(url).await?;

        let id = pick_category(&candidates, category)
            .ok_or_else(|| FetchError::CategoryNotFound(category.to_string()))?;
        self.cache.set(&key, &id).await;
        Ok(id)
    }

    /// Batched media lookup for every distinct `featured_media` id. Failures
    /// leave the map empty so posts fall back to the placeholder.
    async fn fetch_media(&self, endpoint: &Endpoint, posts: &[WordPressPost]) -> HashMap<u64, String> {
        let mut ids: Vec<u64> = posts
            .iter()
            .map(|p| p.featured_media)
            .filter(|id| *id > 0)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return HashMap::new();
        }

        let include = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = match endpoint.join("wp-json/wp/v2/media") {
            Ok(url) => url,
            Err(_) => return HashMap::new(),
        };
        url.query_pairs_mut()
            .append_pair("include", &include)
            .append_pair("per_page", &ids.len().min(MAX_PER_PAGE).to_string())
            .append_pair("_fields", MEDIA_FIELDS);

        match self.get_json::<Vec<WordPressMedia>>(url).await {
            Ok(media) => media
                .into_iter()
                .filter(|m| !m.source_url.is_empty())
                .map(|m| (m.id, m.source_url))
                .collect(),
            Err(e) => {
                warn!(source = %endpoint.host, error = %e, "media lookup failed");
                HashMap::new()
            }
        }
    }
}

#[async_trait]
impl FeedSource for WordPressSource {
    async fn fetch(&self, query: FeedQuery<'_>) -> Result<Vec<PostSummary>, FetchError> {
        let FeedQuery {
            source,
            category,
            count,
            ..
        } = query;
        let endpoint = Endpoint::parse(source)?;
        let category_id = match category {
            Some(name) => Some(self.resolve_category(&endpoint, name).await?),
            None => None,
        };

        let mut url = endpoint.join("wp-json/wp/v2/posts")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("per_page", &count.clamp(1, MAX_PER_PAGE).to_string())
                .append_pair("_fields", POST_FIELDS);
            if let Some(id) = category_id {
                query.append_pair("categories", &id.to_string());
            }
        }
        let posts: Vec<WordPressPost> = self.get_json(url).await?;
        let media = self.fetch_media(&endpoint, &posts).await;

        Ok(posts
            .iter()
            .map(|post| normalize_wordpress(post, &endpoint.host, &media, &self.options))
            .collect())
    }
}

/// Exact slug match, then case-insensitive name match, then the first result.
pub fn pick_category(candidates: &[WordPressCategory], name: &str) -> Option<u64> {
    let slug = slugify(name);
    candidates
        .iter()
        .find(|c| c.slug == slug)
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.name.trim().to_lowercase() == name.trim().to_lowercase())
        })
        .or_else(|| candidates.first())
        .map(|c| c.id)
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
