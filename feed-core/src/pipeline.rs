use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::cache::{posts_key, CacheStore};
use crate::config::FeedConfig;
use crate::jsonp::CallbackRegistry;
use crate::post::PostSummary;
use crate::source::{BloggerSource, FeedQuery, FeedSource, SourceKind, WordPressSource};

/// The single load path shared by every slot: cache first, then the
/// platform-specific fetcher. Failures are logged and become an empty list.
#[derive(Clone)]
pub struct FeedPipeline {
    cache: CacheStore,
    wordpress: Arc<dyn FeedSource>,
    blogger: Arc<dyn FeedSource>,
}

impl FeedPipeline {
    pub fn new(cache: CacheStore, wordpress: Arc<dyn FeedSource>, blogger: Arc<dyn FeedSource>) -> Self {
        Self {
            cache,
            wordpress,
            blogger,
        }
    }

    /// Builds both HTTP fetchers from the configuration.
    pub fn from_config(client: Client, cache: CacheStore, config: &FeedConfig) -> Self {
        let options = config.normalize_options();
        let wordpress = WordPressSource::new(
            client.clone(),
            cache.clone(),
            config.request_timeout(),
            options.clone(),
        );
        let blogger = BloggerSource::new(
            client,
            CallbackRegistry::default(),
            config.request_timeout(),
            options,
        );
        Self::new(cache, Arc::new(wordpress), Arc::new(blogger))
    }

    fn strategy(&self, kind: SourceKind) -> &Arc<dyn FeedSource> {
        match kind {
            SourceKind::WordPress => &self.wordpress,
            SourceKind::Blogger => &self.blogger,
        }
    }

    pub async fn fetch(&self, kind: SourceKind, query: FeedQuery<'_>) -> Vec<PostSummary> {
        let query = FeedQuery {
            source: query.source.trim(),
            ..query
        };
        let (source, category) = (query.source, query.category);
        let key = posts_key(kind.cache_prefix(), source, category, query.count);
        if let Some(cached) = self.cache.get::<Vec<PostSummary>>(&key).await {
            debug!(%kind, source, key, items = cached.len(), "cache hit");
            return cached;
        }

        match self.strategy(kind).fetch(query).await {
            Ok(posts) => {
                info!(%kind, source, items = posts.len(), "fetched feed");
                self.cache.set(&key, &posts).await;
                posts
            }
            Err(e) => {
                warn!(%kind, source, category = ?category, error = %e, "feed fetch failed");
                Vec::new()
            }
        }
    }
}
