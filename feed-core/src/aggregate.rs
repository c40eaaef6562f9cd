use std::cmp::Ordering;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::FeedPipeline;
use crate::post::PostSummary;
use crate::source::{FeedQuery, SourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Keep source order, then feed order.
    #[default]
    Feed,
    /// Newest first by `raw_date`.
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub kind: SourceKind,
    pub sources: Vec<String>,
    pub category: Option<String>,
    pub count: usize,
    pub sort: SortMode,
    /// Lets a failed Blogger label request retry unscoped.
    pub unscoped_fallback: bool,
}

/// Fetches every source concurrently and merges whatever succeeded.
/// Returns only after all sources have settled.
pub async fn aggregate(pipeline: &FeedPipeline, request: &AggregateRequest) -> Vec<PostSummary> {
    let fetches = request.sources.iter().map(|source| {
        let query = FeedQuery::new(source, request.category.as_deref(), request.count)
            .with_unscoped_fallback(request.unscoped_fallback);
        pipeline.fetch(request.kind, query)
    });
    let per_source = join_all(fetches).await;

    let mut all: Vec<PostSummary> = per_source.into_iter().flatten().collect();
    if request.sort == SortMode::Date {
        sort_by_date_desc(&mut all);
    }
    debug!(kind = %request.kind, sources = request.sources.len(), merged = all.len(), keep = request.count, "aggregated");
    all.truncate(request.count);
    all
}

/// Newest first; posts whose date does not parse sort as oldest.
pub fn sort_by_date_desc(posts: &mut [PostSummary]) {
    posts.sort_by(|a, b| match (a.published_at(), b.published_at()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
