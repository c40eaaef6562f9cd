use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::Storage;

pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    // unix millis
    timestamp: i64,
}

/// TTL cache over a [`Storage`]. Never surfaces storage failures: reads
/// degrade to a miss and writes to a no-op.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    ttl: Duration,
    clock: Clock,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").field("ttl", &self.ttl).finish()
    }
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            ttl: DEFAULT_TTL,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replaces the wall clock (unix millis) used to stamp and age entries.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, key, "cache read failed");
                return None;
            }
        };
        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, key, "discarding unreadable cache entry");
                return None;
            }
        };
        let age = (self.clock)().saturating_sub(entry.timestamp);
        if age >= self.ttl.as_millis() as i64 {
            debug!(key, age_ms = age, "cache entry expired");
            return None;
        }
        Some(entry.value)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            value,
            timestamp: (self.clock)(),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, key, "failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(key, raw).await {
            warn!(error = %e, key, "cache write failed");
        }
    }
}

/// Key for a fetched post list: `{prefix}_{source}_{category|all}_{count}`.
pub fn posts_key(prefix: &str, source: &str, category: Option<&str>, count: usize) -> String {
    format!("{}_{}_{}_{}", prefix, source, category.unwrap_or("all"), count)
}
