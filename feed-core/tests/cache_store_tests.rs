use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use feed_core::{CacheStore, FileStorage, MemoryStorage, PostSummary, Storage, StorageError};

fn sample_posts() -> Vec<PostSummary> {
    vec![PostSummary {
        title: "Harga cabai naik".into(),
        link: "https://news.example.com/cabai".into(),
        raw_date: "2024-03-07T10:15:00".into(),
        display_date: "7/3/2024".into(),
        source: "news.example.com".into(),
        image_url: "https://placehold.co/70x50".into(),
        label: None,
    }]
}

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "blogfeed_{}_{}",
        tag,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

#[tokio::test]
async fn get_returns_value_within_ttl_and_nothing_after() {
    let now = Arc::new(AtomicI64::new(1_700_000_000_000));
    let clock = now.clone();
    let cache = CacheStore::new(Arc::new(MemoryStorage::new()))
        .with_clock(move || clock.load(Ordering::SeqCst));

    let posts = sample_posts();
    cache.set("wp_news.example.com_all_5", &posts).await;

    now.fetch_add(299_999, Ordering::SeqCst);
    let hit: Option<Vec<PostSummary>> = cache.get("wp_news.example.com_all_5").await;
    assert_eq!(hit, Some(posts));

    now.fetch_add(1, Ordering::SeqCst);
    let miss: Option<Vec<PostSummary>> = cache.get("wp_news.example.com_all_5").await;
    assert!(miss.is_none(), "entry must expire once it is 300000 ms old");
}

#[tokio::test]
async fn corrupt_or_mistyped_entries_are_misses() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item("blg_a_all_5", "{ not json".to_string())
        .await
        .unwrap();
    let cache = CacheStore::new(storage.clone());
    assert!(cache.get::<Vec<PostSummary>>("blg_a_all_5").await.is_none());

    cache.set("wp_cat_a_Berita", &42u64).await;
    assert!(cache.get::<Vec<PostSummary>>("wp_cat_a_Berita").await.is_none());
    assert_eq!(cache.get::<u64>("wp_cat_a_Berita").await, Some(42));
}

struct BrokenStorage;

#[async_trait]
impl Storage for BrokenStorage {
    async fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Io(std::io::Error::other("storage disabled")))
    }

    async fn set_item(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("quota exceeded")))
    }
}

#[tokio::test]
async fn unavailable_storage_degrades_silently() {
    let cache = CacheStore::new(Arc::new(BrokenStorage));
    cache.set("k", &sample_posts()).await;
    assert!(cache.get::<Vec<PostSummary>>("k").await.is_none());
}

#[tokio::test]
async fn file_storage_persists_across_reopen() {
    let dir = temp_dir("persist");
    let path = dir.join("cache_store.json");

    let cache = CacheStore::new(Arc::new(FileStorage::open(&path).await));
    cache.set("wp_a_all_5", &sample_posts()).await;

    let reopened = CacheStore::new(Arc::new(FileStorage::open(&path).await));
    let posts: Option<Vec<PostSummary>> = reopened.get("wp_a_all_5").await;
    assert_eq!(posts, Some(sample_posts()));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn file_storage_uses_tmp_fallback_on_corrupted_json() {
    let dir = temp_dir("corrupt");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let path = dir.join("cache_store.json");
    tokio::fs::write(&path, b"{ this is not json ").await.unwrap();
    let tmp = dir.join("cache_store.json.tmp");
    tokio::fs::write(&tmp, br#"{"greeting": "halo"}"#).await.unwrap();

    let storage = FileStorage::open(&path).await;
    assert_eq!(storage.get_item("greeting").await.unwrap().as_deref(), Some("halo"));

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_file_writes_all_land() {
    let dir = temp_dir("concurrent");
    let path = dir.join("cache_store.json");
    let storage = FileStorage::open(&path).await;

    let writes = (0..16).map(|i| {
        let storage = storage.clone();
        tokio::spawn(async move { storage.set_item(&format!("k{i}"), format!("v{i}")).await })
    });
    for result in futures_util::future::join_all(writes).await {
        result.unwrap().unwrap();
    }

    let reopened = FileStorage::open(&path).await;
    for i in 0..16 {
        assert_eq!(
            reopened.get_item(&format!("k{i}")).await.unwrap(),
            Some(format!("v{i}"))
        );
    }
    assert!(!dir.join("cache_store.json.tmp").exists());

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
