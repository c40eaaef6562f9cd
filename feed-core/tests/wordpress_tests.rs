use std::sync::Arc;
use std::time::Duration;

use feed_core::{
    BloggerSource, CacheStore, CallbackRegistry, FeedPipeline, FeedQuery, MemoryStorage,
    NormalizeOptions, SourceKind, WordPressSource,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLACEHOLDER: &str = "https://placehold.co/70x50";

fn pipeline(timeout: Duration) -> FeedPipeline {
    let cache = CacheStore::new(Arc::new(MemoryStorage::new()));
    let options = NormalizeOptions::default();
    let client = Client::new();
    let wordpress = WordPressSource::new(client.clone(), cache.clone(), timeout, options.clone());
    let blogger = BloggerSource::new(client, CallbackRegistry::default(), timeout, options);
    FeedPipeline::new(cache, Arc::new(wordpress), Arc::new(blogger))
}

fn wp_post(id: u64, date: &str, featured_media: u64) -> serde_json::Value {
    json!({
        "id": id,
        "date": date,
        "link": format!("https://wp.example.com/?p={id}"),
        "title": { "rendered": format!("Post {id}") },
        "featured_media": featured_media
    })
}

#[tokio::test]
async fn posts_are_normalized_with_one_batched_media_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("per_page", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            wp_post(1, "2024-03-04T08:00:00", 11),
            wp_post(2, "2024-03-03T08:00:00", 12),
            wp_post(3, "2024-03-02T08:00:00", 11),
            wp_post(4, "2024-03-01T08:00:00", 0),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media"))
        .and(query_param("include", "11,12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "source_url": "https://wp.example.com/up/11.jpg" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let posts = pipeline(Duration::from_secs(2))
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), None, 4))
        .await;

    assert_eq!(posts.len(), 4);
    assert_eq!(posts[0].image_url, "https://wp.example.com/up/11.jpg");
    assert_eq!(posts[2].image_url, "https://wp.example.com/up/11.jpg");
    // media 12 missing from the lookup, post 4 has none
    assert_eq!(posts[1].image_url, PLACEHOLDER);
    assert_eq!(posts[3].image_url, PLACEHOLDER);
    assert_eq!(posts[0].title, "Post 1");
    assert_eq!(posts[0].display_date, "4/3/2024");
    assert_eq!(posts[0].source, "127.0.0.1");
}

#[tokio::test]
async fn failed_media_lookup_falls_back_to_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([wp_post(1, "2024-03-04T08:00:00", 11)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/media"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let posts = pipeline(Duration::from_secs(2))
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), None, 5))
        .await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].image_url, PLACEHOLDER);
}

#[tokio::test]
async fn successful_fetch_is_cached_and_failures_are_not() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([wp_post(1, "2024-03-04T08:00:00", 0)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let pipeline = pipeline(Duration::from_secs(2));
    let ok = format!("{}/ok", server.uri());
    let down = format!("{}/down", server.uri());

    for _ in 0..2 {
        let posts = pipeline
            .fetch(SourceKind::WordPress, FeedQuery::new(&ok, None, 5))
            .await;
        assert_eq!(posts.len(), 1);
    }
    for _ in 0..2 {
        let posts = pipeline
            .fetch(SourceKind::WordPress, FeedQuery::new(&down, None, 5))
            .await;
        assert!(posts.is_empty());
    }
}

#[tokio::test]
async fn category_name_is_resolved_once_then_used_as_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("search", "Sepak Bola"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "slug": "sepak-bola-lokal", "name": "Sepak Bola Lokal" },
            { "id": 3, "slug": "sepak-bola", "name": "Sepak Bola" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("categories", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([wp_post(1, "2024-03-04T08:00:00", 0)])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let pipeline = pipeline(Duration::from_secs(2));
    // different counts -> different post cache keys, same category cache key
    let first = pipeline
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), Some("Sepak Bola"), 5))
        .await;
    let second = pipeline
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), Some("Sepak Bola"), 3))
        .await;
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn unknown_category_yields_empty_without_fetching_posts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let posts = pipeline(Duration::from_secs(2))
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), Some("Tidak Ada"), 5))
        .await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn slow_source_times_out_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([wp_post(1, "2024-03-04T08:00:00", 0)]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let posts = pipeline(Duration::from_millis(100))
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), None, 5))
        .await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn malformed_payload_yields_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let posts = pipeline(Duration::from_secs(2))
        .fetch(SourceKind::WordPress, FeedQuery::new(&server.uri(), None, 5))
        .await;
    assert!(posts.is_empty());
}
