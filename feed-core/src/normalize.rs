//! Raw Blogger / WordPress payload shapes and their mapping onto [`PostSummary`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::post::{format_display_date, PostSummary};

static BLOGGER_SIZE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/s\d+(?:-c)?/").expect("valid size segment regex"));
static BLOGGER_SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=s\d+(?:-c)?$").expect("valid size suffix regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static FIRST_IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub placeholder_image: String,
    pub thumbnail_size: u32,
    pub date_format: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            placeholder_image: "https://placehold.co/70x50".to_string(),
            thumbnail_size: 150,
            date_format: "%-d/%-m/%Y".to_string(),
        }
    }
}

// --- Blogger (`alt=json` / `alt=json-in-script`) ---

#[derive(Debug, Clone, Deserialize)]
pub struct BloggerResponse {
    pub feed: BloggerFeed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BloggerFeed {
    #[serde(default)]
    pub entry: Vec<BloggerEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextNode {
    #[serde(rename = "$t", default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BloggerLink {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BloggerThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BloggerCategory {
    pub term: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BloggerEntry {
    #[serde(default)]
    pub title: TextNode,
    #[serde(default)]
    pub link: Vec<BloggerLink>,
    pub published: Option<TextNode>,
    pub updated: Option<TextNode>,
    #[serde(rename = "media$thumbnail")]
    pub thumbnail: Option<BloggerThumbnail>,
    pub content: Option<TextNode>,
    pub summary: Option<TextNode>,
    #[serde(default)]
    pub category: Vec<BloggerCategory>,
}

// --- WordPress REST (`/wp-json/wp/v2/...`) ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPressPost {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub featured_media: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPressMedia {
    pub id: u64,
    #[serde(default)]
    pub source_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordPressCategory {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

pub fn normalize_blogger(entry: &BloggerEntry, source: &str, opts: &NormalizeOptions) -> PostSummary {
    let link = entry
        .link
        .iter()
        .find(|l| l.rel == "alternate")
        .or_else(|| entry.link.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let raw_date = entry
        .published
        .as_ref()
        .or(entry.updated.as_ref())
        .map(|node| node.text.clone())
        .unwrap_or_default();

    let image_url = entry
        .thumbnail
        .as_ref()
        .map(|thumb| thumb.url.clone())
        .filter(|url| !url.is_empty())
        .or_else(|| {
            [entry.content.as_ref(), entry.summary.as_ref()]
                .into_iter()
                .flatten()
                .find_map(|node| first_image_url(&node.text))
        })
        .map(|url| resize_blogger_thumbnail(&url, opts.thumbnail_size))
        .unwrap_or_else(|| opts.placeholder_image.clone());

    PostSummary {
        title: entry.title.text.clone(),
        link,
        display_date: format_display_date(&raw_date, &opts.date_format),
        raw_date,
        source: source.to_string(),
        image_url,
        label: entry.category.first().map(|c| c.term.clone()),
    }
}

pub fn normalize_wordpress(
    post: &WordPressPost,
    source: &str,
    media: &HashMap<u64, String>,
    opts: &NormalizeOptions,
) -> PostSummary {
    let image_url = Some(post.featured_media)
        .filter(|id| *id > 0)
        .and_then(|id| media.get(&id))
        .filter(|url| !url.is_empty())
        .cloned()
        .unwrap_or_else(|| opts.placeholder_image.clone());

    PostSummary {
        title: decode_rendered_title(&post.title.rendered),
        link: post.link.clone(),
        raw_date: post.date.clone(),
        display_date: format_display_date(&post.date, &opts.date_format),
        source: source.to_string(),
        image_url,
        label: None,
    }
}

/// First `<img src>` inside an HTML fragment.
pub fn first_image_url(html: &str) -> Option<String> {
    FIRST_IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Rewrites the Blogger image size (`/s72-c/` or a trailing `=s72-c`) to `size` pixels.
/// Images hosted anywhere else are returned untouched.
pub fn resize_blogger_thumbnail(url: &str, size: u32) -> String {
    if !is_blogger_image_host(url) {
        return url.to_string();
    }
    let segment = format!("/s{size}-c/");
    let resized = BLOGGER_SIZE_SEGMENT.replace(url, segment.as_str());
    let suffix = format!("=s{size}-c");
    BLOGGER_SIZE_SUFFIX
        .replace(&resized, suffix.as_str())
        .into_owned()
}

fn is_blogger_image_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed.host_str().is_some_and(|host| {
        host == "googleusercontent.com"
            || host.ends_with(".googleusercontent.com")
            || host == "bp.blogspot.com"
            || host.ends_with(".bp.blogspot.com")
    })
}

/// Plain text of a rendered title: tags dropped, entities decoded.
fn decode_rendered_title(rendered: &str) -> String {
    if !rendered.contains(['&', '<']) {
        return rendered.trim().to_string();
    }
    // html2text only sees text nodes, so no emphasis markers are emitted
    let stripped = HTML_TAG.replace_all(rendered, " ");
    let text = html2text::from_read(stripped.as_bytes(), 10_000).unwrap_or_default();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
