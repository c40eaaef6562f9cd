use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateRequest, SortMode};
use crate::error::SlotError;
use crate::source::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoaderKind {
    WordPressSingle,
    WordPressMulti,
    BloggerSingle,
    BloggerMulti,
}

impl LoaderKind {
    /// Widget class names, as they appear in the theme markup.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "recent-wp" => Some(LoaderKind::WordPressSingle),
            "recent-wp-multi" => Some(LoaderKind::WordPressMulti),
            "recHL" => Some(LoaderKind::BloggerSingle),
            "recent-blg-multi" => Some(LoaderKind::BloggerMulti),
            _ => None,
        }
    }

    pub fn source_kind(self) -> SourceKind {
        match self {
            LoaderKind::WordPressSingle | LoaderKind::WordPressMulti => SourceKind::WordPress,
            LoaderKind::BloggerSingle | LoaderKind::BloggerMulti => SourceKind::Blogger,
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, LoaderKind::WordPressMulti | LoaderKind::BloggerMulti)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub id: String,
    pub loader: LoaderKind,
    pub sources: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub count: usize,
    #[serde(default)]
    pub sort: SortMode,
}

impl SlotConfig {
    /// Reads the `data-*` attributes of a widget element.
    ///
    /// `data-sources` (comma list) or `data-source`, `data-category` or
    /// `data-label`, `data-items`, `data-sort`. Multi-source loaders sort by
    /// date unless told otherwise.
    pub fn from_attributes(
        id: &str,
        classes: &[&str],
        attrs: &HashMap<String, String>,
        default_count: usize,
    ) -> Result<Self, SlotError> {
        let loader = classes
            .iter()
            .find_map(|class| LoaderKind::from_class(class))
            .ok_or_else(|| SlotError::UnknownLoader(id.to_string()))?;

        let sources: Vec<String> = attrs
            .get("data-sources")
            .or_else(|| attrs.get("data-source"))
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if sources.is_empty() {
            return Err(SlotError::NoSources(id.to_string()));
        }

        let category = attrs
            .get("data-category")
            .or_else(|| attrs.get("data-label"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let count = attrs
            .get("data-items")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(default_count);

        let sort = match attrs.get("data-sort").map(|s| s.trim()) {
            Some("date") => SortMode::Date,
            Some(_) => SortMode::Feed,
            None if loader.is_multi() => SortMode::Date,
            None => SortMode::Feed,
        };

        Ok(Self {
            id: id.to_string(),
            loader,
            sources,
            category,
            count,
            sort,
        })
    }

    pub fn request(&self) -> AggregateRequest {
        AggregateRequest {
            kind: self.loader.source_kind(),
            sources: self.sources.clone(),
            category: self.category.clone(),
            count: self.count,
            sort: self.sort,
            unscoped_fallback: self.loader == LoaderKind::BloggerSingle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Pending,
    Loading,
    Loaded,
}

/// Vertical position of a slot on the page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPlacement {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub config: SlotConfig,
    pub placement: SlotPlacement,
    pub state: SlotState,
    pub markup: String,
}
