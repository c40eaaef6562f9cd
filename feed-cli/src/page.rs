use std::collections::HashMap;
use std::path::Path;

use feed_core::{PageLoader, SlotConfig, SlotError, SlotPlacement, Viewport};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("unable to read page file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid page file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// A page of widget slots, as exported from the theme markup.
#[derive(Debug, Deserialize)]
pub struct PageSpec {
    pub slots: Vec<SlotSpec>,
}

#[derive(Debug, Deserialize)]
pub struct SlotSpec {
    pub id: String,
    /// Space separated class list, e.g. `"widget recent-wp-multi"`.
    pub class: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub top: f64,
    #[serde(default = "default_slot_height")]
    pub height: f64,
}

fn default_slot_height() -> f64 {
    300.0
}

impl PageSpec {
    pub async fn load(path: &Path) -> Result<Self, PageError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn bottom(&self) -> f64 {
        self.slots
            .iter()
            .map(|s| s.top + s.height)
            .fold(0.0, f64::max)
    }

    /// Registers every slot with the loader's scheduler.
    pub fn register(&self, loader: &mut PageLoader, default_count: usize) -> Result<(), PageError> {
        for spec in &self.slots {
            let classes: Vec<&str> = spec.class.split_whitespace().collect();
            let config = SlotConfig::from_attributes(&spec.id, &classes, &spec.attributes, default_count)?;
            debug!(slot = %config.id, loader = ?config.loader, sources = config.sources.len(), "registered slot");
            loader.scheduler_mut().register(
                config,
                SlotPlacement {
                    top: spec.top,
                    height: spec.height,
                },
            );
        }
        Ok(())
    }
}

/// Scrolls from the top of the page to its bottom in `step` increments.
pub async fn scroll_through(loader: &mut PageLoader, page: &PageSpec, width: f64, height: f64, step: f64) {
    let step = step.max(1.0);
    let bottom = page.bottom();
    let mut scroll_y = 0.0;
    loop {
        let loaded = loader
            .scroll_to(Viewport {
                width,
                height,
                scroll_y,
            })
            .await;
        if loaded > 0 {
            info!(scroll_y, loaded, "slots loaded");
        }
        if scroll_y + height >= bottom || loader.scheduler().pending() == 0 {
            break;
        }
        scroll_y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_and_computes_bottom() {
        let page: PageSpec = serde_json::from_str(
            r#"{ "slots": [
                { "id": "a", "class": "widget recent-wp-multi", "attributes": { "data-sources": "x.com" }, "top": 100 },
                { "id": "b", "class": "recHL", "attributes": { "data-source": "y.com" }, "top": 2000, "height": 500 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(page.slots.len(), 2);
        assert_eq!(page.bottom(), 2500.0);
    }
}
