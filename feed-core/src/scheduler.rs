use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{aggregate, AggregateRequest};
use crate::pipeline::FeedPipeline;
use crate::post::PostSummary;
use crate::render::Renderer;
use crate::slot::{Slot, SlotConfig, SlotPlacement, SlotState};

/// The visible window of the page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub slot_id: String,
    pub request: AggregateRequest,
}

/// Owns every slot and is the only place their state changes.
/// A slot is dispatched at most once: `Pending -> Loading -> Loaded`.
#[derive(Debug)]
pub struct VisibilityScheduler {
    margin_px: f64,
    renderer: Renderer,
    slots: Vec<Slot>,
}

impl VisibilityScheduler {
    pub fn new(margin_px: f64, renderer: Renderer) -> Self {
        Self {
            margin_px,
            renderer,
            slots: Vec::new(),
        }
    }

    /// Starts observing a slot. Re-registering an id replaces the pending slot.
    pub fn register(&mut self, config: SlotConfig, placement: SlotPlacement) {
        self.slots
            .retain(|s| s.config.id != config.id || s.state != SlotState::Pending);
        if self.slots.iter().any(|s| s.config.id == config.id) {
            debug!(slot = %config.id, "slot already dispatched, ignoring re-registration");
            return;
        }
        self.slots.push(Slot {
            config,
            placement,
            state: SlotState::Pending,
            markup: String::new(),
        });
    }

    /// Dispatches every pending slot that intersects the viewport grown by the margin.
    pub fn observe(&mut self, viewport: &Viewport) -> Vec<LoadRequest> {
        let top = viewport.scroll_y - self.margin_px;
        let bottom = viewport.scroll_y + viewport.height + self.margin_px;

        let mut dispatched = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.state == SlotState::Pending) {
            let slot_bottom = slot.placement.top + slot.placement.height;
            if slot_bottom < top || slot.placement.top > bottom {
                continue;
            }
            slot.markup = self.renderer.skeleton(viewport.width);
            slot.state = SlotState::Loading;
            debug!(slot = %slot.config.id, "slot entered viewport");
            dispatched.push(LoadRequest {
                slot_id: slot.config.id.clone(),
                request: slot.config.request(),
            });
        }
        dispatched
    }

    /// Renders the final list into a loading slot. Returns false if the slot
    /// was not waiting for a result.
    pub fn complete(&mut self, slot_id: &str, items: &[PostSummary]) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.config.id == slot_id && s.state == SlotState::Loading)
        else {
            return false;
        };
        slot.markup = self.renderer.list(items);
        slot.state = SlotState::Loaded;
        true
    }

    pub fn slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.config.id == slot_id)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Pending)
            .count()
    }
}

/// Drives a page: each scroll position dispatches newly visible slots and
/// loads them concurrently.
pub struct PageLoader {
    scheduler: VisibilityScheduler,
    pipeline: FeedPipeline,
}

impl PageLoader {
    pub fn new(scheduler: VisibilityScheduler, pipeline: FeedPipeline) -> Self {
        Self {
            scheduler,
            pipeline,
        }
    }

    pub fn scheduler(&self) -> &VisibilityScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut VisibilityScheduler {
        &mut self.scheduler
    }

    /// Returns the number of slots loaded by this viewport change.
    pub async fn scroll_to(&mut self, viewport: Viewport) -> usize {
        let requests = self.scheduler.observe(&viewport);
        if requests.is_empty() {
            return 0;
        }
        let pipeline = &self.pipeline;
        let results = join_all(requests.into_iter().map(|load| async move {
            let items = aggregate(pipeline, &load.request).await;
            (load.slot_id, items)
        }))
        .await;

        let loaded = results.len();
        for (slot_id, items) in results {
            info!(slot = %slot_id, items = items.len(), "slot loaded");
            self.scheduler.complete(&slot_id, &items);
        }
        loaded
    }
}
