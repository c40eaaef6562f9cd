pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod jsonp;
pub mod normalize;
pub mod pipeline;
pub mod post;
pub mod render;
pub mod scheduler;
pub mod slot;
pub mod source;
pub mod storage;

pub use aggregate::{aggregate, sort_by_date_desc, AggregateRequest, SortMode};
pub use cache::{CacheStore, DEFAULT_TTL};
pub use config::{AppConfig, FeedConfig, RenderConfig};
pub use error::{CallbackError, FetchError, SlotError, StorageError};
pub use jsonp::CallbackRegistry;
pub use normalize::NormalizeOptions;
pub use pipeline::FeedPipeline;
pub use post::PostSummary;
pub use render::Renderer;
pub use scheduler::{LoadRequest, PageLoader, Viewport, VisibilityScheduler};
pub use slot::{LoaderKind, Slot, SlotConfig, SlotPlacement, SlotState};
pub use source::{BloggerSource, FeedQuery, FeedSource, SourceKind, WordPressSource};
pub use storage::{FileStorage, MemoryStorage, Storage};
