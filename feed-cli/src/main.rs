mod page;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use feed_core::{
    aggregate, AggregateRequest, AppConfig, CacheStore, FeedPipeline, FileStorage, MemoryStorage,
    PageLoader, Renderer, SortMode, SourceKind, Storage, VisibilityScheduler,
};
use reqwest::{redirect, ClientBuilder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::page::{scroll_through, PageSpec};

#[derive(Parser)]
#[command(name = "blogfeed", about = "Render recent-post widget slots from Blogger and WordPress feeds")]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scroll through a page of slots and print each slot's final markup
    Page {
        file: PathBuf,
        #[arg(long, default_value_t = 1280.0)]
        viewport_width: f64,
        #[arg(long, default_value_t = 800.0)]
        viewport_height: f64,
        #[arg(long, default_value_t = 400.0)]
        scroll_step: f64,
    },
    /// Aggregate recent posts from one or more sources
    Fetch {
        #[arg(long, value_enum)]
        kind: Kind,
        /// Host or base URL; repeat or comma-separate for several
        #[arg(long = "source", required = true, value_delimiter = ',')]
        sources: Vec<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        count: Option<usize>,
        /// Sort newest first
        #[arg(long)]
        sort_by_date: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Wordpress,
    Blogger,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Text,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load(),
    };

    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent(config.feeds.user_agent.clone())
        .build()?;
    let storage = open_storage(cli.no_persist).await;
    let cache = CacheStore::new(storage).with_ttl(config.feeds.cache_ttl());
    let pipeline = FeedPipeline::from_config(client, cache, &config.feeds);
    let renderer = Renderer::new(config.render.clone(), config.feeds.placeholder_image.clone());

    match cli.command {
        Command::Page {
            file,
            viewport_width,
            viewport_height,
            scroll_step,
        } => {
            let page = PageSpec::load(&file).await?;
            let scheduler = VisibilityScheduler::new(config.feeds.lazy_margin_px, renderer);
            let mut loader = PageLoader::new(scheduler, pipeline);
            page.register(&mut loader, config.feeds.default_item_count)?;
            scroll_through(&mut loader, &page, viewport_width, viewport_height, scroll_step).await;

            for slot in loader.scheduler().slots() {
                println!("<!-- {} ({:?}) -->", slot.config.id, slot.state);
                println!("{}", present(&slot.markup, cli.format));
            }
        }
        Command::Fetch {
            kind,
            sources,
            category,
            count,
            sort_by_date,
        } => {
            let kind = match kind {
                Kind::Wordpress => SourceKind::WordPress,
                Kind::Blogger => SourceKind::Blogger,
            };
            let request = AggregateRequest {
                unscoped_fallback: kind == SourceKind::Blogger && sources.len() == 1,
                kind,
                sources,
                category,
                count: count.unwrap_or(config.feeds.default_item_count),
                sort: if sort_by_date {
                    SortMode::Date
                } else {
                    SortMode::Feed
                },
            };
            let items = aggregate(&pipeline, &request).await;
            info!(items = items.len(), "aggregation finished");
            println!("{}", present(&renderer.list(&items), cli.format));
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn open_storage(no_persist: bool) -> Arc<dyn Storage> {
    if no_persist {
        return Arc::new(MemoryStorage::new());
    }
    let dir = match AppConfig::config_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "no config dir, cache kept in memory");
            return Arc::new(MemoryStorage::new());
        }
    };
    Arc::new(FileStorage::open(dir.join("cache_store.json")).await)
}

fn present(markup: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Html => markup.to_string(),
        OutputFormat::Text => Renderer::to_text(markup, 100),
    }
}
