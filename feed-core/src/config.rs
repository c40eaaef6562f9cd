use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::NormalizeOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feeds: FeedConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
    pub lazy_margin_px: f64,
    pub default_item_count: usize,
    pub thumbnail_size: u32,
    pub placeholder_image: String,
    pub date_format: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub skeleton_breakpoint_px: f64,
    pub skeleton_rows_wide: usize,
    pub skeleton_rows_narrow: usize,
    pub empty_message: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            request_timeout_seconds: 8,
            lazy_margin_px: 400.0,
            default_item_count: 5,
            thumbnail_size: 150,
            placeholder_image: "https://placehold.co/70x50".to_string(),
            // id-ID short date, e.g. 7/3/2024
            date_format: "%-d/%-m/%Y".to_string(),
            user_agent: "blogfeed/0.1".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            skeleton_breakpoint_px: 768.0,
            skeleton_rows_wide: 4,
            skeleton_rows_narrow: 2,
            empty_message: "Tidak ada konten.".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            placeholder_image: self.placeholder_image.clone(),
            thumbnail_size: self.thumbnail_size,
            date_format: self.date_format.clone(),
        }
    }
}

impl AppConfig {
    /// Dossier de configuration de l'application (créé si absent)
    pub fn config_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir =
            dirs::config_dir().ok_or("unable to locate the user configuration directory")?;

        let app_config_dir = config_dir.join("blogfeed");
        std::fs::create_dir_all(&app_config_dir)?;

        Ok(app_config_dir)
    }

    pub fn config_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads the configuration file, or writes and returns the defaults.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "unable to load configuration, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    warn!(error = %save_err, "unable to save default configuration");
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        Self::load_from_path(config_path)
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_content = std::fs::read_to_string(path.into())?;
        let config: AppConfig = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let config_json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, config_json)?;
        Ok(())
    }
}
