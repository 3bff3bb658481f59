use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Any valid symbol works; its page carries the full code dropdown.
    #[serde(default = "default_catalog_code")]
    pub catalog_code: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_code_concurrency")]
    pub code_concurrency: usize,

    #[serde(default = "default_window_concurrency")]
    pub window_concurrency: usize,

    /// History depth for a code with no stored series.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u64,

    /// Leading character of non-equity instruments (bonds etc.).
    #[serde(default = "default_excluded_prefix")]
    pub excluded_prefix: char,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.mse.mk/en/stats/symbolhistory".to_string()
}
fn default_catalog_code() -> String {
    "ADIN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "mse-history/0.1 (incremental symbol history scraper)".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_code_concurrency() -> usize {
    5
}
fn default_window_concurrency() -> usize {
    3
}
fn default_lookback_days() -> u64 {
    3650
}
fn default_excluded_prefix() -> char {
    'E'
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            catalog_code: default_catalog_code(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            code_concurrency: default_code_concurrency(),
            window_concurrency: default_window_concurrency(),
            lookback_days: default_lookback_days(),
            excluded_prefix: default_excluded_prefix(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("MSE").separator("__"))
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize()
            .context("Invalid configuration")
    }
}
