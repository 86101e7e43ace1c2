//! Process configuration, read from the environment (and `.env`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog::CatalogConfig;
use engine::EngineConfig;
use serde::Deserialize;

/// Settings for the binary itself, from `REEL_*` variables
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Graph snapshot loaded at startup and written after mutations
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,

    /// Period of the catalog cache eviction tick for long-running commands
    #[serde(default = "default_cache_maintenance_secs")]
    pub cache_maintenance_secs: u64,
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("data/graph.json")
}

fn default_cache_maintenance_secs() -> u64 {
    60
}

/// Everything the binary needs to build an engine
#[derive(Debug, Clone)]
pub struct Settings {
    pub app: AppConfig,
    /// `REEL_CATALOG_*`, e.g. `REEL_CATALOG_API_KEY`
    pub catalog: CatalogConfig,
    /// `REEL_ENGINE_*`, e.g. `REEL_ENGINE_MAX_NEIGHBORS`
    pub engine: EngineConfig,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let catalog = envy::prefixed("REEL_CATALOG_")
            .from_env::<CatalogConfig>()
            .context("Failed to load catalog config")?;
        let engine = envy::prefixed("REEL_ENGINE_")
            .from_env::<EngineConfig>()
            .context("Failed to load engine config")?;
        let app = envy::prefixed("REEL_")
            .from_env::<AppConfig>()
            .context("Failed to load app config")?;

        Ok(Self {
            app,
            catalog,
            engine,
        })
    }
}
