//! Catalog client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings for [`CatalogClient`](crate::CatalogClient).
///
/// Every field has a default so a config can be deserialized from a partial
/// source (environment, JSON) and only override what it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Catalog v3 API key, sent as the `api_key` query parameter
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as the `language` query parameter
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Per-item cache time-to-live
    #[serde(default = "default_item_ttl_secs")]
    pub item_ttl_secs: u64,

    /// Per-list cache time-to-live
    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Worker count for batch fetches
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Time budget for each unit of a batch fetch
    #[serde(default = "default_batch_unit_timeout_secs")]
    pub batch_unit_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "fr-FR".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_item_ttl_secs() -> u64 {
    30 * 60
}

fn default_list_ttl_secs() -> u64 {
    10 * 60
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_batch_concurrency() -> usize {
    5
}

fn default_batch_unit_timeout_secs() -> u64 {
    10
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            language: default_language(),
            image_base_url: default_image_base_url(),
            item_ttl_secs: default_item_ttl_secs(),
            list_ttl_secs: default_list_ttl_secs(),
            connect_timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_timeout_secs(),
            batch_concurrency: default_batch_concurrency(),
            batch_unit_timeout_secs: default_batch_unit_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn item_ttl(&self) -> Duration {
        Duration::from_secs(self.item_ttl_secs)
    }

    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_unit_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_unit_timeout_secs)
    }
}
