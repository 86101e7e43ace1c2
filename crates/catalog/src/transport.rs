//! The HTTP seam of the catalog client.
//!
//! [`CatalogTransport`] performs one GET and returns the decoded JSON body.
//! [`HttpTransport`] is the production implementation; tests plug in fakes
//! that serve canned payloads, count requests and inject failures.

use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};

/// One GET against the catalog API
#[async_trait::async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Fetch `path` (relative to the API root, e.g. `/movie/550`) with the
    /// given extra query parameters. Authentication and language parameters
    /// are the transport's concern.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;
}

/// `reqwest`-backed transport with gzip and short connect/read timeouts
#[derive(Clone)]
pub struct HttpTransport {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    language: String,
}

impl HttpTransport {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .gzip(true)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }
}

#[async_trait::async_trait]
impl CatalogTransport for HttpTransport {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "Catalog GET");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
