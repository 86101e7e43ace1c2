//! Error types for the catalog client.
//!
//! Only [`CatalogError::InvalidArgument`] ever reaches a caller of
//! [`CatalogClient`](crate::CatalogClient). The transport variants are
//! produced by a [`CatalogTransport`](crate::CatalogTransport) and converted
//! to absence (or an empty list) inside the client.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Caller broke the contract (for example asked for film id 0)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection, TLS or body read failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-2xx status
    #[error("Catalog returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// The body was not the JSON shape we expected
    #[error("Malformed catalog payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A batch unit exceeded its time budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl CatalogError {
    /// True for failures that are converted to "no data" at the client
    /// boundary
    pub fn is_transient(&self) -> bool {
        !matches!(self, CatalogError::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
