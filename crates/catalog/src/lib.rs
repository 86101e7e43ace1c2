//! # Catalog Crate
//!
//! Best-effort client for the external, read-only movie catalog.
//!
//! ## Main Components
//!
//! - **client**: `CatalogClient` with item/list caches, batch fetch and the genre map
//! - **cache**: `TtlCache`, a concurrent time-bounded map
//! - **list**: `ListKind`, the list endpoints the client can page through
//! - **credits**: cast, crew and person lookups
//! - **transport**: the `CatalogTransport` seam and its `reqwest` implementation
//! - **config**: `CatalogConfig` (TTLs, timeouts, batch sizing)
//! - **error**: `CatalogError`
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogClient, CatalogConfig, ListKind};
//!
//! let client = CatalogClient::new(CatalogConfig::default().with_api_key(key))?;
//!
//! // Cached for 30 minutes; None if the catalog is unreachable
//! let film = client.get_item_details(550).await?;
//!
//! // Cached per (kind, page) for 10 minutes
//! let popular = client.get_list(ListKind::Popular, 1).await;
//!
//! // At most 5 concurrent fetches, 10s each, failures dropped
//! let films = client.get_items_in_parallel(&[550, 603, 13]).await;
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod credits;
pub mod error;
pub mod list;
pub mod transport;
mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::TtlCache;
pub use client::{CatalogClient, ItemCache, ListCache};
pub use config::CatalogConfig;
pub use credits::{DEFAULT_CAST_LIMIT, Person};
pub use error::{CatalogError, Result};
pub use list::ListKind;
pub use transport::{CatalogTransport, HttpTransport};
