//! # Engine Crate
//!
//! Blends the recommendation strategies over the interaction graph and the
//! cached catalog into one deduplicated, quota-balanced list.
//!
//! ## Main Components
//!
//! - **engine**: `RecommendationEngine`, the personalized merge and the
//!   standalone strategy, similar-films and by-genre queries
//! - **actions**: validated user actions (rate, watch, favorite, watchlist,
//!   preferences) and film lookups
//! - **sync**: `CatalogSync`, idempotent write-through from catalog to graph
//! - **config**: `EngineConfig` quotas and thresholds
//! - **error**: `EngineError`
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::RecommendationEngine;
//!
//! let engine = RecommendationEngine::new(graph, catalog);
//! engine.set_preferred_genres("u1", &[28]).await?;
//! engine.rate_film("u1", 550, 9).await?;
//!
//! for rec in engine.personalized_recommendations(Some("u1"), 20).await? {
//!     println!("{} [{}] {}", rec.film.title, rec.source, rec.explanation);
//! }
//! ```

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod recommendation;
pub mod sync;

pub use config::EngineConfig;
pub use engine::RecommendationEngine;
pub use error::{EngineError, Result};
pub use recommendation::Recommendation;
pub use sync::CatalogSync;
