//! Filtering and merging of strategy candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - QuotaMerge for blending strategy outputs under per-strategy quotas
//!
//! ## Architecture
//! A recommendation request moves candidates through two stages:
//! 1. Filters remove unwanted candidates (already watched, wrong genre, already selected)
//! 2. QuotaMerge takes each strategy's share in order, first-seen wins,
//!    then backfills up to the limit
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{quota, FilterPipeline, QuotaMerge};
//! use pipeline::filters::*;
//!
//! let pipeline = FilterPipeline::new().add_filter(AlreadyWatchedFilter);
//!
//! let mut merge = QuotaMerge::new(limit);
//! merge.take(pipeline.apply(genre_candidates, &context)?, quota(limit, 0.4));
//! merge.take(pipeline.apply(collab_candidates, &context)?, quota(limit, 0.3));
//! merge.fill(trending_candidates);
//! let recommendations = merge.finish();
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod merge;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use merge::{quota, QuotaMerge};
pub use traits::Filter;
