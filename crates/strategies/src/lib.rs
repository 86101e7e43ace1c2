//! # Strategies Crate
//!
//! The scoring strategies behind personalized recommendations. Each one
//! reads the interaction graph through `GraphStore` and returns ranked
//! `Candidate`s; merging and quotas live in the `pipeline` crate.
//!
//! ## Components
//!
//! ### Genre Affinity
//! Films in the user's PREFERS genres, popularity ordered, minus watched.
//!
//! ### Collaborative Filtering
//! Neighbors are users whose scores agree (difference <= 2) on at least two
//! shared films; their highly rated films become candidates.
//!
//! ### Rating Propagation
//! The five most frequent genres among the user's highly rated films,
//! ranked by how many of them a film carries.
//!
//! ### Trending
//! Films with at least three ratings, by average score then rating count.
//!
//! ### Similar
//! Genre overlap with a seed film.
//!
//! ## Example Usage
//!
//! ```ignore
//! use strategies::{CollaborativeSource, TrendingSource, build_user_context};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn GraphStore> = Arc::new(InteractionGraph::load_snapshot(path)?);
//! let context = build_user_context(store.as_ref(), "alice", 7)?;
//!
//! let collaborative = CollaborativeSource::new(store.clone()).with_max_neighbors(10);
//! let picks = collaborative.get_candidates(&context, 3)?;
//!
//! let trending = TrendingSource::new(store.clone()).get_candidates(10)?;
//! ```

pub mod collaborative;
pub mod genre_affinity;
pub mod propagation;
pub mod similar;
pub mod trending;
pub mod types;
pub mod user_context;

pub use collaborative::{CollaborativeSource, Neighbor};
pub use genre_affinity::GenreAffinitySource;
pub use propagation::PropagationSource;
pub use similar::SimilarSource;
pub use trending::TrendingSource;
pub use types::{Candidate, CandidateMetadata, CandidateSource, UserContext};
pub use user_context::build_user_context;
