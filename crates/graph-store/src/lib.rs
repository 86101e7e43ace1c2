//! # Graph Store Crate
//!
//! The interaction graph the recommendation engine queries: User, Film and
//! Genre nodes joined by RATED, WATCHED, FAVORITED, WATCHLIST, PREFERS and
//! HAS_GENRE edges.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Film, Genre, Rating, EdgeKind, UserStats)
//! - **store**: The `GraphStore` query trait the engine depends on
//! - **index**: `InteractionGraph`, the in-memory implementation
//! - **snapshot**: JSON load/save for `InteractionGraph`
//! - **error**: Error types for graph operations
//!
//! ## Example Usage
//!
//! ```ignore
//! use graph_store::{Film, Genre, GraphStore, InteractionGraph};
//!
//! let graph = InteractionGraph::new();
//! graph.upsert_film(&Film::new(550, "Fight Club").with_genres(vec![Genre::new(18, "Drama")]))?;
//! graph.rate("alice", 550, 9)?;
//!
//! let dramas = graph.films_by_genre(18, 20)?;
//! graph.save_snapshot(Path::new("graph.json"))?;
//! ```

pub mod error;
pub mod index;
pub mod snapshot;
pub mod store;
pub mod types;

pub use error::{GraphError, Result};
pub use index::InteractionGraph;
pub use snapshot::{GraphSnapshot, RatedEdge, TimedEdge, UserSnapshot};
pub use store::GraphStore;
pub use types::{
    // Type aliases
    FilmId,
    GenreId,
    UserId,
    // Core types
    EdgeKind,
    Film,
    Genre,
    Rating,
    RatingSummary,
    UserStats,
    // Helpers
    is_valid_score,
    MAX_SCORE,
    MIN_SCORE,
};
