//! The query surface the recommendation engine depends on.
//!
//! Any store that supports match-by-key, upsert-by-key, traversal with
//! aggregation and edge existence checks can sit behind this trait. The
//! in-memory [`InteractionGraph`](crate::InteractionGraph) is the reference
//! implementation.

use std::collections::HashSet;

use crate::error::Result;
use crate::types::{
    EdgeKind, Film, FilmId, Genre, GenreId, Rating, RatingSummary, UserStats,
};

/// Parameterized pattern queries over the User/Film/Genre graph.
///
/// Each call is its own atomic unit of work; no transaction spans calls.
/// `Send + Sync` so a single store can be shared behind an `Arc` by the
/// engine, the sync adapter and blocking strategy tasks.
pub trait GraphStore: Send + Sync {
    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    fn film(&self, id: FilmId) -> Result<Option<Film>>;

    fn genre(&self, id: GenreId) -> Result<Option<Genre>>;

    /// All genres ordered by name
    fn all_genres(&self) -> Result<Vec<Genre>>;

    /// Films carrying `genre`, popularity descending
    fn films_by_genre(&self, genre: GenreId, limit: usize) -> Result<Vec<Film>>;

    /// All films, popularity descending
    fn popular_films(&self, limit: usize) -> Result<Vec<Film>>;

    /// Case-insensitive title substring match, popularity descending
    fn search_films(&self, title: &str, limit: usize) -> Result<Vec<Film>>;

    /// Merge a film by id: properties are overwritten, HAS_GENRE edges are
    /// only ever added, and missing genre nodes are created.
    fn upsert_film(&self, film: &Film) -> Result<()>;

    /// Merge a genre by id. A non-empty name replaces the stored one; an
    /// empty name never clobbers an existing one.
    fn upsert_genre(&self, genre: &Genre) -> Result<()>;

    // ---------------------------------------------------------------------
    // Edge reads
    // ---------------------------------------------------------------------

    /// RATED edges leaving `user`, most recent first
    fn user_ratings(&self, user: &str) -> Result<Vec<Rating>>;

    /// RATED edges entering `film`
    fn film_ratings(&self, film: FilmId) -> Result<Vec<Rating>>;

    fn user_rating(&self, user: &str, film: FilmId) -> Result<Option<u8>>;

    /// Average score and count for every film with at least `min_count`
    /// RATED edges (unordered)
    fn rating_summaries(&self, min_count: u32) -> Result<Vec<RatingSummary>>;

    /// Ids of films `user` reaches through `kind`
    fn edge_targets(&self, user: &str, kind: EdgeKind) -> Result<HashSet<FilmId>>;

    /// Films `user` reaches through `kind`, ordered by title
    /// (RATED: most recently rated first)
    fn films_for_edge(&self, user: &str, kind: EdgeKind) -> Result<Vec<Film>>;

    fn has_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<bool>;

    /// PREFERS targets ordered by name
    fn preferred_genres(&self, user: &str) -> Result<Vec<Genre>>;

    fn user_stats(&self, user: &str) -> Result<UserStats>;

    // ---------------------------------------------------------------------
    // Edge writes
    // ---------------------------------------------------------------------

    /// Create or overwrite the single RATED edge between `user` and `film`
    fn rate(&self, user: &str, film: FilmId, score: u8) -> Result<()>;

    /// Create a WATCHED, FAVORITED or WATCHLIST edge. Existing edges keep
    /// their original timestamp.
    fn add_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<()>;

    /// Remove an edge of any kind; returns whether one existed
    fn remove_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<bool>;

    /// Replace the PREFERS set wholesale
    fn set_preferred_genres(&self, user: &str, genres: &[GenreId]) -> Result<()>;

    fn add_preferred_genre(&self, user: &str, genre: GenreId) -> Result<()>;

    fn remove_preferred_genre(&self, user: &str, genre: GenreId) -> Result<bool>;

    // ---------------------------------------------------------------------
    // Named shorthands
    // ---------------------------------------------------------------------

    fn watched(&self, user: &str) -> Result<Vec<Film>> {
        self.films_for_edge(user, EdgeKind::Watched)
    }

    fn favorites(&self, user: &str) -> Result<Vec<Film>> {
        self.films_for_edge(user, EdgeKind::Favorited)
    }

    fn watchlist(&self, user: &str) -> Result<Vec<Film>> {
        self.films_for_edge(user, EdgeKind::Watchlist)
    }

    fn remove_rating(&self, user: &str, film: FilmId) -> Result<bool> {
        self.remove_edge(user, film, EdgeKind::Rated)
    }

    fn mark_watched(&self, user: &str, film: FilmId) -> Result<()> {
        self.add_edge(user, film, EdgeKind::Watched)
    }

    fn add_favorite(&self, user: &str, film: FilmId) -> Result<()> {
        self.add_edge(user, film, EdgeKind::Favorited)
    }

    fn remove_favorite(&self, user: &str, film: FilmId) -> Result<bool> {
        self.remove_edge(user, film, EdgeKind::Favorited)
    }

    fn add_to_watchlist(&self, user: &str, film: FilmId) -> Result<()> {
        self.add_edge(user, film, EdgeKind::Watchlist)
    }

    fn remove_from_watchlist(&self, user: &str, film: FilmId) -> Result<bool> {
        self.remove_edge(user, film, EdgeKind::Watchlist)
    }
}
