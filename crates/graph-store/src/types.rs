//! Core domain types for the interaction graph.
//!
//! The graph holds three node labels (User, Film, Genre) and six edge types:
//! RATED, WATCHED, FAVORITED, WATCHLIST (User -> Film), PREFERS
//! (User -> Genre) and HAS_GENRE (Film -> Genre).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up film IDs with genre IDs

/// Opaque user identifier issued by the surrounding application
pub type UserId = String;

/// Catalog film identifier (always positive)
pub type FilmId = u64;

/// Catalog genre identifier (always positive, globally unique and stable)
pub type GenreId = u32;

/// Lowest score a RATED edge may carry
pub const MIN_SCORE: u8 = 1;

/// Highest score a RATED edge may carry
pub const MAX_SCORE: u8 = 10;

// =============================================================================
// Nodes
// =============================================================================

/// A genre node. The name may be empty until the catalog genre list has been
/// synced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    #[serde(default)]
    pub name: String,
}

impl Genre {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A film node together with its HAS_GENRE associations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Catalog vote average on a 0-10 scale
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Film {
    /// Minimal film with just an id and title (handy for tests and fixtures)
    pub fn new(id: FilmId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_genres(mut self, genres: Vec<Genre>) -> Self {
        self.genres = genres;
        self
    }

    pub fn genre_ids(&self) -> impl Iterator<Item = GenreId> + '_ {
        self.genres.iter().map(|g| g.id)
    }

    pub fn has_genre(&self, genre: GenreId) -> bool {
        self.genres.iter().any(|g| g.id == genre)
    }
}

// =============================================================================
// Edges
// =============================================================================

/// The User -> Film edge types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Rated,
    Watched,
    Favorited,
    Watchlist,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EdgeKind::Rated => "RATED",
            EdgeKind::Watched => "WATCHED",
            EdgeKind::Favorited => "FAVORITED",
            EdgeKind::Watchlist => "WATCHLIST",
        };
        f.write_str(label)
    }
}

/// A RATED edge as seen from either endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub score: u8,
    pub rated_at: DateTime<Utc>,
}

/// Aggregate of the RATED edges pointing at one film
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub film_id: FilmId,
    pub avg_score: f64,
    pub rating_count: u32,
}

/// Edge counts for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub watchlist_count: usize,
    pub favorites_count: usize,
    pub watched_count: usize,
    pub rated_count: usize,
}

/// Returns true when `score` is a legal RATED score
pub fn is_valid_score(score: u8) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}
