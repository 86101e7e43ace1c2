//! Candidate and user-context types shared by every strategy.

use std::collections::{HashMap, HashSet};
use std::fmt;

use graph_store::{Film, FilmId, GenreId, UserId};

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Films in the user's preferred genres
    GenreAffinity,
    /// Films liked by users who rate like this user
    Collaborative,
    /// Films in the genres of the user's highly rated films
    RatingPropagation,
    /// Films with many good ratings across all users
    Trending,
    /// Films sharing genres with a seed film
    Similar,
    /// Films pulled from a catalog list
    Catalog,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandidateSource::GenreAffinity => "genre-affinity",
            CandidateSource::Collaborative => "collaborative",
            CandidateSource::RatingPropagation => "rating-propagation",
            CandidateSource::Trending => "trending",
            CandidateSource::Similar => "similar",
            CandidateSource::Catalog => "catalog",
        };
        f.write_str(label)
    }
}

/// The numbers a strategy ranked on, kept for explanations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMetadata {
    /// Preferred (or seed) genres the film carries
    pub shared_genres: Option<u32>,
    /// Neighbor ratings that contributed
    pub neighbor_ratings: Option<u32>,
    /// Average score of those neighbor ratings
    pub avg_neighbor_score: Option<f64>,
    /// Top propagation genres the film carries
    pub matching_genres: Option<u32>,
    pub rating_count: Option<u32>,
    pub avg_score: Option<f64>,
}

/// A film proposed by one strategy
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub film: Film,
    pub source: CandidateSource,
    /// Strategy-specific primary ranking value (higher is better)
    pub base_score: f32,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(film: Film, source: CandidateSource, base_score: f32) -> Self {
        Self {
            film,
            source,
            base_score,
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn film_id(&self) -> FilmId {
        self.film.id
    }
}

/// Everything the strategies need to know about one user, read from the
/// graph once per request
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,
    /// Films with a WATCHED edge
    pub watched: HashSet<FilmId>,
    /// Films with a RATED edge and their score
    pub rated: HashMap<FilmId, u8>,
    /// PREFERS targets
    pub preferred_genres: Vec<GenreId>,
    /// Rated films at or above the high-rating threshold, best first
    pub highly_rated: Vec<FilmId>,
}

impl UserContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Watched or rated
    pub fn has_seen(&self, film: FilmId) -> bool {
        self.watched.contains(&film) || self.rated.contains_key(&film)
    }

    /// True when the user has no signal any personal strategy can use
    pub fn is_cold(&self) -> bool {
        self.rated.is_empty() && self.preferred_genres.is_empty()
    }
}
