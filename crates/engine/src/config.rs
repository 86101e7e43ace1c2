//! Engine tuning knobs.

use serde::Deserialize;

/// Quotas and thresholds for the recommendation strategies.
///
/// Deserializable from a partial source; missing fields take the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Share of the limit reserved for genre affinity
    #[serde(default = "default_genre_affinity_share")]
    pub genre_affinity_share: f64,

    /// Share of the limit reserved for collaborative filtering
    #[serde(default = "default_secondary_share")]
    pub collaborative_share: f64,

    /// Share of the limit reserved for rating propagation
    #[serde(default = "default_secondary_share")]
    pub propagation_share: f64,

    /// Scores at or above this count as "liked"
    #[serde(default = "default_high_rating_threshold")]
    pub high_rating_threshold: u8,

    #[serde(default = "default_min_shared_films")]
    pub min_shared_films: u32,

    #[serde(default = "default_max_score_diff")]
    pub max_score_diff: u8,

    #[serde(default = "default_max_neighbors")]
    pub max_neighbors: usize,

    #[serde(default = "default_top_propagation_genres")]
    pub top_propagation_genres: usize,

    /// Ratings a film needs before it can trend
    #[serde(default = "default_min_trending_ratings")]
    pub min_trending_ratings: u32,
}

fn default_genre_affinity_share() -> f64 {
    0.4
}

fn default_secondary_share() -> f64 {
    0.3
}

fn default_high_rating_threshold() -> u8 {
    7
}

fn default_min_shared_films() -> u32 {
    2
}

fn default_max_score_diff() -> u8 {
    2
}

fn default_max_neighbors() -> usize {
    10
}

fn default_top_propagation_genres() -> usize {
    5
}

fn default_min_trending_ratings() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            genre_affinity_share: default_genre_affinity_share(),
            collaborative_share: default_secondary_share(),
            propagation_share: default_secondary_share(),
            high_rating_threshold: default_high_rating_threshold(),
            min_shared_films: default_min_shared_films(),
            max_score_diff: default_max_score_diff(),
            max_neighbors: default_max_neighbors(),
            top_propagation_genres: default_top_propagation_genres(),
            min_trending_ratings: default_min_trending_ratings(),
        }
    }
}
