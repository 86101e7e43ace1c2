//! The result type handed back to callers.

use graph_store::{Film, FilmId};
use strategies::{Candidate, CandidateSource};

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub film: Film,
    pub source: CandidateSource,
    /// The producing strategy's own ranking value
    pub score: f32,
    pub explanation: String,
}

impl Recommendation {
    pub fn film_id(&self) -> FilmId {
        self.film.id
    }
}

impl From<Candidate> for Recommendation {
    fn from(candidate: Candidate) -> Self {
        let explanation = explain(&candidate);
        Self {
            film: candidate.film,
            source: candidate.source,
            score: candidate.base_score,
            explanation,
        }
    }
}

fn explain(candidate: &Candidate) -> String {
    let meta = &candidate.metadata;
    match candidate.source {
        CandidateSource::GenreAffinity => match meta.shared_genres {
            Some(n) if n > 0 => format!("Matches {n} of your favorite genres"),
            _ => "Popular right now".to_string(),
        },
        CandidateSource::Collaborative => format!(
            "Rated {:.1} on average by {} users with similar taste",
            meta.avg_neighbor_score.unwrap_or_default(),
            meta.neighbor_ratings.unwrap_or_default()
        ),
        CandidateSource::RatingPropagation => format!(
            "Shares {} genres with films you rated highly",
            meta.matching_genres.unwrap_or_default()
        ),
        CandidateSource::Trending => format!(
            "Trending: rated {:.1} by {} users",
            meta.avg_score.unwrap_or_default(),
            meta.rating_count.unwrap_or_default()
        ),
        CandidateSource::Similar => format!(
            "Shares {} genres with this film",
            meta.shared_genres.unwrap_or_default()
        ),
        CandidateSource::Catalog => "Popular on the catalog".to_string(),
    }
}
