//! Trending - the best-rated films across all users
//!
//! Films need at least `min_ratings` RATED edges; they are ranked by
//! (average score desc, rating count desc). Catalog backfill for short
//! results is the engine's job.

use std::sync::Arc;

use graph_store::{GraphStore, RatingSummary, Result};
use tracing::{debug, instrument};

use crate::types::{Candidate, CandidateSource};

#[derive(Clone)]
pub struct TrendingSource {
    store: Arc<dyn GraphStore>,

    /// Minimum RATED edges for a film to trend
    min_ratings: u32,
}

impl TrendingSource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            min_ratings: 3,
        }
    }

    /// Configure the rating count floor (default: 3)
    pub fn with_min_ratings(mut self, min: u32) -> Self {
        self.min_ratings = min;
        self
    }

    #[instrument(skip(self))]
    pub fn get_candidates(&self, limit: usize) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut summaries: Vec<RatingSummary> = self.store.rating_summaries(self.min_ratings)?;
        summaries.sort_by(|a, b| {
            b.avg_score
                .total_cmp(&a.avg_score)
                .then_with(|| b.rating_count.cmp(&a.rating_count))
                .then_with(|| a.film_id.cmp(&b.film_id))
        });

        let mut candidates = Vec::with_capacity(limit.min(summaries.len()));
        for summary in summaries {
            if candidates.len() >= limit {
                break;
            }
            let Some(film) = self.store.film(summary.film_id)? else {
                continue;
            };
            let mut candidate =
                Candidate::new(film, CandidateSource::Trending, summary.avg_score as f32);
            candidate.metadata.avg_score = Some(summary.avg_score);
            candidate.metadata.rating_count = Some(summary.rating_count);
            candidates.push(candidate);
        }

        debug!("Generated {} trending candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::{Film, FilmId, InteractionGraph};

    fn create_test_store() -> Arc<InteractionGraph> {
        let graph = InteractionGraph::new();
        for id in 1..=4 {
            graph.upsert_film(&Film::new(id, format!("Film {id}"))).unwrap();
        }
        // Film 1: avg 8 over 3; film 2: avg 8 over 4; film 3: avg 9 over 3;
        // film 4: only two ratings
        for (user, film, score) in [
            ("a", 1, 8), ("b", 1, 8), ("c", 1, 8),
            ("a", 2, 8), ("b", 2, 8), ("c", 2, 8), ("d", 2, 8),
            ("a", 3, 9), ("b", 3, 9), ("c", 3, 9),
            ("a", 4, 10), ("b", 4, 10),
        ] {
            graph.rate(user, film, score).unwrap();
        }
        Arc::new(graph)
    }

    #[test]
    fn test_ranked_by_average_then_count() {
        let source = TrendingSource::new(create_test_store());
        let ids: Vec<FilmId> = source
            .get_candidates(10)
            .unwrap()
            .iter()
            .map(|c| c.film_id())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_limit_and_threshold() {
        let source = TrendingSource::new(create_test_store()).with_min_ratings(2);
        let candidates = source.get_candidates(1).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].film_id(), 4);
        assert_eq!(candidates[0].metadata.rating_count, Some(2));
    }

    #[test]
    fn test_empty_graph_has_no_trending() {
        let source = TrendingSource::new(Arc::new(InteractionGraph::new()));
        assert!(source.get_candidates(5).unwrap().is_empty());
    }
}
