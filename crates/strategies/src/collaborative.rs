//! Collaborative Filtering - "users who rate like you liked these"
//!
//! ## Algorithm
//! 1. For every film the target user rated, read the other RATED edges on it
//! 2. A rating agrees when the two scores differ by at most `max_score_diff`;
//!    users with at least `min_shared_films` agreeing films are neighbors
//! 3. Rank neighbors by (agreeing films desc, average difference asc) and
//!    keep the top `max_neighbors`
//! 4. Collect the neighbors' ratings at or above `high_rating_threshold` on
//!    films the target has neither watched nor rated
//! 5. Rank films by (average neighbor score desc, contributing ratings desc)

use std::collections::HashMap;
use std::sync::Arc;

use graph_store::{FilmId, GraphStore, Rating, Result, UserId};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::types::{Candidate, CandidateSource, UserContext};

/// A user whose ratings agree with the target user's
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub user_id: UserId,
    pub shared_films: u32,
    pub avg_score_diff: f64,
}

#[derive(Clone)]
pub struct CollaborativeSource {
    /// Shared read access to the graph
    store: Arc<dyn GraphStore>,

    /// Minimum neighbor score for a film to be recommended
    high_rating_threshold: u8,

    /// Agreeing films needed before a user counts as a neighbor
    min_shared_films: u32,

    /// Largest score difference that still counts as agreement
    max_score_diff: u8,

    max_neighbors: usize,
}

impl CollaborativeSource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            high_rating_threshold: 7,
            min_shared_films: 2,
            max_score_diff: 2,
            max_neighbors: 10,
        }
    }

    /// Configure the neighbor score threshold (default: 7)
    pub fn with_high_rating_threshold(mut self, threshold: u8) -> Self {
        self.high_rating_threshold = threshold;
        self
    }

    /// Configure agreeing films needed per neighbor (default: 2)
    pub fn with_min_shared_films(mut self, min: u32) -> Self {
        self.min_shared_films = min;
        self
    }

    /// Configure the agreement tolerance (default: 2)
    pub fn with_max_score_diff(mut self, diff: u8) -> Self {
        self.max_score_diff = diff;
        self
    }

    /// Configure how many neighbors contribute (default: 10)
    pub fn with_max_neighbors(mut self, max: usize) -> Self {
        self.max_neighbors = max;
        self
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub fn get_candidates(&self, ctx: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        if ctx.rated.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let neighbors = self.find_neighbors(ctx)?;
        debug!("Found {} neighbors", neighbors.len());
        if neighbors.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(FilmId, u32, u32)> = self
            .candidate_scores(&neighbors, ctx)?
            .into_iter()
            .map(|(film_id, (total, count))| (film_id, total, count))
            .collect();

        // (avg desc, count desc, id asc); averages compared exactly as
        // total_a * count_b vs total_b * count_a
        scored.sort_by(|a, b| {
            (u64::from(b.1) * u64::from(a.2))
                .cmp(&(u64::from(a.1) * u64::from(b.2)))
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut candidates = Vec::with_capacity(limit.min(scored.len()));
        for (film_id, total, count) in scored {
            if candidates.len() >= limit {
                break;
            }
            let Some(film) = self.store.film(film_id)? else {
                continue;
            };
            let avg = f64::from(total) / f64::from(count);
            let mut candidate = Candidate::new(film, CandidateSource::Collaborative, avg as f32);
            candidate.metadata.avg_neighbor_score = Some(avg);
            candidate.metadata.neighbor_ratings = Some(count);
            candidates.push(candidate);
        }

        debug!("Generated {} collaborative candidates", candidates.len());
        Ok(candidates)
    }

    /// Users whose ratings agree with the target's on enough films, best
    /// first
    pub fn find_neighbors(&self, ctx: &UserContext) -> Result<Vec<Neighbor>> {
        let per_film: Vec<(u8, Vec<Rating>)> = ctx
            .rated
            .iter()
            .map(|(&film_id, &score)| -> Result<(u8, Vec<Rating>)> {
                Ok((score, self.store.film_ratings(film_id)?))
            })
            .collect::<Result<_>>()?;

        // user -> (agreeing films, summed difference)
        let agreement = per_film
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<&str, (u32, u32)>, (own, ratings)| {
                for rating in ratings {
                    if rating.user_id == ctx.user_id {
                        continue;
                    }
                    let diff = own.abs_diff(rating.score);
                    if diff <= self.max_score_diff {
                        let entry = local.entry(rating.user_id.as_str()).or_insert((0, 0));
                        entry.0 += 1;
                        entry.1 += u32::from(diff);
                    }
                }
                local
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (user, (count, diff)) in local {
                    let entry = acc.entry(user).or_insert((0, 0));
                    entry.0 += count;
                    entry.1 += diff;
                }
                acc
            });

        let mut neighbors: Vec<Neighbor> = agreement
            .into_iter()
            .filter(|(_, (count, _))| *count >= self.min_shared_films)
            .map(|(user, (count, diff))| Neighbor {
                user_id: user.to_string(),
                shared_films: count,
                avg_score_diff: f64::from(diff) / f64::from(count),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.shared_films
                .cmp(&a.shared_films)
                .then_with(|| a.avg_score_diff.total_cmp(&b.avg_score_diff))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        neighbors.truncate(self.max_neighbors);
        Ok(neighbors)
    }

    /// film -> (summed neighbor score, contributing ratings)
    fn candidate_scores(
        &self,
        neighbors: &[Neighbor],
        ctx: &UserContext,
    ) -> Result<HashMap<FilmId, (u32, u32)>> {
        let neighbor_ratings: Vec<Vec<Rating>> = neighbors
            .iter()
            .map(|n| self.store.user_ratings(&n.user_id))
            .collect::<Result<_>>()?;

        let scores = neighbor_ratings
            .par_iter()
            .fold(HashMap::new, |mut local: HashMap<FilmId, (u32, u32)>, ratings| {
                for rating in ratings {
                    if rating.score >= self.high_rating_threshold && !ctx.has_seen(rating.film_id) {
                        let entry = local.entry(rating.film_id).or_insert((0, 0));
                        entry.0 += u32::from(rating.score);
                        entry.1 += 1;
                    }
                }
                local
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (film_id, (total, count)) in local {
                    let entry = acc.entry(film_id).or_insert((0, 0));
                    entry.0 += total;
                    entry.1 += count;
                }
                acc
            });
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_context::build_user_context;
    use graph_store::{Film, InteractionGraph};

    /// Target "me" rated films 1-3. "close" agrees on all three, "near"
    /// agrees on two, "far" disagrees everywhere, "lone" agrees on one.
    fn create_test_store() -> Arc<InteractionGraph> {
        let graph = InteractionGraph::new();
        for id in 1..=9 {
            graph
                .upsert_film(&Film::new(id, format!("Film {id}")).with_popularity(id as f64))
                .unwrap();
        }

        for (film, score) in [(1, 8), (2, 9), (3, 4)] {
            graph.rate("me", film, score).unwrap();
        }
        for (film, score) in [(1, 8), (2, 8), (3, 5), (4, 9), (5, 7), (6, 6)] {
            graph.rate("close", film, score).unwrap();
        }
        for (film, score) in [(1, 10), (2, 7), (3, 10), (4, 7), (7, 10)] {
            graph.rate("near", film, score).unwrap();
        }
        for (film, score) in [(1, 1), (2, 2), (3, 10), (8, 10)] {
            graph.rate("far", film, score).unwrap();
        }
        for (film, score) in [(1, 8), (9, 10)] {
            graph.rate("lone", film, score).unwrap();
        }
        graph.mark_watched("me", 5).unwrap();
        Arc::new(graph)
    }

    #[test]
    fn test_neighbors_ranked_by_agreement() {
        let store = create_test_store();
        let ctx = build_user_context(store.as_ref(), "me", 7).unwrap();
        let source = CollaborativeSource::new(store);

        let neighbors = source.find_neighbors(&ctx).unwrap();
        let ids: Vec<&str> = neighbors.iter().map(|n| n.user_id.as_str()).collect();
        assert_eq!(ids, vec!["close", "near"]);
        assert_eq!(neighbors[0].shared_films, 3);
        assert!((neighbors[0].avg_score_diff - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_exclude_seen_and_low_scores() {
        let store = create_test_store();
        let ctx = build_user_context(store.as_ref(), "me", 7).unwrap();
        let source = CollaborativeSource::new(store);

        let candidates = source.get_candidates(&ctx, 10).unwrap();
        let ids: Vec<FilmId> = candidates.iter().map(|c| c.film_id()).collect();

        // 7: avg 10 from near; 4: avg 8 from two neighbors; 5 watched,
        // 6 below threshold, 8 and 9 from non-neighbors
        assert_eq!(ids, vec![7, 4]);
        assert_eq!(candidates[1].metadata.neighbor_ratings, Some(2));
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Collaborative));
    }

    #[test]
    fn test_no_ratings_no_candidates() {
        let store = create_test_store();
        let source = CollaborativeSource::new(store);
        let ctx = UserContext::new("stranger");
        assert!(source.get_candidates(&ctx, 10).unwrap().is_empty());
    }

    #[test]
    fn test_max_neighbors_caps_contributors() {
        let store = create_test_store();
        let ctx = build_user_context(store.as_ref(), "me", 7).unwrap();
        let source = CollaborativeSource::new(store).with_max_neighbors(1);

        let ids: Vec<FilmId> = source
            .get_candidates(&ctx, 10)
            .unwrap()
            .iter()
            .map(|c| c.film_id())
            .collect();
        assert_eq!(ids, vec![4]);
    }
}
