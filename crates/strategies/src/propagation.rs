//! Rating Propagation - more of the genres behind your best ratings
//!
//! ## Algorithm
//! 1. Count HAS_GENRE frequency across the user's highly rated films
//! 2. Keep the `top_genres` most frequent genres
//! 3. Recommend other films carrying any of them, excluding films the user
//!    watched or rated
//! 4. Rank by (matching top genres desc, popularity desc)

use std::collections::HashMap;
use std::sync::Arc;

use graph_store::{Film, FilmId, GenreId, GraphStore, Result};
use tracing::{debug, instrument};

use crate::types::{Candidate, CandidateSource, UserContext};

#[derive(Clone)]
pub struct PropagationSource {
    store: Arc<dyn GraphStore>,

    /// How many of the most frequent genres are propagated
    top_genres: usize,
}

impl PropagationSource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            top_genres: 5,
        }
    }

    /// Configure how many genres propagate (default: 5)
    pub fn with_top_genres(mut self, top: usize) -> Self {
        self.top_genres = top;
        self
    }

    /// Genres of the user's highly rated films with their frequency, most
    /// frequent first
    pub fn top_genres(&self, ctx: &UserContext) -> Result<Vec<(GenreId, u32)>> {
        let mut frequency: HashMap<GenreId, u32> = HashMap::new();
        for &film_id in &ctx.highly_rated {
            if let Some(film) = self.store.film(film_id)? {
                for genre in film.genre_ids() {
                    *frequency.entry(genre).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(GenreId, u32)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.top_genres);
        Ok(ranked)
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub fn get_candidates(&self, ctx: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        if ctx.highly_rated.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let top = self.top_genres(ctx)?;
        debug!("Propagating {} genres", top.len());

        let mut matches: HashMap<FilmId, (Film, u32)> = HashMap::new();
        for &(genre, _) in &top {
            for film in self.store.films_by_genre(genre, usize::MAX)? {
                if ctx.has_seen(film.id) {
                    continue;
                }
                matches.entry(film.id).or_insert((film, 0)).1 += 1;
            }
        }

        let mut ranked: Vec<(Film, u32)> = matches.into_values().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.0.popularity.total_cmp(&a.0.popularity))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(limit);

        let candidates: Vec<Candidate> = ranked
            .into_iter()
            .map(|(film, matching)| {
                let mut candidate =
                    Candidate::new(film, CandidateSource::RatingPropagation, matching as f32);
                candidate.metadata.matching_genres = Some(matching);
                candidate
            })
            .collect();

        debug!("Generated {} propagation candidates", candidates.len());
        Ok(candidates)
    }
}
