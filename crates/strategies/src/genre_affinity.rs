//! Genre Affinity - films in the genres the user said they like
//!
//! ## Algorithm
//! 1. Read the user's PREFERS genres
//! 2. Collect films carrying any of them (catalog discovery when available,
//!    otherwise the graph's HAS_GENRE index)
//! 3. Drop films the user has WATCHED
//! 4. Keep the upstream popularity order
//!
//! When the user has no preferences the standalone query substitutes the
//! global popularity list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use graph_store::{Film, FilmId, GraphStore, Result};
use tracing::{debug, instrument};

use crate::types::{Candidate, CandidateSource, UserContext};

#[derive(Clone)]
pub struct GenreAffinitySource {
    store: Arc<dyn GraphStore>,
}

impl GenreAffinitySource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Graph-only affinity candidates. Empty when the user has no PREFERS
    /// edges.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub fn get_candidates(&self, ctx: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        if ctx.preferred_genres.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut films: HashMap<FilmId, Film> = HashMap::new();
        for &genre in &ctx.preferred_genres {
            for film in self.store.films_by_genre(genre, usize::MAX)? {
                if !ctx.watched.contains(&film.id) {
                    films.entry(film.id).or_insert(film);
                }
            }
        }

        let mut films: Vec<Film> = films.into_values().collect();
        films.sort_by(|a, b| {
            b.popularity
                .total_cmp(&a.popularity)
                .then_with(|| a.id.cmp(&b.id))
        });

        let candidates = self.rank_films(ctx, films, limit);
        debug!("Generated {} genre-affinity candidates from graph", candidates.len());
        Ok(candidates)
    }

    /// Turn an already-ordered film list (e.g. catalog discovery results)
    /// into candidates: watched films and duplicates are dropped, order is
    /// kept.
    pub fn rank_films(&self, ctx: &UserContext, films: Vec<Film>, limit: usize) -> Vec<Candidate> {
        let preferred: HashSet<_> = ctx.preferred_genres.iter().copied().collect();
        let mut seen = HashSet::new();

        films
            .into_iter()
            .filter(|film| !ctx.watched.contains(&film.id))
            .filter(|film| seen.insert(film.id))
            .take(limit)
            .map(|film| {
                let shared = film.genre_ids().filter(|g| preferred.contains(g)).count() as u32;
                let mut candidate =
                    Candidate::new(film, CandidateSource::GenreAffinity, 0.0);
                candidate.base_score = candidate.film.popularity as f32;
                candidate.metadata.shared_genres = Some(shared);
                candidate
            })
            .collect()
    }

    /// Most popular films in the graph, excluding watched ones
    pub fn popularity_substitute(&self, ctx: &UserContext, limit: usize) -> Result<Vec<Candidate>> {
        let films = self
            .store
            .popular_films(limit.saturating_add(ctx.watched.len()))?;
        Ok(self.rank_films(ctx, films, limit))
    }
}
