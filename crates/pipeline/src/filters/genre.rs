//! Filter to keep only films carrying a given genre.
//!
//! Catalog discovery results are not guaranteed to match the requested
//! genre; this filter enforces it before they are merged with graph results.

use crate::traits::Filter;
use anyhow::Result;
use graph_store::GenreId;
use strategies::{Candidate, UserContext};

/// Keeps only candidates whose film has a HAS_GENRE edge to `genre`.
pub struct GenreFilter {
    genre: GenreId,
}

impl GenreFilter {
    pub fn new(genre: GenreId) -> Self {
        Self { genre }
    }
}

impl Filter for GenreFilter {
    fn name(&self) -> &str {
        "GenreFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &UserContext) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.film.has_genre(self.genre))
            .collect())
    }
}
