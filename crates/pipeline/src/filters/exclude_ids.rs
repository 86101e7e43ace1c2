//! Filter to drop a fixed set of film ids, e.g. films already selected by
//! an earlier stage or the seed of a similarity query.

use std::collections::HashSet;

use crate::traits::Filter;
use anyhow::Result;
use graph_store::FilmId;
use strategies::{Candidate, UserContext};

pub struct ExcludeIdsFilter {
    excluded: HashSet<FilmId>,
}

impl ExcludeIdsFilter {
    pub fn new(excluded: impl IntoIterator<Item = FilmId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }
}

impl Filter for ExcludeIdsFilter {
    fn name(&self) -> &str {
        "ExcludeIdsFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &UserContext) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| !self.excluded.contains(&candidate.film_id()))
            .collect())
    }
}
