//! Filter to remove films the user has already watched.
//!
//! This is typically the first filter in the pipeline, as there's no
//! point in recommending films the user has already seen.

use crate::traits::Filter;
use anyhow::Result;
use strategies::{Candidate, UserContext};

/// Removes candidates with a WATCHED edge from the user.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.watched for O(1) lookups.
pub struct AlreadyWatchedFilter;

impl Filter for AlreadyWatchedFilter {
    fn name(&self) -> &str {
        "AlreadyWatchedFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.watched.contains(&candidate.film_id()))
            .collect();
        Ok(filtered)
    }
}
