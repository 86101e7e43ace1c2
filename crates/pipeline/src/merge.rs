//! Quota-based merging of strategy outputs.
//!
//! Strategies are merged in a fixed order. Each contributes at most its
//! quota of new films; a film id already taken by an earlier strategy is
//! skipped, never displaced. The merged list never exceeds the limit.

use std::collections::HashSet;

use graph_store::FilmId;
use strategies::Candidate;

const BASIS: usize = 10_000;

/// `ceil(fraction * limit)`, computed on whole basis points so that
/// fractions like 0.3 do not round up an extra slot through float error.
/// Split into whole and partial basis so any `limit` stays in range.
pub fn quota(limit: usize, fraction: f64) -> usize {
    let basis_points = (fraction.clamp(0.0, 1.0) * BASIS as f64).round() as usize;
    limit / BASIS * basis_points + (limit % BASIS * basis_points).div_ceil(BASIS)
}

/// Accumulates candidates from successive strategies, first-seen wins.
#[derive(Debug)]
pub struct QuotaMerge {
    limit: usize,
    selected: Vec<Candidate>,
    seen: HashSet<FilmId>,
}

impl QuotaMerge {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            selected: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots left before the limit is reached
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.selected.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, film: FilmId) -> bool {
        self.seen.contains(&film)
    }

    /// Ids taken so far
    pub fn selected_ids(&self) -> &HashSet<FilmId> {
        &self.seen
    }

    /// Take up to `quota` candidates not already selected, in the order
    /// given. Returns how many were added.
    pub fn take(&mut self, candidates: impl IntoIterator<Item = Candidate>, quota: usize) -> usize {
        let mut added = 0;
        for candidate in candidates {
            if added == quota || self.is_full() {
                break;
            }
            if self.seen.insert(candidate.film_id()) {
                self.selected.push(candidate);
                added += 1;
            }
        }
        added
    }

    /// Take new candidates until the limit is reached or the input runs out
    pub fn fill(&mut self, candidates: impl IntoIterator<Item = Candidate>) -> usize {
        let remaining = self.remaining();
        self.take(candidates, remaining)
    }

    /// The merged list in merge order
    pub fn finish(mut self) -> Vec<Candidate> {
        self.selected.truncate(self.limit);
        self.selected
    }
}
