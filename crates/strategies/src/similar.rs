//! Similar films - genre overlap with a seed film
//!
//! Ranked by (shared genres desc, popularity desc). The seed itself and any
//! excluded ids (typically the viewer's watched films) never appear.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use graph_store::{Film, FilmId, GraphStore, Result};
use tracing::{debug, instrument};

use crate::types::{Candidate, CandidateSource};

#[derive(Clone)]
pub struct SimilarSource {
    store: Arc<dyn GraphStore>,
}

impl SimilarSource {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Films sharing at least one genre with `seed`. An unknown seed or a
    /// seed without genres yields nothing.
    #[instrument(skip(self, exclude))]
    pub fn get_candidates(
        &self,
        seed: FilmId,
        exclude: &HashSet<FilmId>,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let Some(seed_film) = self.store.film(seed)? else {
            debug!("Seed film not in graph");
            return Ok(Vec::new());
        };

        let mut shared: HashMap<FilmId, (Film, u32)> = HashMap::new();
        for genre in seed_film.genre_ids() {
            for film in self.store.films_by_genre(genre, usize::MAX)? {
                if film.id == seed || exclude.contains(&film.id) {
                    continue;
                }
                shared.entry(film.id).or_insert((film, 0)).1 += 1;
            }
        }

        let mut ranked: Vec<(Film, u32)> = shared.into_values().collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.0.popularity.total_cmp(&a.0.popularity))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(limit);

        Ok(ranked
            .into_iter()
            .map(|(film, count)| {
                let mut candidate = Candidate::new(film, CandidateSource::Similar, count as f32);
                candidate.metadata.shared_genres = Some(count);
                candidate
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::{Genre, InteractionGraph};

    fn create_test_store() -> Arc<InteractionGraph> {
        let drama = Genre::new(18, "Drama");
        let thriller = Genre::new(53, "Thriller");
        let comedy = Genre::new(35, "Comedy");
        let graph = InteractionGraph::new();
        for film in [
            Film::new(550, "Fight Club")
                .with_popularity(60.0)
                .with_genres(vec![drama.clone(), thriller.clone()]),
            Film::new(807, "Se7en")
                .with_popularity(50.0)
                .with_genres(vec![drama.clone(), thriller.clone()]),
            Film::new(13, "Forrest Gump")
                .with_popularity(80.0)
                .with_genres(vec![drama.clone(), comedy.clone()]),
            Film::new(680, "Pulp Fiction")
                .with_popularity(70.0)
                .with_genres(vec![thriller]),
            Film::new(862, "Toy Story").with_popularity(99.0).with_genres(vec![comedy]),
        ] {
            graph.upsert_film(&film).unwrap();
        }
        Arc::new(graph)
    }

    #[test]
    fn test_shared_genre_count_then_popularity() {
        let source = SimilarSource::new(create_test_store());
        let candidates = source.get_candidates(550, &HashSet::new(), 5).unwrap();
        let ids: Vec<FilmId> = candidates.iter().map(|c| c.film_id()).collect();

        assert_eq!(ids, vec![807, 13, 680]);
        assert_eq!(candidates[0].metadata.shared_genres, Some(2));
        assert!(candidates.iter().all(|c| c.film.has_genre(18) || c.film.has_genre(53)));
    }

    #[test]
    fn test_excluded_films_are_skipped() {
        let source = SimilarSource::new(create_test_store());
        let exclude = HashSet::from([807]);
        let ids: Vec<FilmId> = source
            .get_candidates(550, &exclude, 5)
            .unwrap()
            .iter()
            .map(|c| c.film_id())
            .collect();
        assert_eq!(ids, vec![13, 680]);
    }

    #[test]
    fn test_unknown_seed() {
        let source = SimilarSource::new(create_test_store());
        assert!(source.get_candidates(1, &HashSet::new(), 5).unwrap().is_empty());
    }
}
