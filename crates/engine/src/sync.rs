//! Write-through from the catalog into the interaction graph.
//!
//! Every write is an idempotent merge, so syncing the same payload twice is
//! harmless. Batch writes log and skip individual failures.

use std::sync::Arc;

use catalog::CatalogClient;
use graph_store::{Film, Genre, GraphStore};
use tracing::{debug, info, warn};

use crate::error::{Result, require_film, require_genre};

#[derive(Clone)]
pub struct CatalogSync {
    store: Arc<dyn GraphStore>,
    catalog: CatalogClient,
}

impl CatalogSync {
    pub fn new(store: Arc<dyn GraphStore>, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }

    /// Rejects films or genres with id 0 before touching the graph
    pub fn upsert_film(&self, film: &Film) -> Result<()> {
        require_film(film.id)?;
        for genre in film.genre_ids() {
            require_genre(genre)?;
        }
        self.store.upsert_film(film)?;
        debug!(film_id = film.id, "Synced film");
        Ok(())
    }

    pub fn upsert_genre(&self, genre: &Genre) -> Result<()> {
        require_genre(genre.id)?;
        self.store.upsert_genre(genre)?;
        Ok(())
    }

    /// Upsert every film, returning how many were written
    pub fn persist_films(&self, films: &[Film]) -> usize {
        let mut persisted = 0;
        for film in films {
            match self.upsert_film(film) {
                Ok(()) => persisted += 1,
                Err(e) => warn!(film_id = film.id, error = %e, "Failed to persist film"),
            }
        }
        if persisted < films.len() {
            warn!(
                requested = films.len(),
                persisted, "Some films could not be persisted"
            );
        }
        persisted
    }

    /// Pull the catalog genre list into the graph so every genre node has
    /// a display name. Returns how many genres were written.
    pub async fn sync_genres(&self) -> usize {
        let genres = self.catalog.all_genres().await;
        let mut synced = 0;
        for genre in &genres {
            match self.upsert_genre(genre) {
                Ok(()) => synced += 1,
                Err(e) => warn!(genre_id = genre.id, error = %e, "Failed to sync genre"),
            }
        }
        info!(synced, "Synced catalog genres");
        synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use catalog::CatalogConfig;
    use graph_store::InteractionGraph;

    #[test]
    fn test_zero_ids_never_reach_the_graph() {
        let graph = Arc::new(InteractionGraph::new());
        let catalog = CatalogClient::new(CatalogConfig::default()).unwrap();
        let sync = CatalogSync::new(Arc::clone(&graph) as Arc<dyn GraphStore>, catalog);

        let films = vec![
            Film::new(0, "Bogus"),
            Film::new(7, "Seven").with_genres(vec![Genre::new(28, "Action")]),
            Film::new(8, "Eight").with_genres(vec![Genre::new(0, "")]),
        ];
        assert_eq!(sync.persist_films(&films), 1);
        assert!(graph.film(7).unwrap().is_some());
        assert!(graph.film(0).unwrap().is_none());
        assert!(graph.film(8).unwrap().is_none());
        assert!(graph.genre(0).unwrap().is_none());

        assert!(matches!(
            sync.upsert_genre(&Genre::new(0, "")),
            Err(EngineError::Validation(_))
        ));
    }
}
