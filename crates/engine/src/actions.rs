//! User actions and lookups that pass through the engine.
//!
//! Arguments are validated before any graph or catalog call. Edge writes
//! first make sure the film node exists, pulling it from the catalog when
//! the graph has never seen it.

use graph_store::{EdgeKind, Film, FilmId, GenreId, UserStats};
use tracing::{debug, info};

use crate::engine::RecommendationEngine;
use crate::error::{require_film, require_genre, require_score, require_user, EngineError, Result};

impl RecommendationEngine {
    /// The film from the graph, or from the catalog with write-through.
    async fn ensure_film(&self, film_id: FilmId) -> Result<Film> {
        if let Some(film) = self.store.film(film_id)? {
            return Ok(film);
        }

        debug!(film_id, "Film not in graph, fetching from catalog");
        match self.catalog.get_item_details(film_id).await? {
            Some(film) => {
                self.sync.upsert_film(&film)?;
                Ok(film)
            }
            None => Err(EngineError::FilmNotFound(film_id)),
        }
    }

    /// Create or overwrite the user's rating of a film
    pub async fn rate_film(&self, user_id: &str, film_id: FilmId, score: u8) -> Result<()> {
        let user_id = require_user(user_id)?;
        let film_id = require_film(film_id)?;
        let score = require_score(score)?;

        self.ensure_film(film_id).await?;
        self.store.rate(user_id, film_id, score)?;
        info!(user_id, film_id, score, "Rated film");
        Ok(())
    }

    pub fn remove_rating(&self, user_id: &str, film_id: FilmId) -> Result<bool> {
        let user_id = require_user(user_id)?;
        let film_id = require_film(film_id)?;
        Ok(self.store.remove_rating(user_id, film_id)?)
    }

    async fn add_edge(&self, user_id: &str, film_id: FilmId, kind: EdgeKind) -> Result<()> {
        let user_id = require_user(user_id)?;
        let film_id = require_film(film_id)?;

        self.ensure_film(film_id).await?;
        self.store.add_edge(user_id, film_id, kind)?;
        info!(user_id, film_id, edge = %kind, "Added edge");
        Ok(())
    }

    fn remove_edge(&self, user_id: &str, film_id: FilmId, kind: EdgeKind) -> Result<bool> {
        let user_id = require_user(user_id)?;
        let film_id = require_film(film_id)?;
        Ok(self.store.remove_edge(user_id, film_id, kind)?)
    }

    pub async fn mark_watched(&self, user_id: &str, film_id: FilmId) -> Result<()> {
        self.add_edge(user_id, film_id, EdgeKind::Watched).await
    }

    pub async fn add_favorite(&self, user_id: &str, film_id: FilmId) -> Result<()> {
        self.add_edge(user_id, film_id, EdgeKind::Favorited).await
    }

    pub fn remove_favorite(&self, user_id: &str, film_id: FilmId) -> Result<bool> {
        self.remove_edge(user_id, film_id, EdgeKind::Favorited)
    }

    pub async fn add_to_watchlist(&self, user_id: &str, film_id: FilmId) -> Result<()> {
        self.add_edge(user_id, film_id, EdgeKind::Watchlist).await
    }

    pub fn remove_from_watchlist(&self, user_id: &str, film_id: FilmId) -> Result<bool> {
        self.remove_edge(user_id, film_id, EdgeKind::Watchlist)
    }

    /// Replace the user's preferred genres. Genres the graph does not know
    /// yet trigger one catalog genre sync before the write.
    pub async fn set_preferred_genres(&self, user_id: &str, genres: &[GenreId]) -> Result<()> {
        let user_id = require_user(user_id)?;
        for &genre in genres {
            require_genre(genre)?;
        }

        let mut missing = false;
        for &genre in genres {
            if self.store.genre(genre)?.is_none() {
                missing = true;
                break;
            }
        }
        if missing {
            self.sync.sync_genres().await;
        }

        self.store.set_preferred_genres(user_id, genres)?;
        info!(user_id, genres = genres.len(), "Updated preferred genres");
        Ok(())
    }

    /// Live catalog search; results are synced into the graph
    pub async fn search_films(&self, query: &str, page: u32) -> Result<Vec<Film>> {
        let films = self.catalog.search(query, page).await;
        self.sync.persist_films(&films);
        Ok(films)
    }

    /// Film from the graph, or from the catalog (written through to the
    /// graph). `None` when neither knows it.
    pub async fn film_details(&self, film_id: FilmId) -> Result<Option<Film>> {
        let film_id = require_film(film_id)?;
        match self.ensure_film(film_id).await {
            Ok(film) => Ok(Some(film)),
            Err(EngineError::FilmNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let user_id = require_user(user_id)?;
        Ok(self.store.user_stats(user_id)?)
    }
}
