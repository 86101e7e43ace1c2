//! Error types for the recommendation engine.

use graph_store::{FilmId, GraphError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A request argument broke the contract; raised before any graph or
    /// catalog call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The film is neither in the graph nor resolvable through the catalog
    #[error("Film {0} not found in graph or catalog")]
    FilmNotFound(FilmId),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Pipeline(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Trimmed user id, or a validation error when it is blank
pub(crate) fn require_user(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("user id must not be empty".to_string()));
    }
    Ok(trimmed)
}

/// Trimmed user id, or `None` when it is absent or blank
pub(crate) fn optional_user(user_id: Option<&str>) -> Option<&str> {
    user_id.map(str::trim).filter(|id| !id.is_empty())
}

pub(crate) fn require_film(film_id: FilmId) -> Result<FilmId> {
    if film_id == 0 {
        return Err(EngineError::Validation("film id must be positive".to_string()));
    }
    Ok(film_id)
}

pub(crate) fn require_score(score: u8) -> Result<u8> {
    if !graph_store::is_valid_score(score) {
        return Err(EngineError::Validation(format!(
            "score must be between {} and {}, got {}",
            graph_store::MIN_SCORE,
            graph_store::MAX_SCORE,
            score
        )));
    }
    Ok(score)
}

pub(crate) fn require_genre(genre_id: graph_store::GenreId) -> Result<graph_store::GenreId> {
    if genre_id == 0 {
        return Err(EngineError::Validation("genre id must be positive".to_string()));
    }
    Ok(genre_id)
}
