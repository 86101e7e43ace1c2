//! User actions through the engine: validation, film write-through and
//! idempotent edges.

mod common;

use std::sync::Arc;

use common::*;
use engine::EngineError;
use graph_store::{EdgeKind, GraphStore};
use serde_json::json;

#[tokio::test]
async fn test_rerating_overwrites_single_edge() {
    let graph = create_test_graph();
    let stub = Arc::new(StubCatalog::new().route(
        "/movie/42",
        json!({"id": 42, "title": "The Answer", "genres": [{"id": SCI_FI, "name": "Science Fiction"}]}),
    ));
    let engine = create_engine(Arc::clone(&graph), Arc::clone(&stub));

    engine.rate_film("u1", 42, 6).await.unwrap();
    engine.rate_film("u1", 42, 9).await.unwrap();

    let ratings = graph.user_ratings("u1").unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].film_id, 42);
    assert_eq!(ratings[0].score, 9);
    assert_eq!(graph.film_ratings(42).unwrap().len(), 1);

    // Fetched once, then served from the graph
    assert_eq!(stub.hits("/movie/42"), 1);
    assert!(has_genre(graph.as_ref(), 42, SCI_FI));
}

#[tokio::test]
async fn test_unknown_film_is_reported() {
    let (engine, graph) = offline_engine();

    let result = engine.mark_watched("u1", 31337).await;
    assert!(matches!(result, Err(EngineError::FilmNotFound(31337))));
    assert!(!graph.has_edge("u1", 31337, EdgeKind::Watched).unwrap());
}

#[tokio::test]
async fn test_validation_precedes_any_io() {
    let graph = create_test_graph();
    let stub = Arc::new(StubCatalog::new());
    let engine = create_engine(Arc::clone(&graph), Arc::clone(&stub));

    for result in [
        engine.rate_film("", 42, 5).await,
        engine.rate_film("u1", 0, 5).await,
        engine.rate_film("u1", 42, 0).await,
        engine.rate_film("u1", 42, 11).await,
        engine.mark_watched("  ", 42).await,
        engine.add_favorite("u1", 0).await,
        engine.add_to_watchlist("", 42).await,
        engine.set_preferred_genres("u1", &[0]).await,
    ] {
        assert!(matches!(result, Err(EngineError::Validation(_))), "{result:?}");
    }
    assert!(matches!(
        engine.remove_rating("u1", 0),
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.film_details(0).await,
        Err(EngineError::Validation(_))
    ));

    assert_eq!(stub.total_hits(), 0);
    assert!(graph.user_ratings("u1").unwrap().is_empty());
}

#[tokio::test]
async fn test_edges_and_stats() {
    let (engine, _graph) = offline_engine();

    engine.mark_watched("u1", 550).await.unwrap();
    engine.mark_watched("u1", 550).await.unwrap();
    engine.add_favorite("u1", 550).await.unwrap();
    engine.add_to_watchlist("u1", 807).await.unwrap();
    engine.add_to_watchlist("u1", 13).await.unwrap();
    engine.rate_film("u1", 550, 10).await.unwrap();

    let stats = engine.user_stats("u1").unwrap();
    assert_eq!(stats.watched_count, 1);
    assert_eq!(stats.favorites_count, 1);
    assert_eq!(stats.watchlist_count, 2);
    assert_eq!(stats.rated_count, 1);

    assert!(engine.remove_from_watchlist("u1", 807).unwrap());
    assert!(!engine.remove_from_watchlist("u1", 807).unwrap());
    assert!(engine.remove_favorite("u1", 550).unwrap());
    assert!(engine.remove_rating("u1", 550).unwrap());

    let stats = engine.user_stats("u1").unwrap();
    assert_eq!(stats.watchlist_count, 1);
    assert_eq!(stats.favorites_count, 0);
    assert_eq!(stats.rated_count, 0);
}

#[tokio::test]
async fn test_preferences_sync_missing_genres() {
    let graph = create_test_graph();
    let stub = Arc::new(StubCatalog::new().route(
        "/genre/movie/list",
        json!({"genres": [{"id": 10752, "name": "War"}, {"id": ACTION, "name": "Action"}]}),
    ));
    let engine = create_engine(Arc::clone(&graph), Arc::clone(&stub));

    engine.set_preferred_genres("u1", &[ACTION]).await.unwrap();
    assert_eq!(stub.hits("/genre/movie/list"), 0);

    engine.set_preferred_genres("u1", &[10752, ACTION]).await.unwrap();
    assert_eq!(stub.hits("/genre/movie/list"), 1);
    assert_eq!(graph.genre(10752).unwrap().unwrap().name, "War");

    let names: Vec<String> = graph
        .preferred_genres("u1")
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, vec!["Action", "War"]);
}

#[tokio::test]
async fn test_preferences_with_unknown_genre_fail() {
    let (engine, graph) = offline_engine();
    engine.set_preferred_genres("u1", &[ACTION]).await.unwrap();

    assert!(matches!(
        engine.set_preferred_genres("u1", &[99999]).await,
        Err(EngineError::Graph(_))
    ));
    // The previous set survives a rejected replacement
    assert_eq!(graph.preferred_genres("u1").unwrap().len(), 1);
}

#[tokio::test]
async fn test_film_details_graph_first_then_catalog() {
    let graph = create_test_graph();
    let stub = Arc::new(StubCatalog::new().route(
        "/movie/77",
        json!({"id": 77, "title": "Catalog Only", "popularity": 5.5}),
    ));
    let engine = create_engine(Arc::clone(&graph), Arc::clone(&stub));

    let film = engine.film_details(550).await.unwrap().unwrap();
    assert_eq!(film.title, "Fight Club");
    assert_eq!(stub.total_hits(), 0);

    let film = engine.film_details(77).await.unwrap().unwrap();
    assert_eq!(film.title, "Catalog Only");
    assert!(graph.film(77).unwrap().is_some());

    assert!(engine.film_details(78).await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_results_are_synced() {
    let graph = create_test_graph();
    let stub = Arc::new(StubCatalog::new().route(
        "/search/movie",
        results(vec![movie(6001, "Matrix", &[SCI_FI], 70.0)]),
    ));
    let engine = create_engine(Arc::clone(&graph), stub);

    let films = engine.search_films("matrix", 1).await.unwrap();
    assert_eq!(films.len(), 1);
    assert!(has_genre(graph.as_ref(), 6001, SCI_FI));
    assert_eq!(graph.search_films("matr", 5).unwrap()[0].id, 6001);
}
