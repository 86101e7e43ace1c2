//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use catalog::{CatalogClient, CatalogConfig, CatalogError, CatalogTransport};
use engine::RecommendationEngine;
use graph_store::{Film, Genre, GraphStore, InteractionGraph};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const ACTION: u32 = 28;
pub const CRIME: u32 = 80;
pub const COMEDY: u32 = 35;
pub const DRAMA: u32 = 18;
pub const SCI_FI: u32 = 878;
pub const THRILLER: u32 = 53;

/// Canned catalog keyed by path (plus `with_genres` for discovery).
/// Unrouted requests answer 404, so an empty stub is an offline catalog.
#[derive(Default)]
pub struct StubCatalog {
    routes: HashMap<String, Value>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: &str, body: Value) -> Self {
        self.routes.insert(key.to_string(), body);
        self
    }

    pub fn hits(&self, key: &str) -> usize {
        self.hits.lock().get(key).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().values().sum()
    }
}

#[async_trait::async_trait]
impl CatalogTransport for StubCatalog {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> catalog::Result<Value> {
        let key = match query.iter().find(|(name, _)| *name == "with_genres") {
            Some((_, genres)) => format!("{path}?with_genres={genres}"),
            None => path.to_string(),
        };
        *self.hits.lock().entry(key.clone()).or_default() += 1;

        self.routes.get(&key).cloned().ok_or(CatalogError::Status {
            status: 404,
            path: key,
        })
    }
}

pub fn movie(id: u64, title: &str, genres: &[u32], popularity: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "genre_ids": genres,
        "popularity": popularity,
        "poster_path": format!("/{id}.jpg"),
    })
}

pub fn results(movies: Vec<Value>) -> Value {
    json!({ "page": 1, "results": movies })
}

fn film(id: u64, title: &str, genres: &[(u32, &str)], popularity: f64) -> Film {
    Film::new(id, title)
        .with_popularity(popularity)
        .with_genres(genres.iter().map(|&(g, name)| Genre::new(g, name)).collect())
}

/// A small graph:
/// - Action 101..=106 (popularity 90 down to 40)
/// - Sci-Fi 100, 200, 300, 400
/// - 550 Fight Club and 807 Se7en {Drama, Thriller}, 680 Pulp Fiction
///   {Thriller, Crime}, 13 Forrest Gump {Drama, Comedy}, 900 Airplane! {Comedy}
/// - r1, r2, r3 rate 13, 680 and 900 so they trend in that order
pub fn create_test_graph() -> Arc<InteractionGraph> {
    let graph = InteractionGraph::new();
    let action = [(ACTION, "Action")];
    let sci_fi = [(SCI_FI, "Science Fiction")];

    for (i, id) in (101..=106).enumerate() {
        graph
            .upsert_film(&film(id, &format!("Action {id}"), &action, 90.0 - 10.0 * i as f64))
            .unwrap();
    }
    for (id, title, popularity) in [
        (100, "Dune", 55.0),
        (200, "Alien", 65.0),
        (300, "Arrival", 45.0),
        (400, "Solaris", 35.0),
    ] {
        graph.upsert_film(&film(id, title, &sci_fi, popularity)).unwrap();
    }
    for f in [
        film(550, "Fight Club", &[(DRAMA, "Drama"), (THRILLER, "Thriller")], 60.0),
        film(807, "Se7en", &[(DRAMA, "Drama"), (THRILLER, "Thriller")], 50.0),
        film(680, "Pulp Fiction", &[(THRILLER, "Thriller"), (CRIME, "Crime")], 70.0),
        film(13, "Forrest Gump", &[(DRAMA, "Drama"), (COMEDY, "Comedy")], 80.0),
        film(900, "Airplane!", &[(COMEDY, "Comedy")], 30.0),
    ] {
        graph.upsert_film(&f).unwrap();
    }

    for (user, scores) in [("r1", [9, 8, 7]), ("r2", [9, 8, 7]), ("r3", [8, 8, 7])] {
        graph.rate(user, 13, scores[0]).unwrap();
        graph.rate(user, 680, scores[1]).unwrap();
        graph.rate(user, 900, scores[2]).unwrap();
    }

    Arc::new(graph)
}

pub fn create_engine(
    graph: Arc<InteractionGraph>,
    catalog: Arc<StubCatalog>,
) -> RecommendationEngine {
    let client = CatalogClient::with_transport(catalog, CatalogConfig::default());
    RecommendationEngine::new(graph, client)
}

/// Engine over the fixture graph with an unreachable catalog
pub fn offline_engine() -> (RecommendationEngine, Arc<InteractionGraph>) {
    let graph = create_test_graph();
    let engine = create_engine(Arc::clone(&graph), Arc::new(StubCatalog::new()));
    (engine, graph)
}

pub fn ids(recommendations: &[engine::Recommendation]) -> Vec<u64> {
    recommendations.iter().map(|r| r.film_id()).collect()
}

pub fn has_genre(store: &dyn GraphStore, film: u64, genre: u32) -> bool {
    store
        .film(film)
        .unwrap()
        .is_some_and(|f| f.has_genre(genre))
}
