//! JSON snapshots of an [`InteractionGraph`].
//!
//! A snapshot is the durable on-disk form the CLI loads at startup and writes
//! back after mutating commands. Loading validates every edge against the
//! nodes the snapshot defines before the graph is built.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GraphError, Result};
use crate::index::{GraphData, InteractionGraph};
use crate::types::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub films: Vec<Film>,
    #[serde(default)]
    pub users: Vec<UserSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    #[serde(default)]
    pub ratings: Vec<RatedEdge>,
    #[serde(default)]
    pub watched: Vec<TimedEdge>,
    #[serde(default)]
    pub favorites: Vec<TimedEdge>,
    #[serde(default)]
    pub watchlist: Vec<TimedEdge>,
    #[serde(default)]
    pub prefers: Vec<GenreId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedEdge {
    pub film_id: FilmId,
    pub score: u8,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEdge {
    pub film_id: FilmId,
    pub at: DateTime<Utc>,
}

fn timed_edges(edges: &HashMap<FilmId, DateTime<Utc>>) -> Vec<TimedEdge> {
    let mut out: Vec<TimedEdge> = edges
        .iter()
        .map(|(&film_id, &at)| TimedEdge { film_id, at })
        .collect();
    out.sort_by_key(|e| e.film_id);
    out
}

fn missing(entity: &str, id: impl ToString) -> GraphError {
    GraphError::MissingReference {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

impl InteractionGraph {
    /// Build a graph from a snapshot, rejecting edges to undefined nodes
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut data = GraphData::default();

        for genre in &snapshot.genres {
            data.merge_genre(genre.id, &genre.name);
        }
        for film in &snapshot.films {
            data.merge_film(film);
        }

        for user in &snapshot.users {
            for edge in &user.ratings {
                if !data.films.contains_key(&edge.film_id) {
                    return Err(missing("Film", edge.film_id));
                }
                data.put_rating(&user.id, edge.film_id, edge.score, edge.rated_at)?;
            }

            for (kind, edges) in [
                (EdgeKind::Watched, &user.watched),
                (EdgeKind::Favorited, &user.favorites),
                (EdgeKind::Watchlist, &user.watchlist),
            ] {
                for edge in edges {
                    if !data.films.contains_key(&edge.film_id) {
                        return Err(missing("Film", edge.film_id));
                    }
                    data.put_edge(&user.id, edge.film_id, kind, edge.at)?;
                }
            }

            if let Some(genre) = user.prefers.iter().find(|g| !data.genres.contains_key(*g)) {
                return Err(missing("Genre", genre));
            }
            data.put_preferences(&user.id, &user.prefers)?;
        }

        Ok(Self {
            data: parking_lot::RwLock::new(data),
        })
    }

    /// Capture the current graph. Output is sorted by id so snapshots diff
    /// cleanly.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let data = self.data.read();

        let mut genres: Vec<Genre> = data
            .genres
            .iter()
            .map(|(&id, name)| Genre::new(id, name.clone()))
            .collect();
        genres.sort_by_key(|g| g.id);

        let mut films: Vec<Film> = data
            .films
            .values()
            .map(|node| Film {
                genres: node
                    .genre_ids
                    .iter()
                    .map(|&id| Genre::new(id, data.genres.get(&id).cloned().unwrap_or_default()))
                    .collect(),
                ..node.film.clone()
            })
            .collect();
        films.sort_by_key(|f| f.id);

        let mut users: Vec<UserSnapshot> = data
            .users
            .iter()
            .map(|(id, node)| {
                let mut ratings: Vec<RatedEdge> = node
                    .ratings
                    .iter()
                    .map(|(&film_id, &(score, rated_at))| RatedEdge {
                        film_id,
                        score,
                        rated_at,
                    })
                    .collect();
                ratings.sort_by_key(|r| r.film_id);

                UserSnapshot {
                    id: id.clone(),
                    ratings,
                    watched: timed_edges(&node.watched),
                    favorites: timed_edges(&node.favorites),
                    watchlist: timed_edges(&node.watchlist),
                    prefers: node.prefers.iter().copied().collect(),
                }
            })
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));

        GraphSnapshot {
            genres,
            films,
            users,
        }
    }

    /// Load a graph from a JSON snapshot file
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: GraphSnapshot = serde_json::from_reader(reader)?;
        let graph = Self::from_snapshot(snapshot)?;

        info!(
            path = %path.display(),
            films = graph.film_count(),
            genres = graph.genre_count(),
            users = graph.user_count(),
            "Loaded graph snapshot"
        );
        Ok(graph)
    }

    /// Write the graph to `path` as pretty-printed JSON
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let snapshot = self.to_snapshot();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &snapshot)?;

        info!(
            path = %path.display(),
            films = snapshot.films.len(),
            users = snapshot.users.len(),
            "Saved graph snapshot"
        );
        Ok(())
    }
}
