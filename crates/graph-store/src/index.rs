//! In-memory interaction graph.
//!
//! `InteractionGraph` keeps every node and edge behind a single
//! `parking_lot::RwLock`, so each [`GraphStore`] call observes one consistent
//! snapshot and each write lands atomically. Secondary indices:
//! - `genre_index`: genre -> films carrying it (HAS_GENRE, reversed)
//! - `film_raters`: film -> users who rated it (RATED, reversed)

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::store::GraphStore;
use crate::types::*;

/// Film properties plus the ids of its HAS_GENRE targets. Genre names live
/// on the genre nodes and are resolved when a film is read.
#[derive(Debug, Clone, Default)]
pub(crate) struct FilmNode {
    pub(crate) film: Film,
    pub(crate) genre_ids: BTreeSet<GenreId>,
}

/// Outgoing edges of one user node
#[derive(Debug, Clone, Default)]
pub(crate) struct UserNode {
    pub(crate) ratings: HashMap<FilmId, (u8, DateTime<Utc>)>,
    pub(crate) watched: HashMap<FilmId, DateTime<Utc>>,
    pub(crate) favorites: HashMap<FilmId, DateTime<Utc>>,
    pub(crate) watchlist: HashMap<FilmId, DateTime<Utc>>,
    pub(crate) prefers: BTreeSet<GenreId>,
}

impl UserNode {
    /// Timestamped edge map for `kind`; RATED edges carry a score and are
    /// stored separately
    pub(crate) fn timed_edges(&self, kind: EdgeKind) -> Option<&HashMap<FilmId, DateTime<Utc>>> {
        match kind {
            EdgeKind::Rated => None,
            EdgeKind::Watched => Some(&self.watched),
            EdgeKind::Favorited => Some(&self.favorites),
            EdgeKind::Watchlist => Some(&self.watchlist),
        }
    }

    fn timed_edges_mut(&mut self, kind: EdgeKind) -> Option<&mut HashMap<FilmId, DateTime<Utc>>> {
        match kind {
            EdgeKind::Rated => None,
            EdgeKind::Watched => Some(&mut self.watched),
            EdgeKind::Favorited => Some(&mut self.favorites),
            EdgeKind::Watchlist => Some(&mut self.watchlist),
        }
    }

    fn targets(&self, kind: EdgeKind) -> HashSet<FilmId> {
        match self.timed_edges(kind) {
            Some(edges) => edges.keys().copied().collect(),
            None => self.ratings.keys().copied().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct GraphData {
    pub(crate) films: HashMap<FilmId, FilmNode>,
    pub(crate) genres: HashMap<GenreId, String>,
    pub(crate) users: HashMap<UserId, UserNode>,
    genre_index: HashMap<GenreId, HashSet<FilmId>>,
    film_raters: HashMap<FilmId, HashSet<UserId>>,
}

impl GraphData {
    fn materialize(&self, node: &FilmNode) -> Film {
        let mut film = node.film.clone();
        film.genres = node
            .genre_ids
            .iter()
            .map(|&id| Genre {
                id,
                name: self.genres.get(&id).cloned().unwrap_or_default(),
            })
            .collect();
        film
    }

    fn film(&self, id: FilmId) -> Option<Film> {
        self.films.get(&id).map(|node| self.materialize(node))
    }

    /// MERGE on genre id; empty names never overwrite
    pub(crate) fn merge_genre(&mut self, id: GenreId, name: &str) {
        let stored = self.genres.entry(id).or_default();
        if !name.is_empty() {
            *stored = name.to_string();
        }
    }

    /// MERGE on film id: overwrite properties, append HAS_GENRE edges
    pub(crate) fn merge_film(&mut self, film: &Film) {
        for genre in &film.genres {
            self.merge_genre(genre.id, &genre.name);
            self.genre_index.entry(genre.id).or_default().insert(film.id);
        }

        let node = self.films.entry(film.id).or_default();
        node.film = Film {
            genres: Vec::new(),
            ..film.clone()
        };
        node.genre_ids.extend(film.genre_ids());
    }

    fn require_film(&self, id: FilmId) -> Result<()> {
        if self.films.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::film_not_found(id))
        }
    }

    pub(crate) fn put_rating(
        &mut self,
        user: &str,
        film: FilmId,
        score: u8,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if !is_valid_score(score) {
            return Err(GraphError::InvalidScore(score));
        }
        self.require_film(film)?;

        self.users
            .entry(user.to_string())
            .or_default()
            .ratings
            .insert(film, (score, at));
        self.film_raters
            .entry(film)
            .or_default()
            .insert(user.to_string());
        Ok(())
    }

    pub(crate) fn put_edge(
        &mut self,
        user: &str,
        film: FilmId,
        kind: EdgeKind,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.require_film(film)?;

        let node = self.users.entry(user.to_string()).or_default();
        let edges = node
            .timed_edges_mut(kind)
            .ok_or(GraphError::InvalidEdge(kind))?;
        // ON CREATE semantics: an existing edge keeps its timestamp
        edges.entry(film).or_insert(at);
        Ok(())
    }

    pub(crate) fn put_preferences(&mut self, user: &str, genres: &[GenreId]) -> Result<()> {
        if let Some(missing) = genres.iter().find(|id| !self.genres.contains_key(*id)) {
            return Err(GraphError::genre_not_found(*missing));
        }
        let node = self.users.entry(user.to_string()).or_default();
        node.prefers = genres.iter().copied().collect();
        Ok(())
    }
}

/// Orders films by popularity descending, ties on ascending id
pub(crate) fn sort_by_popularity(films: &mut [Film]) {
    films.sort_by(|a, b| {
        b.popularity
            .total_cmp(&a.popularity)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Thread-safe in-memory property graph of users, films and genres
#[derive(Debug, Default)]
pub struct InteractionGraph {
    pub(crate) data: RwLock<GraphData>,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn film_count(&self) -> usize {
        self.data.read().films.len()
    }

    pub fn genre_count(&self) -> usize {
        self.data.read().genres.len()
    }

    pub fn user_count(&self) -> usize {
        self.data.read().users.len()
    }

    /// Total number of RATED edges
    pub fn rating_count(&self) -> usize {
        self.data.read().users.values().map(|u| u.ratings.len()).sum()
    }

    /// All user ids, sorted
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.data.read().users.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl GraphStore for InteractionGraph {
    fn film(&self, id: FilmId) -> Result<Option<Film>> {
        Ok(self.data.read().film(id))
    }

    fn genre(&self, id: GenreId) -> Result<Option<Genre>> {
        Ok(self
            .data
            .read()
            .genres
            .get(&id)
            .map(|name| Genre::new(id, name.clone())))
    }

    fn all_genres(&self) -> Result<Vec<Genre>> {
        let data = self.data.read();
        let mut genres: Vec<Genre> = data
            .genres
            .iter()
            .map(|(&id, name)| Genre::new(id, name.clone()))
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(genres)
    }

    fn films_by_genre(&self, genre: GenreId, limit: usize) -> Result<Vec<Film>> {
        let data = self.data.read();
        let mut films: Vec<Film> = data
            .genre_index
            .get(&genre)
            .into_iter()
            .flatten()
            .filter_map(|id| data.film(*id))
            .collect();
        sort_by_popularity(&mut films);
        films.truncate(limit);
        Ok(films)
    }

    fn popular_films(&self, limit: usize) -> Result<Vec<Film>> {
        let data = self.data.read();
        let mut films: Vec<Film> = data.films.values().map(|n| data.materialize(n)).collect();
        sort_by_popularity(&mut films);
        films.truncate(limit);
        Ok(films)
    }

    fn search_films(&self, title: &str, limit: usize) -> Result<Vec<Film>> {
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let data = self.data.read();
        let mut films: Vec<Film> = data
            .films
            .values()
            .filter(|n| n.film.title.to_lowercase().contains(&needle))
            .map(|n| data.materialize(n))
            .collect();
        sort_by_popularity(&mut films);
        films.truncate(limit);
        Ok(films)
    }

    fn upsert_film(&self, film: &Film) -> Result<()> {
        self.data.write().merge_film(film);
        debug!(film_id = film.id, genres = film.genres.len(), "Upserted film");
        Ok(())
    }

    fn upsert_genre(&self, genre: &Genre) -> Result<()> {
        self.data.write().merge_genre(genre.id, &genre.name);
        Ok(())
    }

    fn user_ratings(&self, user: &str) -> Result<Vec<Rating>> {
        let data = self.data.read();
        let Some(node) = data.users.get(user) else {
            return Ok(Vec::new());
        };

        let mut ratings: Vec<Rating> = node
            .ratings
            .iter()
            .map(|(&film_id, &(score, rated_at))| Rating {
                user_id: user.to_string(),
                film_id,
                score,
                rated_at,
            })
            .collect();
        ratings.sort_by(|a, b| {
            b.rated_at
                .cmp(&a.rated_at)
                .then_with(|| a.film_id.cmp(&b.film_id))
        });
        Ok(ratings)
    }

    fn film_ratings(&self, film: FilmId) -> Result<Vec<Rating>> {
        let data = self.data.read();
        let mut ratings: Vec<Rating> = data
            .film_raters
            .get(&film)
            .into_iter()
            .flatten()
            .filter_map(|user_id| {
                let (score, rated_at) = *data.users.get(user_id)?.ratings.get(&film)?;
                Some(Rating {
                    user_id: user_id.clone(),
                    film_id: film,
                    score,
                    rated_at,
                })
            })
            .collect();
        ratings.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(ratings)
    }

    fn user_rating(&self, user: &str, film: FilmId) -> Result<Option<u8>> {
        Ok(self
            .data
            .read()
            .users
            .get(user)
            .and_then(|node| node.ratings.get(&film))
            .map(|(score, _)| *score))
    }

    fn rating_summaries(&self, min_count: u32) -> Result<Vec<RatingSummary>> {
        let guard = self.data.read();
        let data: &GraphData = &guard;
        let summaries = data
            .film_raters
            .par_iter()
            .filter_map(|(&film_id, raters)| {
                let (total, count) = raters
                    .iter()
                    .filter_map(|u| data.users.get(u)?.ratings.get(&film_id))
                    .fold((0u32, 0u32), |(total, count), (score, _)| {
                        (total + u32::from(*score), count + 1)
                    });
                (count > 0 && count >= min_count).then(|| RatingSummary {
                    film_id,
                    avg_score: f64::from(total) / f64::from(count),
                    rating_count: count,
                })
            })
            .collect();
        Ok(summaries)
    }

    fn edge_targets(&self, user: &str, kind: EdgeKind) -> Result<HashSet<FilmId>> {
        Ok(self
            .data
            .read()
            .users
            .get(user)
            .map(|node| node.targets(kind))
            .unwrap_or_default())
    }

    fn films_for_edge(&self, user: &str, kind: EdgeKind) -> Result<Vec<Film>> {
        if kind == EdgeKind::Rated {
            let ratings = self.user_ratings(user)?;
            let data = self.data.read();
            return Ok(ratings
                .iter()
                .filter_map(|r| data.film(r.film_id))
                .collect());
        }

        let data = self.data.read();
        let Some(edges) = data.users.get(user).and_then(|n| n.timed_edges(kind)) else {
            return Ok(Vec::new());
        };
        let mut films: Vec<Film> = edges.keys().filter_map(|id| data.film(*id)).collect();
        films.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(films)
    }

    fn has_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<bool> {
        let data = self.data.read();
        let Some(node) = data.users.get(user) else {
            return Ok(false);
        };
        Ok(match node.timed_edges(kind) {
            Some(edges) => edges.contains_key(&film),
            None => node.ratings.contains_key(&film),
        })
    }

    fn preferred_genres(&self, user: &str) -> Result<Vec<Genre>> {
        let data = self.data.read();
        let Some(node) = data.users.get(user) else {
            return Ok(Vec::new());
        };
        let mut genres: Vec<Genre> = node
            .prefers
            .iter()
            .map(|&id| Genre::new(id, data.genres.get(&id).cloned().unwrap_or_default()))
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(genres)
    }

    fn user_stats(&self, user: &str) -> Result<UserStats> {
        let data = self.data.read();
        Ok(data
            .users
            .get(user)
            .map(|node| UserStats {
                watchlist_count: node.watchlist.len(),
                favorites_count: node.favorites.len(),
                watched_count: node.watched.len(),
                rated_count: node.ratings.len(),
            })
            .unwrap_or_default())
    }

    fn rate(&self, user: &str, film: FilmId, score: u8) -> Result<()> {
        self.data.write().put_rating(user, film, score, Utc::now())?;
        debug!(user_id = user, film_id = film, score, "Recorded rating");
        Ok(())
    }

    fn add_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<()> {
        self.data.write().put_edge(user, film, kind, Utc::now())
    }

    fn remove_edge(&self, user: &str, film: FilmId, kind: EdgeKind) -> Result<bool> {
        let mut data = self.data.write();
        let Some(node) = data.users.get_mut(user) else {
            return Ok(false);
        };

        let removed = match node.timed_edges_mut(kind) {
            Some(edges) => edges.remove(&film).is_some(),
            None => node.ratings.remove(&film).is_some(),
        };

        if removed && kind == EdgeKind::Rated {
            if let Some(raters) = data.film_raters.get_mut(&film) {
                raters.remove(user);
                if raters.is_empty() {
                    data.film_raters.remove(&film);
                }
            }
        }
        Ok(removed)
    }

    fn set_preferred_genres(&self, user: &str, genres: &[GenreId]) -> Result<()> {
        self.data.write().put_preferences(user, genres)
    }

    fn add_preferred_genre(&self, user: &str, genre: GenreId) -> Result<()> {
        let mut data = self.data.write();
        if !data.genres.contains_key(&genre) {
            return Err(GraphError::genre_not_found(genre));
        }
        data.users
            .entry(user.to_string())
            .or_default()
            .prefers
            .insert(genre);
        Ok(())
    }

    fn remove_preferred_genre(&self, user: &str, genre: GenreId) -> Result<bool> {
        Ok(self
            .data
            .write()
            .users
            .get_mut(user)
            .is_some_and(|node| node.prefers.remove(&genre)))
    }
}
