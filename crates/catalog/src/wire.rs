//! Catalog JSON payload shapes and their conversion into graph types.

use std::collections::HashMap;

use graph_store::{Film, FilmId, Genre, GenreId};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A movie as it appears in list results (`genre_ids`), in detail responses
/// (`genres`) or in person credits (`job`, `character`)
#[derive(Debug, Deserialize)]
pub(crate) struct WireMovie {
    pub(crate) id: FilmId,
    #[serde(default, alias = "name")]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) overview: Option<String>,
    #[serde(default)]
    pub(crate) poster_path: Option<String>,
    #[serde(default)]
    pub(crate) release_date: Option<String>,
    #[serde(default)]
    pub(crate) vote_average: Option<f64>,
    #[serde(default)]
    pub(crate) vote_count: Option<u32>,
    #[serde(default)]
    pub(crate) popularity: Option<f64>,
    #[serde(default)]
    pub(crate) genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub(crate) genres: Vec<WireGenre>,
    #[serde(default)]
    pub(crate) job: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGenre {
    pub(crate) id: GenreId,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGenreList {
    #[serde(default)]
    pub(crate) genres: Vec<WireGenre>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePerson {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) profile_path: Option<String>,
    #[serde(default)]
    pub(crate) character: Option<String>,
    #[serde(default)]
    pub(crate) job: Option<String>,
    #[serde(default)]
    pub(crate) biography: Option<String>,
    #[serde(default)]
    pub(crate) birthday: Option<String>,
    #[serde(default)]
    pub(crate) place_of_birth: Option<String>,
    #[serde(default)]
    pub(crate) popularity: Option<f64>,
}

/// `cast`/`crew` arrays of a credits response, kept raw so one bad entry
/// does not sink the rest
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireCredits {
    #[serde(default)]
    pub(crate) cast: Vec<Value>,
    #[serde(default)]
    pub(crate) crew: Vec<Value>,
}

/// Empty strings from the catalog mean "unknown"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl WireMovie {
    pub(crate) fn is_director_credit(&self) -> bool {
        self.job.as_deref() == Some("Director")
    }

    /// Convert to a [`Film`]. Detail responses carry genre names directly;
    /// list responses carry ids that are resolved through `genre_names`
    /// (missing names stay empty until a genre sync).
    ///
    /// `None` for an entry with id 0. Genre ids of 0 are dropped.
    pub(crate) fn into_film(self, genre_names: &HashMap<GenreId, String>) -> Option<Film> {
        if self.id == 0 {
            return None;
        }

        let genres = if self.genres.is_empty() {
            self.genre_ids
                .iter()
                .filter(|&&id| id > 0)
                .map(|&id| Genre::new(id, genre_names.get(&id).cloned().unwrap_or_default()))
                .collect()
        } else {
            self.genres
                .into_iter()
                .filter(|g| g.id > 0)
                .map(|g| Genre::new(g.id, g.name.unwrap_or_default()))
                .collect()
        };

        Some(Film {
            id: self.id,
            title: self.title.unwrap_or_default(),
            overview: non_empty(self.overview),
            poster_path: non_empty(self.poster_path),
            release_date: non_empty(self.release_date),
            vote_average: self.vote_average.unwrap_or_default(),
            vote_count: self.vote_count.unwrap_or_default(),
            popularity: self.popularity.unwrap_or_default(),
            genres,
        })
    }
}

/// Decode each element of a JSON array on its own, skipping the ones that
/// do not fit `T`
pub(crate) fn decode_each<T>(items: Vec<Value>) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() < total {
        debug!(skipped = total - decoded.len(), "Skipped malformed catalog entries");
    }
    decoded
}

/// Pull the `results` array out of a list response
pub(crate) fn results_array(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
