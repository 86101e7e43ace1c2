//! Cast, crew and person lookups. Uncached; failures come back empty.

use std::collections::HashSet;

use graph_store::{Film, FilmId};
use tracing::warn;

use crate::client::CatalogClient;
use crate::error::{CatalogError, Result};
use crate::wire::{WireCredits, WireMovie, WirePerson, decode_each};

/// Default number of cast members returned by [`CatalogClient::movie_cast`]
pub const DEFAULT_CAST_LIMIT: usize = 10;

/// An actor or crew member
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub profile_path: Option<String>,
    /// Role played, for cast entries
    pub character: Option<String>,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
    pub popularity: f64,
}

impl From<WirePerson> for Person {
    fn from(p: WirePerson) -> Self {
        let keep = |s: Option<String>| s.filter(|s| !s.is_empty());
        Person {
            id: p.id,
            name: p.name.unwrap_or_default(),
            profile_path: keep(p.profile_path),
            character: keep(p.character),
            biography: keep(p.biography),
            birthday: keep(p.birthday),
            place_of_birth: keep(p.place_of_birth),
            popularity: p.popularity.unwrap_or_default(),
        }
    }
}

fn require_positive(what: &str, id: u64) -> Result<()> {
    if id == 0 {
        return Err(CatalogError::InvalidArgument(format!(
            "{what} id must be positive"
        )));
    }
    Ok(())
}

impl CatalogClient {
    async fn credits(&self, path: &str) -> Option<WireCredits> {
        let decoded = match self.get_raw(path).await {
            Ok(body) => serde_json::from_value::<WireCredits>(body).map_err(CatalogError::from),
            Err(e) => Err(e),
        };
        decoded
            .inspect_err(|e| warn!(path, error = %e, "Catalog credits fetch failed"))
            .ok()
    }

    /// First `limit` billed cast members of a film
    pub async fn movie_cast(&self, film_id: FilmId, limit: usize) -> Result<Vec<Person>> {
        require_positive("film", film_id)?;
        let Some(credits) = self.credits(&format!("/movie/{film_id}/credits")).await else {
            return Ok(Vec::new());
        };

        Ok(decode_each::<WirePerson>(credits.cast)
            .into_iter()
            .take(limit)
            .map(Person::from)
            .collect())
    }

    /// The first crew member credited with the job "Director"
    pub async fn movie_director(&self, film_id: FilmId) -> Result<Option<Person>> {
        require_positive("film", film_id)?;
        let Some(credits) = self.credits(&format!("/movie/{film_id}/credits")).await else {
            return Ok(None);
        };

        Ok(decode_each::<WirePerson>(credits.crew)
            .into_iter()
            .find(|p| p.job.as_deref() == Some("Director"))
            .map(Person::from))
    }

    pub async fn person_details(&self, person_id: u64) -> Result<Option<Person>> {
        require_positive("person", person_id)?;
        match self.get_raw(&format!("/person/{person_id}")).await {
            Ok(body) => match serde_json::from_value::<WirePerson>(body) {
                Ok(person) => Ok(Some(person.into())),
                Err(e) => {
                    warn!(person_id, error = %e, "Malformed person payload");
                    Ok(None)
                }
            },
            Err(e) => {
                warn!(person_id, error = %e, "Catalog person fetch failed");
                Ok(None)
            }
        }
    }

    /// Films a person acted in, most popular first
    pub async fn person_movies(&self, person_id: u64, limit: usize) -> Result<Vec<Film>> {
        require_positive("person", person_id)?;
        let Some(credits) = self.credits(&format!("/person/{person_id}/movie_credits")).await
        else {
            return Ok(Vec::new());
        };
        Ok(self.credited_films(decode_each(credits.cast), limit).await)
    }

    /// Films a person directed, most popular first
    pub async fn director_movies(&self, person_id: u64, limit: usize) -> Result<Vec<Film>> {
        require_positive("person", person_id)?;
        let Some(credits) = self.credits(&format!("/person/{person_id}/movie_credits")).await
        else {
            return Ok(Vec::new());
        };

        let directed: Vec<WireMovie> = decode_each::<WireMovie>(credits.crew)
            .into_iter()
            .filter(WireMovie::is_director_credit)
            .collect();
        Ok(self.credited_films(directed, limit).await)
    }

    /// Deduplicate credit entries, keep the ones with a poster, order by
    /// popularity
    async fn credited_films(&self, movies: Vec<WireMovie>, limit: usize) -> Vec<Film> {
        let names = self.genre_map().await;
        let mut seen = HashSet::new();
        let mut films: Vec<Film> = movies
            .into_iter()
            .filter(|m| m.poster_path.as_deref().is_some_and(|p| !p.is_empty()))
            .filter(|m| seen.insert(m.id))
            .filter_map(|m| m.into_film(&names))
            .collect();

        films.sort_by(|a, b| {
            b.popularity
                .total_cmp(&a.popularity)
                .then_with(|| a.id.cmp(&b.id))
        });
        films.truncate(limit);
        films
    }
}
