//! Catalog list endpoints.

use std::fmt;

use graph_store::{FilmId, GenreId};

/// A paged, ordered list the catalog can serve. Used together with a page
/// number as the list-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListKind {
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
    /// Popularity-ordered discovery of films carrying any of `genres`
    Discover { genres: Vec<GenreId> },
    /// Films the catalog considers similar to one film
    Similar(FilmId),
    /// Films the catalog recommends from one film
    Recommendations(FilmId),
}

impl ListKind {
    /// Genres are sorted and deduplicated so one genre set is one cache key
    pub fn discover(genres: impl IntoIterator<Item = GenreId>) -> Self {
        let mut genres: Vec<GenreId> = genres.into_iter().collect();
        genres.sort_unstable();
        genres.dedup();
        ListKind::Discover { genres }
    }

    pub(crate) fn path(&self) -> String {
        match self {
            ListKind::Popular => "/movie/popular".to_string(),
            ListKind::TopRated => "/movie/top_rated".to_string(),
            ListKind::NowPlaying => "/movie/now_playing".to_string(),
            ListKind::Upcoming => "/movie/upcoming".to_string(),
            ListKind::Discover { .. } => "/discover/movie".to_string(),
            ListKind::Similar(id) => format!("/movie/{id}/similar"),
            ListKind::Recommendations(id) => format!("/movie/{id}/recommendations"),
        }
    }

    pub(crate) fn query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.to_string())];
        if let ListKind::Discover { genres } = self {
            let joined = genres
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("|");
            query.push(("sort_by", "popularity.desc".to_string()));
            query.push(("with_genres", joined));
        }
        query
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Popular => write!(f, "popular"),
            ListKind::TopRated => write!(f, "top_rated"),
            ListKind::NowPlaying => write!(f, "now_playing"),
            ListKind::Upcoming => write!(f, "upcoming"),
            ListKind::Discover { genres } => write!(f, "discover{genres:?}"),
            ListKind::Similar(id) => write!(f, "similar({id})"),
            ListKind::Recommendations(id) => write!(f, "recommendations({id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_query_joins_genres() {
        let kind = ListKind::discover([28, 12, 28]);
        assert_eq!(kind.path(), "/discover/movie");
        assert_eq!(
            kind.query(2),
            vec![
                ("page", "2".to_string()),
                ("sort_by", "popularity.desc".to_string()),
                ("with_genres", "12|28".to_string()),
            ]
        );
    }

    #[test]
    fn test_discover_key_ignores_genre_order() {
        assert_eq!(ListKind::discover([878, 28]), ListKind::discover([28, 878, 878]));
    }

    #[test]
    fn test_film_scoped_paths() {
        assert_eq!(ListKind::Similar(550).path(), "/movie/550/similar");
        assert_eq!(
            ListKind::Recommendations(550).path(),
            "/movie/550/recommendations"
        );
    }
}
