//! The cached catalog client.
//!
//! `CatalogClient` owns two [`TtlCache`]s (items keyed by film id, lists keyed
//! by `(ListKind, page)`) and a genre map that is loaded once. Expected
//! failures (timeouts, non-2xx, malformed bodies) are logged and turned into
//! `None` or an empty list; only contract violations come back as `Err`.

use std::collections::HashMap;
use std::sync::Arc;

use graph_store::{Film, FilmId, Genre, GenreId};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::cache::TtlCache;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::list::ListKind;
use crate::transport::{CatalogTransport, HttpTransport};
use crate::wire::{WireGenreList, WireMovie, decode_each, results_array};

pub type ItemCache = TtlCache<FilmId, Film>;
pub type ListCache = TtlCache<(ListKind, u32), Vec<Film>>;

struct ClientInner {
    transport: Arc<dyn CatalogTransport>,
    config: CatalogConfig,
    items: ItemCache,
    lists: ListCache,
    genres: RwLock<Option<Arc<HashMap<GenreId, String>>>>,
}

/// Best-effort, cached access to the external movie catalog.
///
/// Cloning is cheap and every clone shares the same caches.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<ClientInner>,
}

impl CatalogClient {
    /// Client backed by the real HTTP transport
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Client over any transport, with caches sized from `config`
    pub fn with_transport(transport: Arc<dyn CatalogTransport>, config: CatalogConfig) -> Self {
        let items = TtlCache::new(config.item_ttl());
        let lists = TtlCache::new(config.list_ttl());
        Self::with_caches(transport, config, items, lists)
    }

    /// Client over caches constructed by the caller
    pub fn with_caches(
        transport: Arc<dyn CatalogTransport>,
        config: CatalogConfig,
        items: ItemCache,
        lists: ListCache,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                items,
                lists,
                genres: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    pub fn item_cache_len(&self) -> usize {
        self.inner.items.len()
    }

    pub fn list_cache_len(&self) -> usize {
        self.inner.lists.len()
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Details for one film, from the item cache when fresh.
    ///
    /// `Ok(None)` means "unknown right now" (the fetch failed and the cache
    /// was left untouched). `Err` is only returned for id 0.
    pub async fn get_item_details(&self, id: FilmId) -> Result<Option<Film>> {
        if id == 0 {
            return Err(CatalogError::InvalidArgument(
                "film id must be positive".to_string(),
            ));
        }

        if let Some(film) = self.inner.items.get(&id) {
            debug!(item_id = id, "Item cache hit");
            return Ok(Some(film));
        }
        debug!(item_id = id, "Item cache miss");

        match self.fetch_item(id).await {
            Ok(film) => {
                self.inner.items.put(id, film.clone());
                Ok(Some(film))
            }
            Err(e) => {
                warn!(item_id = id, error = %e, "Catalog item fetch failed");
                Ok(None)
            }
        }
    }

    async fn fetch_item(&self, id: FilmId) -> Result<Film> {
        let body = self
            .inner
            .transport
            .get_json(&format!("/movie/{id}"), &[])
            .await?;
        let movie: WireMovie = serde_json::from_value(body)?;
        if movie.id != id {
            return Err(CatalogError::Decode(serde::de::Error::custom(format!(
                "detail for film {id} carries id {}",
                movie.id
            ))));
        }
        movie
            .into_film(&self.cached_genre_names())
            .ok_or_else(|| CatalogError::Decode(serde::de::Error::custom("film id 0")))
    }

    /// Fetch many films with bounded parallelism.
    ///
    /// At most `batch_concurrency` fetches run at once and each one gets
    /// `batch_unit_timeout`. Failed or timed-out ids are dropped; the rest
    /// come back in request order.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn get_items_in_parallel(&self, ids: &[FilmId]) -> Vec<Film> {
        let semaphore = Arc::new(Semaphore::new(self.inner.config.batch_concurrency.max(1)));
        let unit_timeout = self.inner.config.batch_unit_timeout();

        let mut tasks = Vec::with_capacity(ids.len());
        for &id in ids {
            if id == 0 {
                warn!(item_id = id, "Skipping invalid film id in batch");
                continue;
            }

            let client = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let task = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                match tokio::time::timeout(unit_timeout, client.get_item_details(id)).await {
                    Ok(Ok(film)) => film,
                    Ok(Err(e)) => {
                        debug!(item_id = id, error = %e, "Batch unit rejected");
                        None
                    }
                    Err(_) => {
                        let e = CatalogError::Timeout(unit_timeout);
                        debug!(item_id = id, error = %e, "Batch unit abandoned");
                        None
                    }
                }
            });
            tasks.push((id, task));
        }

        let mut films = Vec::with_capacity(tasks.len());
        let mut dropped = 0usize;
        for (id, task) in tasks {
            match task.await {
                Ok(Some(film)) => films.push(film),
                Ok(None) => dropped += 1,
                Err(e) => {
                    warn!(item_id = id, error = %e, "Batch unit task failed");
                    dropped += 1;
                }
            }
        }

        info!(
            requested = ids.len(),
            resolved = films.len(),
            dropped,
            "Batch fetch complete"
        );
        films
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// One page of a catalog list, from the list cache when fresh. Pages
    /// start at 1; page 0 is read as page 1.
    pub async fn get_list(&self, kind: ListKind, page: u32) -> Vec<Film> {
        let page = page.max(1);
        let key = (kind, page);

        if let Some(films) = self.inner.lists.get(&key) {
            debug!(list = %key.0, page, "List cache hit");
            return films;
        }
        debug!(list = %key.0, page, "List cache miss");

        let (kind, page) = key;
        match self.fetch_films(&kind.path(), &kind.query(page)).await {
            Ok(films) => {
                if !films.is_empty() {
                    self.inner.lists.put((kind, page), films.clone());
                }
                films
            }
            Err(e) => {
                warn!(list = %kind, page, error = %e, "Catalog list fetch failed");
                Vec::new()
            }
        }
    }

    /// Live title search. Never cached.
    pub async fn search(&self, query: &str, page: u32) -> Vec<Film> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let params = [("query", query.to_string()), ("page", page.max(1).to_string())];
        match self.fetch_films("/search/movie", &params).await {
            Ok(films) => films,
            Err(e) => {
                warn!(query, error = %e, "Catalog search failed");
                Vec::new()
            }
        }
    }

    async fn fetch_films(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Film>> {
        let body = self.inner.transport.get_json(path, query).await?;
        if !body.is_object() {
            return Err(CatalogError::Decode(serde::de::Error::custom(
                "list response is not a JSON object",
            )));
        }

        let movies: Vec<WireMovie> = decode_each(results_array(body));
        let names = self.genre_map().await;
        let total = movies.len();
        let films: Vec<Film> = movies.into_iter().filter_map(|m| m.into_film(&names)).collect();
        if films.len() < total {
            debug!(path, skipped = total - films.len(), "Skipped catalog entries with id 0");
        }
        Ok(films)
    }

    // =========================================================================
    // Genres
    // =========================================================================

    /// Genre id to display name, fetched once and kept until
    /// [`invalidate_all`](Self::invalidate_all). An empty answer is not
    /// cached so the next call retries.
    pub async fn genre_map(&self) -> Arc<HashMap<GenreId, String>> {
        let cached = self.inner.genres.read().clone();
        if let Some(map) = cached {
            return map;
        }

        match self.fetch_genre_map().await {
            Ok(map) if !map.is_empty() => {
                let map = Arc::new(map);
                *self.inner.genres.write() = Some(Arc::clone(&map));
                info!(genres = map.len(), "Loaded catalog genre map");
                map
            }
            Ok(_) => Arc::default(),
            Err(e) => {
                warn!(error = %e, "Catalog genre list fetch failed");
                Arc::default()
            }
        }
    }

    async fn fetch_genre_map(&self) -> Result<HashMap<GenreId, String>> {
        let body = self
            .inner
            .transport
            .get_json("/genre/movie/list", &[])
            .await?;
        let list: WireGenreList = serde_json::from_value(body)?;
        Ok(list
            .genres
            .into_iter()
            .filter(|g| g.id > 0)
            .filter_map(|g| Some((g.id, g.name.filter(|n| !n.is_empty())?)))
            .collect())
    }

    /// Genre map if it has already been loaded, without fetching
    fn cached_genre_names(&self) -> Arc<HashMap<GenreId, String>> {
        self.inner.genres.read().clone().unwrap_or_default()
    }

    /// Every catalog genre, ordered by name
    pub async fn all_genres(&self) -> Vec<Genre> {
        let map = self.genre_map().await;
        let mut genres: Vec<Genre> = map
            .iter()
            .map(|(&id, name)| Genre::new(id, name.clone()))
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        genres
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Drop every cached item, list and the genre map
    pub fn invalidate_all(&self) {
        self.inner.items.clear();
        self.inner.lists.clear();
        *self.inner.genres.write() = None;
        info!("Catalog caches cleared");
    }

    /// Remove stale cache entries; returns how many were dropped. Safe to
    /// run alongside reads and writes.
    pub fn evict_expired(&self) -> usize {
        let items = self.inner.items.evict_expired();
        let lists = self.inner.lists.evict_expired();
        debug!(items, lists, "Evicted expired catalog entries");
        items + lists
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Full poster URL, e.g. size `w500`
    pub fn poster_url(&self, path: &str, size: &str) -> Option<String> {
        self.image_url(path, size)
    }

    /// Full profile picture URL, e.g. size `w185`
    pub fn profile_url(&self, path: &str, size: &str) -> Option<String> {
        self.image_url(path, size)
    }

    fn image_url(&self, path: &str, size: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        let base = self.inner.config.image_base_url.trim_end_matches('/');
        Some(format!("{base}/{size}{path}"))
    }

    pub(crate) async fn get_raw(&self, path: &str) -> Result<Value> {
        self.inner.transport.get_json(path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use serde_json::json;
    use std::time::Duration;

    fn movie_json(id: u64, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "popularity": 10.0,
            "genres": [{"id": 28, "name": "Action"}]
        })
    }

    fn client_with(transport: Arc<FakeTransport>) -> CatalogClient {
        CatalogClient::with_transport(transport, CatalogConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_cache_hit_and_expiry() {
        let transport = Arc::new(FakeTransport::new().route("/movie/550", movie_json(550, "Fight Club")));
        let client = client_with(Arc::clone(&transport));

        let first = client.get_item_details(550).await.unwrap().unwrap();
        let second = client.get_item_details(550).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.hits("/movie/550"), 1);

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        client.get_item_details(550).await.unwrap();
        assert_eq!(transport.hits("/movie/550"), 2);
    }

    #[tokio::test]
    async fn test_item_failure_is_absent_and_not_cached() {
        let transport = Arc::new(FakeTransport::new());
        let client = client_with(Arc::clone(&transport));

        assert_eq!(client.get_item_details(42).await.unwrap(), None);
        assert_eq!(client.get_item_details(42).await.unwrap(), None);
        assert_eq!(transport.hits("/movie/42"), 2);
        assert_eq!(client.item_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_zero_id_is_a_contract_violation() {
        let client = client_with(Arc::new(FakeTransport::new()));
        assert!(matches!(
            client.get_item_details(0).await,
            Err(CatalogError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_item_payload_is_absent() {
        let transport = Arc::new(FakeTransport::new().route("/movie/7", json!({"title": "no id"})));
        let client = client_with(transport);
        assert_eq!(client.get_item_details(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_detail_with_other_id_is_absent_and_uncached() {
        let transport = Arc::new(FakeTransport::new().route("/movie/8", movie_json(9, "Wrong film")));
        let client = client_with(Arc::clone(&transport));

        assert_eq!(client.get_item_details(8).await.unwrap(), None);
        assert_eq!(client.item_cache_len(), 0);
        client.get_item_details(8).await.unwrap();
        assert_eq!(transport.hits("/movie/8"), 2);
    }

    #[tokio::test]
    async fn test_list_drops_zero_ids() {
        let transport = Arc::new(FakeTransport::new().route(
            "/movie/popular",
            json!({"results": [
                {"id": 0, "title": "Bogus", "genre_ids": [28]},
                {"id": 3, "title": "Real", "genre_ids": [0, 28]}
            ]}),
        ));
        let client = client_with(transport);

        let films = client.get_list(ListKind::Popular, 1).await;
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].id, 3);
        assert_eq!(films[0].genre_ids().collect::<Vec<_>>(), vec![28]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_cache_keyed_by_kind_and_page() {
        let transport = Arc::new(
            FakeTransport::new()
                .route(
                    "/movie/popular",
                    json!({"results": [{"id": 1, "title": "A", "genre_ids": [28]}]}),
                )
                .route("/genre/movie/list", json!({"genres": [{"id": 28, "name": "Action"}]})),
        );
        let client = client_with(Arc::clone(&transport));

        let page1 = client.get_list(ListKind::Popular, 1).await;
        assert_eq!(page1[0].genres, vec![Genre::new(28, "Action")]);
        client.get_list(ListKind::Popular, 1).await;
        assert_eq!(transport.hits("/movie/popular"), 1);

        client.get_list(ListKind::Popular, 2).await;
        assert_eq!(transport.hits("/movie/popular"), 2);

        tokio::time::advance(Duration::from_secs(10 * 60)).await;
        client.get_list(ListKind::Popular, 1).await;
        assert_eq!(transport.hits("/movie/popular"), 3);

        // Genre map fetched once across all of the above
        assert_eq!(transport.hits("/genre/movie/list"), 1);
    }

    #[tokio::test]
    async fn test_list_failure_is_empty_and_uncached() {
        let transport = Arc::new(FakeTransport::new());
        let client = client_with(Arc::clone(&transport));

        assert!(client.get_list(ListKind::TopRated, 1).await.is_empty());
        assert!(client.get_list(ListKind::TopRated, 1).await.is_empty());
        assert_eq!(transport.hits("/movie/top_rated"), 2);
        assert_eq!(client.list_cache_len(), 0);
    }

    #[tokio::test]
    async fn test_search_is_never_cached() {
        let transport = Arc::new(FakeTransport::new().route(
            "/search/movie",
            json!({"results": [{"id": 603, "title": "Matrix"}]}),
        ));
        let client = client_with(Arc::clone(&transport));

        assert_eq!(client.search("matrix", 1).await.len(), 1);
        assert_eq!(client.search("matrix", 1).await.len(), 1);
        assert_eq!(transport.hits("/search/movie"), 2);
        assert!(client.search("  ", 1).await.is_empty());
        assert_eq!(transport.hits("/search/movie"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_drops_failures_and_timeouts() {
        let transport = Arc::new(
            FakeTransport::new()
                .route("/movie/1", movie_json(1, "One"))
                .route("/movie/3", movie_json(3, "Three"))
                .route("/movie/4", movie_json(4, "Four"))
                .delay("/movie/4", Duration::from_secs(60)),
        );
        let client = client_with(transport);

        let films = client.get_items_in_parallel(&[1, 2, 0, 3, 4]).await;
        let ids: Vec<FilmId> = films.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_respects_concurrency_limit() {
        let mut transport = FakeTransport::new();
        for id in 1..=12u64 {
            transport = transport
                .route(&format!("/movie/{id}"), movie_json(id, "x"))
                .delay(&format!("/movie/{id}"), Duration::from_millis(100));
        }
        let transport = Arc::new(transport);
        let client = client_with(Arc::clone(&transport));

        let ids: Vec<FilmId> = (1..=12).collect();
        let films = client.get_items_in_parallel(&ids).await;

        assert_eq!(films.len(), 12);
        assert!(transport.max_in_flight() <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_and_invalidate() {
        let transport = Arc::new(FakeTransport::new().route("/movie/9", movie_json(9, "Nine")));
        let client = client_with(Arc::clone(&transport));

        client.get_item_details(9).await.unwrap();
        tokio::time::advance(Duration::from_secs(31 * 60)).await;
        assert_eq!(client.evict_expired(), 1);
        assert_eq!(client.item_cache_len(), 0);

        client.get_item_details(9).await.unwrap();
        client.invalidate_all();
        assert_eq!(client.item_cache_len(), 0);
        client.get_item_details(9).await.unwrap();
        assert_eq!(transport.hits("/movie/9"), 3);
    }

    #[test]
    fn test_image_urls() {
        let client = client_with(Arc::new(FakeTransport::new()));
        assert_eq!(
            client.poster_url("/abc.jpg", "w500").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(client.profile_url("", "w185"), None);
    }
}
