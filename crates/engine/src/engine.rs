//! # Recommendation Engine
//!
//! Coordinates the strategies into one recommendation list:
//! 1. Build the user context from the graph
//! 2. Genre affinity takes its quota (catalog discovery, graph fallback)
//! 3. Collaborative filtering takes its quota
//! 4. Rating propagation takes its quota
//! 5. Trending fills whatever is left
//!
//! Strategies run one after another; the order is what makes first-seen-wins
//! deduplication deterministic. CPU-bound graph traversals run on the
//! blocking pool. A strategy that fails is logged and contributes nothing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use catalog::{CatalogClient, ListKind};
use graph_store::{EdgeKind, Film, FilmId, GenreId, GraphStore};
use pipeline::filters::{AlreadyWatchedFilter, ExcludeIdsFilter, GenreFilter};
use pipeline::{quota, FilterPipeline, QuotaMerge};
use strategies::{
    build_user_context, Candidate, CandidateSource, CollaborativeSource, GenreAffinitySource,
    PropagationSource, SimilarSource, TrendingSource, UserContext,
};
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{optional_user, require_film, require_genre, require_user, Result};
use crate::recommendation::Recommendation;
use crate::sync::CatalogSync;

/// Main engine that answers every recommendation query
#[derive(Clone)]
pub struct RecommendationEngine {
    pub(crate) store: Arc<dyn GraphStore>,
    pub(crate) catalog: CatalogClient,
    pub(crate) sync: CatalogSync,
    config: EngineConfig,
    genre_affinity: GenreAffinitySource,
    collaborative: CollaborativeSource,
    propagation: PropagationSource,
    trending: TrendingSource,
    similar: SimilarSource,
}

/// Run a graph traversal on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> graph_store::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// A failed strategy degrades to an empty contribution
fn or_degrade(source: CandidateSource, result: Result<Vec<Candidate>>) -> Vec<Candidate> {
    result.unwrap_or_else(|e| {
        warn!(strategy = %source, error = %e, "Strategy failed, contributing nothing");
        Vec::new()
    })
}

fn into_recommendations(candidates: Vec<Candidate>) -> Vec<Recommendation> {
    candidates.into_iter().map(Recommendation::from).collect()
}

fn catalog_candidates(films: Vec<Film>) -> Vec<Candidate> {
    films
        .into_iter()
        .map(|film| {
            let popularity = film.popularity as f32;
            Candidate::new(film, CandidateSource::Catalog, popularity)
        })
        .collect()
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn GraphStore>, catalog: CatalogClient) -> Self {
        Self::with_config(store, catalog, EngineConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn GraphStore>,
        catalog: CatalogClient,
        config: EngineConfig,
    ) -> Self {
        let collaborative = CollaborativeSource::new(Arc::clone(&store))
            .with_high_rating_threshold(config.high_rating_threshold)
            .with_min_shared_films(config.min_shared_films)
            .with_max_score_diff(config.max_score_diff)
            .with_max_neighbors(config.max_neighbors);
        let propagation =
            PropagationSource::new(Arc::clone(&store)).with_top_genres(config.top_propagation_genres);
        let trending =
            TrendingSource::new(Arc::clone(&store)).with_min_ratings(config.min_trending_ratings);

        Self {
            sync: CatalogSync::new(Arc::clone(&store), catalog.clone()),
            genre_affinity: GenreAffinitySource::new(Arc::clone(&store)),
            similar: SimilarSource::new(Arc::clone(&store)),
            collaborative,
            propagation,
            trending,
            store,
            catalog,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn sync(&self) -> &CatalogSync {
        &self.sync
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Personalized
    // =========================================================================

    /// Main entry point: blended recommendations for a user.
    ///
    /// Without a user id this is exactly [`trending_films`](Self::trending_films).
    /// Otherwise genre affinity, collaborative filtering and rating
    /// propagation each take their quota in that order, trending fills the
    /// rest, and the result never exceeds `limit` or repeats a film.
    #[instrument(skip(self))]
    pub async fn personalized_recommendations(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let Some(user_id) = optional_user(user_id) else {
            return self.trending_films(limit).await;
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        let start_time = Instant::now();

        let context = match self.user_context(user_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(user_id, error = %e, "Could not read user context, using an empty one");
                UserContext::new(user_id)
            }
        };

        let mut merge = QuotaMerge::new(limit);

        let genre_quota = quota(limit, self.config.genre_affinity_share);
        let genre = or_degrade(
            CandidateSource::GenreAffinity,
            self.genre_affinity_candidates(&context, genre_quota).await,
        );
        let genre_taken = merge.take(genre, genre_quota);

        let collab_quota = quota(limit, self.config.collaborative_share);
        let collab = or_degrade(
            CandidateSource::Collaborative,
            self.collaborative_candidates(&context, collab_quota).await,
        );
        let collab_taken = merge.take(collab, collab_quota);

        let propagation_quota = quota(limit, self.config.propagation_share);
        let propagation = or_degrade(
            CandidateSource::RatingPropagation,
            self.propagation_candidates(&context, propagation_quota).await,
        );
        let propagation_taken = merge.take(propagation, propagation_quota);

        let mut trending_taken = 0;
        if !merge.is_full() {
            let exclude = merge.selected_ids().clone();
            let trending = or_degrade(
                CandidateSource::Trending,
                self.trending_candidates(merge.remaining(), &exclude).await,
            );
            trending_taken = merge.fill(trending);
        }

        let recommendations = into_recommendations(merge.finish());
        info!(
            user_id,
            genre_affinity = genre_taken,
            collaborative = collab_taken,
            propagation = propagation_taken,
            trending = trending_taken,
            total = recommendations.len(),
            "Merged personalized recommendations in {:.2?}",
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    pub(crate) async fn user_context(&self, user_id: &str) -> Result<UserContext> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        let threshold = self.config.high_rating_threshold;
        blocking(move || build_user_context(store.as_ref(), &user_id, threshold)).await
    }

    // =========================================================================
    // Strategy A: genre affinity
    // =========================================================================

    /// Films in the user's preferred genres, by the catalog's popularity
    /// ordering. Falls back to the graph's genre index when the catalog has
    /// nothing. Yields nothing for a user without preferences.
    async fn genre_affinity_candidates(
        &self,
        context: &UserContext,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        if context.preferred_genres.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let kind = ListKind::discover(context.preferred_genres.iter().copied());
        let discovered = self.catalog.get_list(kind, 1).await;
        if !discovered.is_empty() {
            self.sync.persist_films(&discovered);
            let candidates = self.genre_affinity.rank_films(context, discovered, limit);
            if !candidates.is_empty() {
                debug!("Generated {} genre-affinity candidates from catalog", candidates.len());
                return Ok(candidates);
            }
        }

        debug!("Catalog discovery empty, using the graph genre index");
        let source = self.genre_affinity.clone();
        let context = context.clone();
        blocking(move || source.get_candidates(&context, limit)).await
    }

    /// Standalone genre-affinity query. A user without preferences gets the
    /// popularity list instead (catalog first, then the graph).
    #[instrument(skip(self))]
    pub async fn recommendations_by_favorite_genres(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let user_id = require_user(user_id)?;
        let context = self.user_context(user_id).await?;

        if !context.preferred_genres.is_empty() {
            let candidates = self.genre_affinity_candidates(&context, limit).await?;
            return Ok(into_recommendations(candidates));
        }

        debug!("No preferred genres, substituting popular films");
        let popular = self.catalog.get_list(ListKind::Popular, 1).await;
        let mut candidates = self.genre_affinity.rank_films(&context, popular, limit);
        if candidates.is_empty() {
            let source = self.genre_affinity.clone();
            let context = context.clone();
            candidates = blocking(move || source.popularity_substitute(&context, limit)).await?;
        }
        Ok(into_recommendations(candidates))
    }

    // =========================================================================
    // Strategy B: collaborative filtering
    // =========================================================================

    async fn collaborative_candidates(
        &self,
        context: &UserContext,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let source = self.collaborative.clone();
        let context = context.clone();
        blocking(move || source.get_candidates(&context, limit)).await
    }

    #[instrument(skip(self))]
    pub async fn collaborative_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let user_id = require_user(user_id)?;
        let context = self.user_context(user_id).await?;
        Ok(into_recommendations(
            self.collaborative_candidates(&context, limit).await?,
        ))
    }

    // =========================================================================
    // Strategy C: rating propagation
    // =========================================================================

    async fn propagation_candidates(
        &self,
        context: &UserContext,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let source = self.propagation.clone();
        let context = context.clone();
        blocking(move || source.get_candidates(&context, limit)).await
    }

    #[instrument(skip(self))]
    pub async fn recommendations_by_high_ratings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let user_id = require_user(user_id)?;
        let context = self.user_context(user_id).await?;
        Ok(into_recommendations(
            self.propagation_candidates(&context, limit).await?,
        ))
    }

    // =========================================================================
    // Strategy D: trending
    // =========================================================================

    /// Up to `limit` trending films not in `exclude`, backfilled from the
    /// catalog's popularity list when the graph has too few.
    async fn trending_candidates(
        &self,
        limit: usize,
        exclude: &HashSet<FilmId>,
    ) -> Result<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let source = self.trending.clone();
        let wanted = limit.saturating_add(exclude.len());
        let mut candidates: Vec<Candidate> = blocking(move || source.get_candidates(wanted))
            .await?
            .into_iter()
            .filter(|c| !exclude.contains(&c.film_id()))
            .take(limit)
            .collect();

        if candidates.len() < limit {
            let popular = self.catalog.get_list(ListKind::Popular, 1).await;
            let selected = candidates.iter().map(|c| c.film_id());
            let backfill = FilterPipeline::new()
                .add_filter(ExcludeIdsFilter::new(exclude.iter().copied().chain(selected)))
                .apply(catalog_candidates(popular), &UserContext::default())?;

            let mut merge = QuotaMerge::new(limit);
            merge.fill(candidates);
            let added = merge.fill(backfill);
            debug!("Backfilled {} trending slots from the catalog", added);
            candidates = merge.finish();
        }

        Ok(candidates)
    }

    /// Films many users rated well, backfilled from the catalog
    #[instrument(skip(self))]
    pub async fn trending_films(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let candidates = self.trending_candidates(limit, &HashSet::new()).await?;
        Ok(into_recommendations(candidates))
    }

    // =========================================================================
    // Auxiliary queries
    // =========================================================================

    /// Films sharing a genre with `film_id`, excluding the film itself and,
    /// when a user is given, films that user watched
    #[instrument(skip(self))]
    pub async fn similar_films(
        &self,
        film_id: FilmId,
        exclude_user: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let film_id = require_film(film_id)?;

        // A seed only known to the catalog is synced first so its genres
        // are in the graph
        if self.store.film(film_id)?.is_none() {
            if let Some(film) = self.catalog.get_item_details(film_id).await? {
                self.sync.upsert_film(&film)?;
            }
        }

        let exclude = match optional_user(exclude_user) {
            Some(user) => self.store.edge_targets(user, EdgeKind::Watched)?,
            None => HashSet::new(),
        };

        let source = self.similar.clone();
        let candidates =
            blocking(move || source.get_candidates(film_id, &exclude, limit)).await?;
        Ok(into_recommendations(candidates))
    }

    /// Graph first, then catalog backfill for one genre.
    ///
    /// Reads up to `2 * limit` films from the graph, drops the user's
    /// watched films and caps at `limit`. If that is short, catalog
    /// discovery for the genre fills the rest and the films it contributes
    /// are persisted.
    #[instrument(skip(self))]
    pub async fn recommendations_by_genre(
        &self,
        genre_id: GenreId,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let genre_id = require_genre(genre_id)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let context = match optional_user(user_id) {
            Some(user) => self.user_context(user).await?,
            None => UserContext::default(),
        };

        let from_graph: Vec<Candidate> = self
            .store
            .films_by_genre(genre_id, limit.saturating_mul(2))?
            .into_iter()
            .map(|film| {
                let popularity = film.popularity as f32;
                Candidate::new(film, CandidateSource::GenreAffinity, popularity)
            })
            .collect();
        let watched = FilterPipeline::new().add_filter(AlreadyWatchedFilter);

        let mut merge = QuotaMerge::new(limit);
        merge.fill(watched.apply(from_graph, &context)?);

        if !merge.is_full() {
            let discovered = self.catalog.get_list(ListKind::discover([genre_id]), 1).await;
            let mut backfill = FilterPipeline::new()
                .add_filter(AlreadyWatchedFilter)
                .add_filter(ExcludeIdsFilter::new(merge.selected_ids().iter().copied()))
                .add_filter(GenreFilter::new(genre_id))
                .apply(catalog_candidates(discovered), &context)?;
            backfill.truncate(merge.remaining());

            let films: Vec<_> = backfill.iter().map(|c| c.film.clone()).collect();
            self.sync.persist_films(&films);
            let added = merge.fill(backfill);
            debug!("Backfilled {} genre slots from the catalog", added);
        }

        Ok(into_recommendations(merge.finish()))
    }
}
