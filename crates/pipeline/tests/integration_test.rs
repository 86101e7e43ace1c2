//! Integration tests for the pipeline.
//!
//! These tests run real strategies over a small graph and push their output
//! through filters and the quota merge.

use std::collections::HashSet;
use std::sync::Arc;

use graph_store::{Film, FilmId, Genre, GraphStore, InteractionGraph};
use pipeline::filters::*;
use pipeline::{quota, FilterPipeline, QuotaMerge};
use strategies::{
    build_user_context, CandidateSource, GenreAffinitySource, PropagationSource, TrendingSource,
};

const ACTION: u32 = 28;
const DRAMA: u32 = 18;

fn create_test_store() -> Arc<InteractionGraph> {
    let graph = InteractionGraph::new();
    let action = Genre::new(ACTION, "Action");
    let drama = Genre::new(DRAMA, "Drama");

    for (id, genre, popularity) in [
        (1, &action, 90.0),
        (2, &action, 80.0),
        (3, &action, 70.0),
        (4, &drama, 60.0),
        (5, &drama, 50.0),
        (6, &drama, 40.0),
    ] {
        graph
            .upsert_film(
                &Film::new(id, format!("Film {id}"))
                    .with_popularity(popularity)
                    .with_genres(vec![genre.clone()]),
            )
            .unwrap();
    }

    // Film 4 and 5 trend: three ratings each
    for rater in ["a", "b", "c"] {
        graph.rate(rater, 4, 9).unwrap();
        graph.rate(rater, 5, 7).unwrap();
    }

    graph.set_preferred_genres("u1", &[ACTION]).unwrap();
    graph.mark_watched("u1", 1).unwrap();
    Arc::new(graph)
}

fn film_ids(candidates: &[strategies::Candidate]) -> Vec<FilmId> {
    candidates.iter().map(|c| c.film_id()).collect()
}

#[test]
fn test_genre_affinity_then_trending_merge() {
    let store = create_test_store();
    let ctx = build_user_context(store.as_ref(), "u1", 7).unwrap();

    let affinity = GenreAffinitySource::new(store.clone());
    let trending = TrendingSource::new(store.clone());

    let limit = 10;
    let mut merge = QuotaMerge::new(limit);
    let taken = merge.take(
        affinity.get_candidates(&ctx, quota(limit, 0.4)).unwrap(),
        quota(limit, 0.4),
    );
    merge.fill(trending.get_candidates(limit).unwrap());

    let merged = merge.finish();
    assert_eq!(taken, 2);
    assert_eq!(film_ids(&merged), vec![2, 3, 4, 5]);
    assert_eq!(merged[0].source, CandidateSource::GenreAffinity);
    assert_eq!(merged[2].source, CandidateSource::Trending);

    let unique: HashSet<FilmId> = film_ids(&merged).into_iter().collect();
    assert_eq!(unique.len(), merged.len());
}

#[test]
fn test_filters_compose_before_merge() {
    let store = create_test_store();
    store.rate("u1", 4, 9).unwrap();
    store.mark_watched("u1", 5).unwrap();
    let ctx = build_user_context(store.as_ref(), "u1", 7).unwrap();

    // Propagation picks Drama from the rating on film 4
    let candidates = PropagationSource::new(store.clone())
        .get_candidates(&ctx, 10)
        .unwrap();
    assert_eq!(film_ids(&candidates), vec![6]);

    let pipeline = FilterPipeline::new()
        .add_filter(AlreadyWatchedFilter)
        .add_filter(GenreFilter::new(DRAMA))
        .add_filter(ExcludeIdsFilter::new([6]));
    assert_eq!(pipeline.len(), 3);

    let filtered = pipeline.apply(candidates, &ctx).unwrap();
    assert!(filtered.is_empty());
}
