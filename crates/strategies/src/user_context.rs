//! Build a [`UserContext`] from the interaction graph.

use graph_store::{EdgeKind, GraphStore, Result};

use crate::types::UserContext;

/// Gather a user's watched set, ratings and genre preferences in one pass.
///
/// Unknown users are not an error: they get an empty context and fall
/// through to the trending strategy.
pub fn build_user_context(
    store: &dyn GraphStore,
    user_id: &str,
    high_rating_threshold: u8,
) -> Result<UserContext> {
    let mut context = UserContext::new(user_id);

    context.watched = store.edge_targets(user_id, EdgeKind::Watched)?;
    context.preferred_genres = store
        .preferred_genres(user_id)?
        .into_iter()
        .map(|g| g.id)
        .collect();

    let ratings = store.user_ratings(user_id)?;
    let mut highly_rated: Vec<(u64, u8)> = Vec::new();
    for rating in ratings {
        context.rated.insert(rating.film_id, rating.score);
        if rating.score >= high_rating_threshold {
            highly_rated.push((rating.film_id, rating.score));
        }
    }
    highly_rated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    context.highly_rated = highly_rated.into_iter().map(|(id, _)| id).collect();

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::{Film, Genre, InteractionGraph};

    #[test]
    fn test_build_user_context() {
        let graph = InteractionGraph::new();
        for id in 1..=4 {
            graph
                .upsert_film(&Film::new(id, format!("Film {id}")).with_genres(vec![Genre::new(28, "Action")]))
                .unwrap();
        }
        graph.rate("u1", 1, 9).unwrap();
        graph.rate("u1", 2, 4).unwrap();
        graph.rate("u1", 3, 7).unwrap();
        graph.mark_watched("u1", 4).unwrap();
        graph.set_preferred_genres("u1", &[28]).unwrap();

        let ctx = build_user_context(&graph, "u1", 7).unwrap();
        assert_eq!(ctx.rated.len(), 3);
        assert_eq!(ctx.highly_rated, vec![1, 3]);
        assert!(ctx.watched.contains(&4));
        assert_eq!(ctx.preferred_genres, vec![28]);
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let graph = InteractionGraph::new();
        let ctx = build_user_context(&graph, "nobody", 7).unwrap();
        assert!(ctx.is_cold());
        assert!(ctx.watched.is_empty());
    }
}
