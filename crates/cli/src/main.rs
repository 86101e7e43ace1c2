mod config;

use anyhow::{Context, Result, anyhow};
use catalog::{CatalogClient, DEFAULT_CAST_LIMIT, ListKind};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use engine::{Recommendation, RecommendationEngine};
use graph_store::{Film, FilmId, GenreId, InteractionGraph};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::Settings;

/// ReelGraph - graph-backed film recommendations
#[derive(Parser)]
#[command(name = "reel-graph")]
#[command(about = "Film recommendations over a user/film/genre interaction graph", long_about = None)]
struct Cli {
    /// Graph snapshot to load and update (overrides REEL_SNAPSHOT)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Films in the user's preferred genres
    GenreAffinity,
    /// Films liked by users who rate alike
    Collaborative,
    /// Films in the genres of the user's highly rated films
    HighRatings,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogList {
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
    /// Needs --film-id
    Similar,
    /// Needs --film-id
    Recommendations,
}

impl CatalogList {
    fn into_kind(self, film_id: Option<FilmId>) -> Result<ListKind> {
        let seed = || film_id.ok_or_else(|| anyhow!("--film-id is required for this list"));
        Ok(match self {
            CatalogList::Popular => ListKind::Popular,
            CatalogList::TopRated => ListKind::TopRated,
            CatalogList::NowPlaying => ListKind::NowPlaying,
            CatalogList::Upcoming => ListKind::Upcoming,
            CatalogList::Similar => ListKind::Similar(seed()?),
            CatalogList::Recommendations => ListKind::Recommendations(seed()?),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Blended recommendations for a user (trending without one)
    Recommend {
        #[arg(long)]
        user_id: Option<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Show why each film was picked
        #[arg(long)]
        explain: bool,
    },

    /// Run a single strategy for a user
    Strategy {
        #[arg(long)]
        user_id: String,

        #[arg(long, value_enum)]
        kind: Strategy,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Films sharing genres with a film
    Similar {
        #[arg(long)]
        film_id: FilmId,

        /// Leave out films this user watched
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Films many users rated well
    Trending {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Films in one genre, graph first with catalog backfill
    ByGenre {
        #[arg(long)]
        genre_id: GenreId,

        #[arg(long)]
        user_id: Option<String>,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Rate a film from 1 to 10
    Rate {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        film_id: FilmId,

        #[arg(long, required_unless_present = "remove")]
        score: Option<u8>,

        /// Remove the rating instead
        #[arg(long)]
        remove: bool,
    },

    /// Mark a film as watched
    Watch {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        film_id: FilmId,
    },

    /// Add or remove a favorite
    Favorite {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        film_id: FilmId,

        #[arg(long)]
        remove: bool,
    },

    /// Add to or remove from the watchlist
    Watchlist {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        film_id: FilmId,

        #[arg(long)]
        remove: bool,
    },

    /// Replace a user's preferred genres
    Prefer {
        #[arg(long)]
        user_id: String,

        /// Comma separated genre ids, e.g. 28,878
        #[arg(long, value_delimiter = ',', required = true)]
        genres: Vec<GenreId>,
    },

    /// Show a user's profile and activity
    User {
        #[arg(long)]
        user_id: String,
    },

    /// Search the catalog by title
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show a catalog list and store its films in the graph
    List {
        #[arg(long, value_enum)]
        kind: CatalogList,

        #[arg(long)]
        film_id: Option<FilmId>,

        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one film
    Details {
        #[arg(long)]
        film_id: FilmId,
    },

    /// Show a film's director and cast
    Cast {
        #[arg(long)]
        film_id: FilmId,

        #[arg(long, default_value_t = DEFAULT_CAST_LIMIT)]
        limit: usize,
    },

    /// Show a person and their films
    Person {
        #[arg(long)]
        person_id: u64,

        /// List films they directed instead of acted in
        #[arg(long)]
        directed: bool,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Fetch films from the catalog in parallel and store them in the graph
    Fetch {
        /// Comma separated film ids
        #[arg(long, value_delimiter = ',', required = true)]
        film_ids: Vec<FilmId>,
    },

    /// Pull catalog genre names into the graph
    SyncGenres,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

impl Commands {
    /// Commands that may change the graph and need the snapshot written
    /// back. Recommendation queries count: catalog films they return are
    /// synced into the graph.
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Commands::Trending { .. }
                | Commands::User { .. }
                | Commands::Cast { .. }
                | Commands::Person { .. }
                | Commands::Benchmark { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let snapshot = cli.snapshot.clone().unwrap_or(settings.app.snapshot.clone());

    let start = Instant::now();
    let graph = Arc::new(load_graph(&snapshot)?);
    println!(
        "{} Loaded graph ({} films, {} users) in {:?}",
        "✓".green(),
        graph.film_count(),
        graph.user_count(),
        start.elapsed()
    );

    let catalog = CatalogClient::new(settings.catalog.clone())
        .context("Failed to build catalog client")?;
    let engine = RecommendationEngine::with_config(graph.clone(), catalog, settings.engine.clone());

    let mutates = cli.command.mutates();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
        } => {
            let recs = engine
                .personalized_recommendations(user_id.as_deref(), limit)
                .await?;
            print_recommendations("Recommendations", &recs, explain);
        }
        Commands::Strategy {
            user_id,
            kind,
            limit,
        } => {
            let recs = match kind {
                Strategy::GenreAffinity => {
                    engine.recommendations_by_favorite_genres(&user_id, limit).await?
                }
                Strategy::Collaborative => {
                    engine.collaborative_recommendations(&user_id, limit).await?
                }
                Strategy::HighRatings => {
                    engine.recommendations_by_high_ratings(&user_id, limit).await?
                }
            };
            print_recommendations("Strategy results", &recs, true);
        }
        Commands::Similar {
            film_id,
            user_id,
            limit,
        } => {
            let recs = engine
                .similar_films(film_id, user_id.as_deref(), limit)
                .await?;
            print_recommendations(&format!("Similar to {film_id}"), &recs, true);
        }
        Commands::Trending { limit } => {
            let recs = engine.trending_films(limit).await?;
            print_recommendations("Trending", &recs, true);
        }
        Commands::ByGenre {
            genre_id,
            user_id,
            limit,
        } => {
            let recs = engine
                .recommendations_by_genre(genre_id, user_id.as_deref(), limit)
                .await?;
            print_recommendations(&format!("Genre {genre_id}"), &recs, false);
        }
        Commands::Rate {
            user_id,
            film_id,
            score,
            remove,
        } => {
            if remove {
                let removed = engine.remove_rating(&user_id, film_id)?;
                print_toggle(removed, "Removed rating", "No rating to remove");
            } else {
                let score = score.ok_or_else(|| anyhow!("--score is required"))?;
                engine.rate_film(&user_id, film_id, score).await?;
                println!("{} Rated {} as {}", "✓".green(), film_id, score);
            }
        }
        Commands::Watch { user_id, film_id } => {
            engine.mark_watched(&user_id, film_id).await?;
            println!("{} Marked {} as watched", "✓".green(), film_id);
        }
        Commands::Favorite {
            user_id,
            film_id,
            remove,
        } => {
            if remove {
                let removed = engine.remove_favorite(&user_id, film_id)?;
                print_toggle(removed, "Removed favorite", "Not a favorite");
            } else {
                engine.add_favorite(&user_id, film_id).await?;
                println!("{} Added {} to favorites", "✓".green(), film_id);
            }
        }
        Commands::Watchlist {
            user_id,
            film_id,
            remove,
        } => {
            if remove {
                let removed = engine.remove_from_watchlist(&user_id, film_id)?;
                print_toggle(removed, "Removed from watchlist", "Not on the watchlist");
            } else {
                engine.add_to_watchlist(&user_id, film_id).await?;
                println!("{} Added {} to watchlist", "✓".green(), film_id);
            }
        }
        Commands::Prefer { user_id, genres } => {
            engine.set_preferred_genres(&user_id, &genres).await?;
            println!("{} Preferred genres updated", "✓".green());
        }
        Commands::User { user_id } => handle_user(&engine, &user_id)?,
        Commands::Search { query, page } => {
            let films = engine.search_films(&query, page).await?;
            println!("{}", format!("Search results for '{query}':").bold().blue());
            for film in &films {
                print_film_line(film);
            }
        }
        Commands::List {
            kind,
            film_id,
            page,
        } => {
            let kind = kind.into_kind(film_id)?;
            let films = engine.catalog().get_list(kind.clone(), page).await;
            engine.sync().persist_films(&films);
            println!("{}", format!("{kind} (page {page}):").bold().blue());
            for film in &films {
                print_film_line(film);
            }
        }
        Commands::Details { film_id } => match engine.film_details(film_id).await? {
            Some(film) => print_film_details(&engine, &film),
            None => println!("{} Film {} not found", "✗".red(), film_id),
        },
        Commands::Cast { film_id, limit } => handle_cast(&engine, film_id, limit).await?,
        Commands::Person {
            person_id,
            directed,
            limit,
        } => handle_person(&engine, person_id, directed, limit).await?,
        Commands::Fetch { film_ids } => {
            let films = engine.catalog().get_items_in_parallel(&film_ids).await;
            let persisted = engine.sync().persist_films(&films);
            println!(
                "{} Fetched {} of {} films, stored {}",
                "✓".green(),
                films.len(),
                film_ids.len(),
                persisted
            );
        }
        Commands::SyncGenres => {
            let synced = engine.sync().sync_genres().await;
            println!("{} Synced {} genres", "✓".green(), synced);
        }
        Commands::Benchmark { requests, limit } => {
            handle_benchmark(
                &engine,
                &graph,
                requests,
                limit,
                Duration::from_secs(settings.app.cache_maintenance_secs.max(1)),
            )
            .await?
        }
    }

    if mutates {
        save_graph(&graph, &snapshot)?;
    }

    Ok(())
}

/// Load the snapshot, or start empty when it does not exist yet
fn load_graph(path: &Path) -> Result<InteractionGraph> {
    if !path.exists() {
        println!(
            "{} No snapshot at {}, starting with an empty graph",
            "•".yellow(),
            path.display()
        );
        return Ok(InteractionGraph::new());
    }
    InteractionGraph::load_snapshot(path)
        .with_context(|| format!("Failed to load graph snapshot {}", path.display()))
}

fn save_graph(graph: &InteractionGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    graph
        .save_snapshot(path)
        .with_context(|| format!("Failed to save graph snapshot {}", path.display()))
}

/// Handle the 'user' command
fn handle_user(engine: &RecommendationEngine, user_id: &str) -> Result<()> {
    let stats = engine.user_stats(user_id)?;
    let store = engine.store();

    println!("{}", format!("User: {user_id}").bold().blue());
    println!("{}Watched: {}", "• ".green(), stats.watched_count);
    println!("{}Rated: {}", "• ".green(), stats.rated_count);
    println!("{}Favorites: {}", "• ".green(), stats.favorites_count);
    println!("{}Watchlist: {}", "• ".green(), stats.watchlist_count);

    let genres = store
        .preferred_genres(user_id)?
        .into_iter()
        .map(|g| g.name)
        .collect::<Vec<_>>()
        .join(", ");
    println!("{}Preferred genres: {}", "• ".cyan(), genres);

    println!("Recent ratings:");
    for rating in store.user_ratings(user_id)?.iter().take(10) {
        let title = store
            .film(rating.film_id)?
            .map(|f| f.title)
            .unwrap_or_default();
        println!("  - {} ({}): {}/10", title, rating.film_id, rating.score);
    }

    println!("Watchlist:");
    for film in store.watchlist(user_id)? {
        print_film_line(&film);
    }
    Ok(())
}

/// Handle the 'cast' command
async fn handle_cast(engine: &RecommendationEngine, film_id: FilmId, limit: usize) -> Result<()> {
    let catalog = engine.catalog();
    if let Some(director) = catalog.movie_director(film_id).await? {
        println!("{} {}", "Director:".bold(), director.name);
    }

    println!("{}", "Cast:".bold().blue());
    for person in catalog.movie_cast(film_id, limit).await? {
        println!(
            "  {} as {}",
            person.name,
            person.character.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

/// Handle the 'person' command
async fn handle_person(
    engine: &RecommendationEngine,
    person_id: u64,
    directed: bool,
    limit: usize,
) -> Result<()> {
    let catalog = engine.catalog();
    let person = catalog
        .person_details(person_id)
        .await?
        .ok_or_else(|| anyhow!("Person {} not found", person_id))?;

    println!("{}", person.name.bold().blue());
    if let Some(birthday) = &person.birthday {
        println!(
            "{}Born {} {}",
            "• ".green(),
            birthday,
            person.place_of_birth.as_deref().unwrap_or("")
        );
    }
    if let Some(url) = person
        .profile_path
        .as_deref()
        .and_then(|p| catalog.profile_url(p, "w185"))
    {
        println!("{}{}", "• ".green(), url);
    }
    if let Some(bio) = &person.biography {
        println!("{bio}");
    }

    let films = if directed {
        catalog.director_movies(person_id, limit).await?
    } else {
        catalog.person_movies(person_id, limit).await?
    };
    let heading = if directed { "Directed:" } else { "Known for:" };
    println!("{}", heading.bold());
    for film in &films {
        print_film_line(film);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: &RecommendationEngine,
    graph: &InteractionGraph,
    requests: usize,
    limit: usize,
    maintenance_period: Duration,
) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    // Random users from the graph; anonymous requests when it has none
    let users = graph.user_ids();
    let picks: Vec<Option<String>> = (0..requests)
        .map(|_| {
            if users.is_empty() {
                None
            } else {
                Some(users[rand::random_range(0..users.len())].clone())
            }
        })
        .collect();

    // Periodic cache eviction while requests are in flight
    let catalog = engine.catalog().clone();
    let maintenance = tokio::spawn(async move {
        let mut interval = tokio::time::interval(maintenance_period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = catalog.evict_expired();
            debug!(evicted, "Cache maintenance tick");
        }
    });

    let started = Instant::now();
    let mut handles = vec![];
    for user in picks {
        let engine = engine.clone();
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            engine
                .personalized_recommendations(user.as_deref(), limit)
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = started.elapsed();
    maintenance.abort();

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    println!(
        "Catalog cache: {} items, {} lists",
        engine.catalog().item_cache_len(),
        engine.catalog().list_cache_len()
    );

    Ok(())
}

fn print_toggle(changed: bool, done: &str, noop: &str) {
    if changed {
        println!("{} {}", "✓".green(), done);
    } else {
        println!("{} {}", "•".yellow(), noop);
    }
}

fn genre_names(film: &Film) -> String {
    film.genres
        .iter()
        .map(|g| if g.name.is_empty() { g.id.to_string() } else { g.name.clone() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_film_line(film: &Film) {
    let year = film
        .release_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .unwrap_or("????");
    println!(
        "  {}: {} ({}) [{}] ★ {:.1}",
        film.id,
        film.title,
        year,
        genre_names(film),
        film.vote_average
    );
}

fn print_film_details(engine: &RecommendationEngine, film: &Film) {
    println!("{}", film.title.bold().blue());
    println!("{}Id: {}", "• ".green(), film.id);
    println!("{}Genres: {}", "• ".green(), genre_names(film));
    if let Some(date) = &film.release_date {
        println!("{}Released: {}", "• ".green(), date);
    }
    println!(
        "{}Votes: {:.1} ({} votes), popularity {:.1}",
        "• ".green(),
        film.vote_average,
        film.vote_count,
        film.popularity
    );
    if let Some(url) = film
        .poster_path
        .as_deref()
        .and_then(|p| engine.catalog().poster_url(p, "w500"))
    {
        println!("{}Poster: {}", "• ".green(), url);
    }
    if let Some(overview) = &film.overview {
        println!("{overview}");
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(header: &str, recommendations: &[Recommendation], explain: bool) {
    println!("{}", format!("{header}:").bold().blue());
    if recommendations.is_empty() {
        println!("  (nothing to recommend)");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} ({}) [{}] - {}",
            (i + 1).to_string().green(),
            rec.film.title,
            rec.film.id,
            genre_names(&rec.film),
            rec.source.to_string().cyan()
        );
        if explain {
            println!("   {}", rec.explanation);
        }
    }
}
