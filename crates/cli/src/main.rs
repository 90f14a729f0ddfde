use anyhow::{anyhow, Context, Result};
use board_data::{snapshot, EntityIndex, Game, RatingMatrix};
use clap::{Parser, Subcommand};
use colored::Colorize;
use expert_ranker::{personalize, rank_by_centrality, ExpertPool, RankedExpert, ThreadAuthorship};
use factor_model::LatentFactorModel;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reply_graph::{build_reply_edges, graph_stats, pagerank, ForumWeights, PageRankConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Factor blobs live under `<model_dir>/cf__*.bin`, the id mappings
/// next to them as plain JSON lists.
const MODEL_PREFIX: &str = "cf";
const USER_MAPPING_FILENAME: &str = "cf__user_mapping.json";
const ITEM_MAPPING_FILENAME: &str = "cf__item_mapping.json";

/// Forum categories shown in the report, in display order.
const ANALYSIS_FORUMS: [&str; 3] = ["News", "Reviews", "Strategy"];

/// BGG Experts - forum expert ranking engine
#[derive(Parser)]
#[command(name = "bg-experts")]
#[command(about = "Ranks board game forum experts from reply graphs and rating factors", long_about = None)]
struct Cli {
    /// Path to the snapshot directory (games.json, users_rating.json)
    #[arg(short, long, default_value = "data/snapshot")]
    data_dir: PathBuf,

    /// Directory holding the fitted factor model
    #[arg(short, long, default_value = "data/model")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the latent factor model on the rating snapshot
    Fit {
        /// Latent dimension of the factor model
        #[arg(long, default_value = "64")]
        hidden_dim: usize,

        /// L2 regularization strength for user factors
        #[arg(long, default_value = "1.0")]
        lambda: f64,

        /// L2 regularization strength for item factors
        #[arg(long, default_value = "1.0")]
        mu: f64,

        /// Number of alternating sweeps
        #[arg(long, default_value = "100")]
        sweeps: usize,

        /// RNG seed for reproducible fits
        #[arg(long)]
        seed: Option<u64>,

        /// Hold out this fraction of observed ratings for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,
    },

    /// Rank forum experts for a game, personalized for a user
    Rank {
        /// Username the ranking is personalized for
        #[arg(long)]
        user: String,

        /// Game id to analyze
        #[arg(long)]
        game: String,

        /// Size of the top-centrality analysis window
        #[arg(long, default_value = "15")]
        top_n: usize,

        /// Experts listed per forum category
        #[arg(long, default_value = "2")]
        per_forum: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            hidden_dim,
            lambda,
            mu,
            sweeps,
            seed,
            test_fraction,
        } => handle_fit(
            &cli.data_dir,
            &cli.model_dir,
            hidden_dim,
            lambda,
            mu,
            sweeps,
            seed,
            test_fraction,
        ),
        Commands::Rank {
            user,
            game,
            top_n,
            per_forum,
        } => handle_rank(&cli.data_dir, &cli.model_dir, &user, &game, top_n, per_forum),
    }
}

/// Handle the 'fit' command
#[allow(clippy::too_many_arguments)]
fn handle_fit(
    data_dir: &Path,
    model_dir: &Path,
    hidden_dim: usize,
    lambda: f64,
    mu: f64,
    sweeps: usize,
    seed: Option<u64>,
    test_fraction: Option<f64>,
) -> Result<()> {
    let ratings = snapshot::load_ratings(data_dir)
        .with_context(|| format!("failed to load ratings from {}", data_dir.display()))?;
    let matrix = RatingMatrix::from_store(&ratings)?;
    let (n_users, n_games) = matrix.shape();
    println!(
        "Rating matrix: {} users x {} games, {} observed cells",
        n_users,
        n_games,
        matrix.observed_count()
    );

    // Optional held-out split; the test matrix shares the mappings so
    // predictions line up cell-for-cell.
    let (train, test) = match test_fraction {
        Some(fraction) => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let (train, test) = matrix.train_test_split(fraction, &mut rng)?;
            (train, Some(test))
        }
        None => (matrix.clone(), None),
    };

    let mut model = LatentFactorModel::new(hidden_dim, lambda, mu, sweeps);
    if let Some(seed) = seed {
        model = model.with_seed(seed);
    }

    let start = Instant::now();
    model.fit(train.values())?;
    println!("{} Fitted model in {:?}", "✓".green(), start.elapsed());

    if let Some(final_mse) = model.sweep_mse().last() {
        println!("Final train MSE: {final_mse:.4}");
    }
    if let Some(test) = test {
        let mse = held_out_mse(&model, test.values())?;
        println!("Held-out MSE: {mse:.4}");
    }

    std::fs::create_dir_all(model_dir)?;
    model.save(&model_dir.join(MODEL_PREFIX))?;
    write_mapping(&model_dir.join(USER_MAPPING_FILENAME), matrix.users())?;
    write_mapping(&model_dir.join(ITEM_MAPPING_FILENAME), matrix.games())?;
    println!(
        "{} Saved factors and mappings to {}",
        "✓".green(),
        model_dir.display()
    );
    Ok(())
}

/// Handle the 'rank' command
fn handle_rank(
    data_dir: &Path,
    model_dir: &Path,
    user: &str,
    game_id: &str,
    top_n: usize,
    per_forum: usize,
) -> Result<()> {
    let games = snapshot::load_games(data_dir)
        .with_context(|| format!("failed to load games from {}", data_dir.display()))?;
    let ratings = snapshot::load_ratings(data_dir)?;
    let game = games
        .iter()
        .find(|g| g.id == game_id)
        .ok_or_else(|| anyhow!("game {} not found in snapshot", game_id))?;

    let (model, users) = load_model(model_dir)?;

    print_game_header(game);

    // Reply graph and centrality for this one game.
    let weights = ForumWeights::default();
    let edges = build_reply_edges(&games, &ratings, &weights);
    let Some(game_edges) = edges.for_game(game_id) else {
        println!("No qualifying reply activity for this game; nothing to rank.");
        return Ok(());
    };

    let stats = graph_stats(game_edges);
    println!(
        "Reply graph: {} users, {} edges, average degree {:.2}",
        stats.nodes, stats.edges, stats.average_degree
    );

    let centrality = pagerank(game_edges, &PageRankConfig::default());
    let ranked = rank_by_centrality(&centrality, Some(top_n));
    let ranking = personalize(ranked, model.user_factors()?, &users, user);
    if !ranking.personalized {
        println!(
            "{} user '{}' is unknown to the model; showing pure centrality order",
            "!".yellow(),
            user
        );
    }

    // Hand each forum category its quota from the shared pool.
    let authorship = ThreadAuthorship::from_games(&games);
    let mut pool = ExpertPool::new(ranking.experts);
    for forum in ANALYSIS_FORUMS {
        let selected = pool.take_for_forum(&authorship, game_id, forum, per_forum);
        print_forum_section(forum, &selected, &authorship, game_id, ranking.personalized);
    }

    Ok(())
}

fn print_game_header(game: &Game) {
    println!();
    match game.year_published {
        Some(year) => println!("{} ({})", game.name.bold().blue(), year),
        None => println!("{}", game.name.bold().blue()),
    }
    if !game.categories.is_empty() {
        println!("[{}]", game.categories.join(", "));
    }
    if !game.description.is_empty() {
        println!("{}", game.description);
    }
    println!();
}

fn print_forum_section(
    forum: &str,
    experts: &[RankedExpert],
    authorship: &ThreadAuthorship,
    game_id: &str,
    personalized: bool,
) {
    println!("{}", format!("{forum} experts:").bold().blue());
    if experts.is_empty() {
        println!("  (none)");
        return;
    }
    for (rank, expert) in experts.iter().enumerate() {
        if personalized {
            println!(
                "  {}. {} (centrality {:.4}, similarity {:.3})",
                rank + 1,
                expert.user.green(),
                expert.centrality,
                expert.similarity
            );
        } else {
            println!(
                "  {}. {} (centrality {:.4})",
                rank + 1,
                expert.user.green(),
                expert.centrality
            );
        }
        for thread_id in authorship.thread_ids(&expert.user, game_id, forum) {
            println!("     https://boardgamegeek.com/thread/{thread_id}");
        }
    }
}

/// Mean squared error of the model over a matrix's observed cells.
fn held_out_mse(model: &LatentFactorModel, values: &DMatrix<f64>) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in 0..values.nrows() {
        for col in 0..values.ncols() {
            let actual = values[(row, col)];
            if actual.is_nan() {
                continue;
            }
            let predicted = model.predict(row, col)?;
            sum += (predicted - actual).powi(2);
            count += 1;
        }
    }
    if count == 0 {
        return Err(anyhow!("held-out matrix has no observed cells"));
    }
    Ok(sum / count as f64)
}

fn write_mapping(path: &Path, index: &EntityIndex) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create mapping file {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), index)?;
    Ok(())
}

fn load_model(model_dir: &Path) -> Result<(LatentFactorModel, EntityIndex)> {
    // Hyperparameters only matter for fitting; loading replaces the
    // factor matrices wholesale.
    let mut model = LatentFactorModel::new(0, 0.0, 0.0, 0);
    model
        .load(&model_dir.join(MODEL_PREFIX))
        .with_context(|| format!("failed to load factor model from {}", model_dir.display()))?;

    let path = model_dir.join(USER_MAPPING_FILENAME);
    let file = File::open(&path)
        .with_context(|| format!("failed to open user mapping {}", path.display()))?;
    let mut users: EntityIndex = serde_json::from_reader(BufReader::new(file))?;
    users.rehydrate();

    Ok((model, users))
}
