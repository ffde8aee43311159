//! CLI commands for gridplay-api.
//!
//! Supports API server mode, offline prediction from a file, and reading
//! a race leaderboard straight from the battle store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregator::{aggregate, validate_grid};
use crate::config::AppConfig;
use crate::model::load_oracle;
use crate::storage::BattleRepository;
use crate::types::{PostQualifyingRequest, PostQualifyingResponse};

#[derive(Parser)]
#[command(name = "gridplay-api")]
#[command(version, about = "GridPlay: race prediction API and CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compute win probabilities for a qualifying JSON file
    Predict {
        /// Path to a {"race_id", "qualifying_pos"} JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Model path override
        #[arg(short, long, conflicts_with = "no_model")]
        model: Option<PathBuf>,

        /// Ignore the pairwise model and use the grid-position heuristic
        #[arg(long)]
        no_model: bool,
    },

    /// Print the leaderboard for a race
    Leaderboard {
        /// Race identifier, e.g. 2023-01-bahrain
        race_id: String,

        /// Number of rows (defaults to the configured query limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Database path override
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Run CLI prediction from file.
pub fn run_predict(
    input: PathBuf,
    format: String,
    model_path: Option<PathBuf>,
    no_model: bool,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(path) = model_path {
        config.model.path = path.to_string_lossy().to_string();
    }
    if no_model {
        config.model.enabled = false;
    }

    let input_json = std::fs::read_to_string(&input)?;
    let req: PostQualifyingRequest = serde_json::from_str(&input_json)?;

    if let Err(msg) = validate_grid(&req.qualifying_pos) {
        anyhow::bail!("{} (got {} drivers)", msg, req.qualifying_pos.len());
    }

    let oracle = load_oracle(&config.model);
    eprintln!(
        "Processing race: {} ({} drivers, {})",
        req.race_id,
        req.qualifying_pos.len(),
        if oracle.is_some() { "pairwise model" } else { "grid heuristic" }
    );

    let win_probs = aggregate(&req.qualifying_pos, oracle.as_deref());
    let response = PostQualifyingResponse::new(req.race_id, win_probs);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "table" => {
            print_table(&response);
        }
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Print prediction results in table format.
fn print_table(response: &PostQualifyingResponse) {
    println!("Race: {}", response.race_id);
    println!();

    println!("=== Win Probabilities ===");
    let mut sorted: Vec<_> = response.predictions.iter().collect();
    sorted.sort_by(|a, b| b.1.win_prob.total_cmp(&a.1.win_prob).then(a.0.cmp(b.0)));
    for (driver, prediction) in sorted {
        println!("  {:>6}: {:5.1}%", driver, prediction.win_prob * 100.0);
    }
}

/// Print a race leaderboard from the battle store.
pub fn run_leaderboard(
    race_id: String,
    limit: Option<usize>,
    db: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let db_path = db.unwrap_or_else(|| PathBuf::from(&config.storage.db_path));
    let limit = limit.unwrap_or(config.leaderboard.query_limit);

    let repo = BattleRepository::new(&db_path)?;
    let rows = repo.get_leaderboard(&race_id, limit)?;
    let total = repo.get_battle_count(&race_id)?;

    println!("Leaderboard: {} ({} submissions)", race_id, total);
    println!();
    if rows.is_empty() {
        println!("  (no submissions)");
        return Ok(());
    }
    for (i, row) in rows.iter().enumerate() {
        println!(
            "  {:2}. {:<20} {:>5}  {}",
            i + 1,
            row.user_id,
            row.score,
            row.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["gridplay-api", "serve", "-H", "127.0.0.1", "-p", "9000"])
            .unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_serve_defaults_to_config() {
        let cli = Cli::try_parse_from(["gridplay-api", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert!(port.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_model_and_no_model_conflict() {
        let result = Cli::try_parse_from([
            "gridplay-api",
            "predict",
            "grid.json",
            "--model",
            "m.json",
            "--no-model",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_leaderboard() {
        let cli =
            Cli::try_parse_from(["gridplay-api", "leaderboard", "2023-01-bahrain", "-l", "5"])
                .unwrap();
        match cli.command {
            Commands::Leaderboard { race_id, limit, db } => {
                assert_eq!(race_id, "2023-01-bahrain");
                assert_eq!(limit, Some(5));
                assert!(db.is_none());
            }
            _ => panic!("expected leaderboard"),
        }
    }
}
