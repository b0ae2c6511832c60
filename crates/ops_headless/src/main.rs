//! Headless campaign runner.
//!
//! # Usage
//!
//! ```bash
//! # Run ten turns with the built-in catalog
//! cargo run -p ops_headless -- run --turns 10
//!
//! # Run a scenario with custom data
//! cargo run -p ops_headless -- run --scenario scenarios/red_dawn_sweep.ron --catalog data/catalog.ron
//!
//! # Validate data files
//! cargo run -p ops_headless -- validate --catalog data/catalog.ron --config data/config.ron
//! ```
//!
//! Output (stdout): one JSON turn summary per line
//! Logs (stderr): human-readable

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ops_core::config::GameConfig;
use ops_core::data::Catalog;
use ops_headless::{run, RunConfig, Scenario, ScenarioError};

#[derive(Parser)]
#[command(name = "ops_headless")]
#[command(about = "Headless campaign runner for CI and balance checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a campaign and print a summary per turn
    Run {
        /// Number of turns to advance
        #[arg(short, long, default_value = "10")]
        turns: u32,

        /// Random seed (overrides the scenario's seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Rules and starting settings (RON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Mission and lead catalog (RON)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Scripted player actions (RON)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Start from the debug roster
        #[arg(long)]
        debug_roster: bool,
    },

    /// Load and validate data files without running
    Validate {
        /// Mission and lead catalog (RON)
        #[arg(long)]
        catalog: PathBuf,

        /// Rules and starting settings (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for summaries
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let result = match cli.command {
        Commands::Run {
            turns,
            seed,
            config,
            catalog,
            scenario,
            debug_roster,
        } => cmd_run(turns, seed, config, catalog, scenario, debug_roster),
        Commands::Validate { catalog, config } => cmd_validate(&catalog, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run a campaign and print one JSON line per turn.
fn cmd_run(
    turns: u32,
    seed: Option<u64>,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    scenario: Option<PathBuf>,
    debug_roster: bool,
) -> Result<(), ScenarioError> {
    let config = config.map(GameConfig::load).transpose()?.unwrap_or_default();
    let catalog = catalog.map(Catalog::load).transpose()?.unwrap_or_default();
    let scenario = scenario.map(Scenario::load).transpose()?.unwrap_or_default();
    let seed = seed.or(scenario.seed).unwrap_or(0);

    let outcome = run(
        RunConfig {
            turns,
            seed,
            config,
            catalog,
            scenario,
            debug_roster,
        },
        |summary| match summary.to_json() {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(turn = summary.turn, "Failed to serialize summary: {e}"),
        },
    )?;

    let state = outcome.campaign.state();
    tracing::info!(
        turn = state.turn,
        money = state.money,
        intel = state.intel,
        panic = %state.panic.to_percent_string(2),
        "Campaign state"
    );
    Ok(())
}

/// Validate a catalog and, optionally, a config.
fn cmd_validate(catalog: &Path, config: Option<PathBuf>) -> Result<(), ScenarioError> {
    let loaded = Catalog::load(catalog)?;
    tracing::info!(
        path = %catalog.display(),
        missions = loaded.missions.len(),
        leads = loaded.leads.len(),
        "Catalog is valid"
    );
    if let Some(path) = config {
        GameConfig::load(&path)?;
        tracing::info!(path = %path.display(), "Config is valid");
    }
    Ok(())
}
