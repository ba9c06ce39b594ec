mod run;
mod stats;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};
use run::{run_simulation, RunArgs};
use stats::{run_stats, StatsArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Advance a pattern, preset or random field by a number of generations
    Run(RunArgs),
    /// Load a pattern and report its population and pending activity
    Stats(StatsArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CLIParser::parse();

    match args.action {
        Action::Run(args) => run_simulation(args),
        Action::Stats(args) => run_stats(args),
    }
}
