//! gaptrack developer CLI
//!
//! ```bash
//! # replay the polling simulation with a fixed seed
//! gaptrack simulate --seed 7 --cycles 50
//!
//! # use a tracker config file and emit JSON lines
//! gaptrack simulate --config gaptrack.toml --json
//!
//! # render a stored gap set into SQL
//! gaptrack render gaps.json --select
//! ```

mod render;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gaptrack_core::{boundary::OrderingMode, config::TrackerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// gaptrack CLI
#[derive(Parser, Debug)]
#[command(
    name = "gaptrack",
    version,
    about = "Simulate and inspect unfetched-range tracking"
)]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "GAPTRACK_LOG_LEVEL")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the seeded polling simulation
    Simulate(simulate::SimulateArgs),

    /// Render a JSON gap set into its predicate
    Render(render::RenderArgs),
}

///
/// OrderingArg
///

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderingArg {
    Literal,
    Lexicographic,
}

impl From<OrderingArg> for OrderingMode {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Literal => Self::Literal,
            OrderingArg::Lexicographic => Self::Lexicographic,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    match args.command {
        Command::Simulate(cmd) => simulate::run(&cmd),
        Command::Render(cmd) => render::run(&cmd),
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_str()
    };

    let filter = EnvFilter::try_new(format!("gaptrack_core={level},gaptrack={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the tracker config from `path`, or defaults when absent.
fn load_config(path: Option<&PathBuf>) -> Result<TrackerConfig> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    TrackerConfig::from_toml_str(&source)
        .with_context(|| format!("parsing config {}", path.display()))
}
