// crates/templ-cli/src/main.rs
//
// CLI entrypoint for the Templ ledger operator tools.
//
// The ledger lives in a JSON state file. `init` creates it from a TOML
// deploy config, `exec` applies commands to it, `show` reads it, and
// `price` evaluates pricing curves without touching it.

mod commands;
mod config;
mod output;
mod state_file;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use commands::exec::ExecCmd;
use commands::init::InitCmd;
use commands::price::PriceCmd;
use commands::show::ShowCmd;
use templ_core::clock::{Clock, ManualClock, SystemClock};
use templ_core::units::Timestamp;

/// Templ CLI: run a token-gated membership ledger from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "templ",
    version = "0.1.0",
    about = "Templ ledger CLI: token-gated membership, pro-rata rewards, and on-ledger governance"
)]
struct Cli {
    /// Ledger state file. Defaults to ~/.templ/state.json.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `templ_ledger=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Pin the clock to this unix timestamp instead of the wall clock.
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a ledger from a deploy config and write its state file.
    Init(InitCmd),

    /// Apply commands to the ledger on behalf of a caller.
    Exec(ExecCmd),

    /// Display ledger state.
    #[command(subcommand)]
    Show(ShowCmd),

    /// Evaluate the entry-price curve.
    Price(PriceCmd),
}

/// Shared settings resolved from the global flags.
pub struct Context {
    pub state_path: PathBuf,
    pub now: Option<Timestamp>,
}

impl Context {
    /// A manual clock starting at `--now` or at the current wall-clock time.
    /// Scripts advance it between commands.
    pub fn clock(&self) -> ManualClock {
        ManualClock::new(self.now.unwrap_or_else(|| SystemClock.now()))
    }

    pub fn shared_clock(&self) -> (ManualClock, Arc<dyn Clock>) {
        let clock = self.clock();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        (clock, shared)
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let state_path = match cli.state {
        Some(path) => path,
        None => state_file::default_path()?,
    };
    let ctx = Context {
        state_path,
        now: cli.now,
    };

    match &cli.command {
        Commands::Init(cmd) => commands::init::run(&ctx, cmd)?,
        Commands::Exec(cmd) => commands::exec::run(&ctx, cmd)?,
        Commands::Show(cmd) => commands::show::run(&ctx, cmd)?,
        Commands::Price(cmd) => commands::price::run(&ctx, cmd)?,
    }

    Ok(())
}
