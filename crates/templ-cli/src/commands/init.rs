// crates/templ-cli/src/commands/init.rs
//
// `templ init`: build a ledger from a deploy config and write its state.

use std::path::PathBuf;

use clap::Args;
use templ_ledger::Templ;

use crate::config::CliConfig;
use crate::state_file::{self, StateFileError};
use crate::Context;

/// Arguments for `templ init`.
#[derive(Debug, Args)]
pub struct InitCmd {
    /// Deploy config (TOML). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overwrite an existing state file.
    #[arg(long)]
    force: bool,
}

/// Run the init command.
pub fn run(ctx: &Context, cmd: &InitCmd) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.state_path.exists() && !cmd.force {
        return Err(StateFileError::Exists(ctx.state_path.clone()).into());
    }

    let config = match &cmd.config {
        Some(path) => {
            let config = CliConfig::load(path)?;
            tracing::info!("Loaded deploy config from {}", path.display());
            config
        }
        None => CliConfig::default(),
    };
    let bank = config.build_bank()?;
    let (_, clock) = ctx.shared_clock();
    let templ = Templ::new(config.ledger, bank, clock)?;
    state_file::save(&ctx.state_path, &templ)?;

    let settings = &templ.state().settings;
    println!("Templ initialized.");
    println!("  State:        {}", ctx.state_path.display());
    println!("  Operator:     {}", settings.operator);
    println!("  Account:      {}", settings.account);
    println!("  Access token: {}", settings.access_token);
    println!("  Entry price:  {}", templ.current_price());
    println!("  Genesis:      {} mint(s)", config.genesis.len());

    Ok(())
}
