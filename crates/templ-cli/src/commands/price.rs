// crates/templ-cli/src/commands/price.rs
//
// `templ price`: evaluate the entry-price curve.
//
// Reads the curve from a deploy config when `--config` is given, otherwise
// from the ledger state. `--counter` counts admissions from the curve's
// anchor, so `--counter 0` is the base entry fee.

use std::path::PathBuf;

use clap::Args;
use tabled::Tabled;

use templ_core::units::Amount;
use templ_economics::pricing::PricingCurve;

use crate::config::CliConfig;
use crate::output::format_table;
use crate::state_file;
use crate::Context;

/// Arguments for `templ price`.
#[derive(Debug, Args)]
pub struct PriceCmd {
    /// Admissions since the anchor.
    #[arg(long, default_value_t = 0)]
    counter: u64,

    /// Also print every price up to this counter.
    #[arg(long)]
    through: Option<u64>,

    /// Take the curve from this deploy config instead of the state file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Tabled)]
struct PriceRow {
    #[tabled(rename = "Counter")]
    counter: u64,
    #[tabled(rename = "Price")]
    price: Amount,
}

/// Largest range `--through` prints.
const MAX_ROWS: u64 = 1_000;

/// Run the price command.
pub fn run(ctx: &Context, cmd: &PriceCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (curve, base) = match &cmd.config {
        Some(path) => {
            let config = CliConfig::load(path)?;
            config.ledger.pricing_curve.validate()?;
            (config.ledger.pricing_curve, config.ledger.base_entry_fee)
        }
        None => {
            let (_, clock) = ctx.shared_clock();
            let templ = state_file::load(&ctx.state_path, clock)?;
            let settings = &templ.state().settings;
            (settings.pricing_curve.clone(), settings.base_entry_fee)
        }
    };

    match cmd.through {
        Some(end) if end > cmd.counter => {
            let end = end.min(cmd.counter.saturating_add(MAX_ROWS));
            println!("{}", format_table(&price_rows(&curve, base, cmd.counter, end)));
        }
        _ => println!("{}", curve.price_at(base, cmd.counter)),
    }
    Ok(())
}

fn price_rows(curve: &PricingCurve, base: Amount, start: u64, end: u64) -> Vec<PriceRow> {
    (start..=end)
        .map(|counter| PriceRow {
            counter,
            price: curve.price_at(base, counter),
        })
        .collect()
}
