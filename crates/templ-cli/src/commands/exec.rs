// crates/templ-cli/src/commands/exec.rs
//
// `templ exec`: apply ledger commands on behalf of a caller.
//
// A single command is given as JSON on the command line. A script is a
// JSON-lines file, one step per line:
//
//   {"as": "alice", "command": "join"}
//   {"advance": 129600}
//   {"as": "bob", "command": {"execute_proposal": {"id": 0}}}
//
// Blank lines and lines starting with `#` are skipped. Each step is atomic;
// the state file is written after the last successful step even when a
// later one fails.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use templ_core::address::Address;
use templ_core::clock::ManualClock;
use templ_core::events::TemplEvent;
use templ_ledger::{Command, InMemoryBank, Response, Templ};

use crate::config::resolve_address;
use crate::output::format_json;
use crate::state_file;
use crate::Context;

/// Arguments for `templ exec`.
#[derive(Debug, Args)]
pub struct ExecCmd {
    /// Caller: a `0x…` address or a label. Default caller for script steps.
    #[arg(long = "as")]
    caller: Option<String>,

    /// Command JSON, e.g. '"join"' or '{"vote": {"id": 0, "support": true}}'.
    #[arg(conflicts_with = "script")]
    command: Option<String>,

    /// JSON-lines script of steps.
    #[arg(long)]
    script: Option<PathBuf>,
}

/// One script line.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Step {
    #[serde(default, rename = "as")]
    caller: Option<String>,
    #[serde(default)]
    command: Option<Command>,
    /// Seconds to move the clock forward before the command runs.
    #[serde(default)]
    advance: u64,
}

/// What `exec` prints per applied command.
#[derive(Debug, Serialize)]
struct StepReport<'a> {
    step: usize,
    caller: Address,
    response: &'a Response,
    events: &'a [TemplEvent],
}

/// Run the exec command.
pub fn run(ctx: &Context, cmd: &ExecCmd) -> Result<(), Box<dyn std::error::Error>> {
    let steps = match (&cmd.command, &cmd.script) {
        (Some(json), None) => vec![Step {
            caller: None,
            command: Some(serde_json::from_str(json)?),
            advance: 0,
        }],
        (None, Some(path)) => parse_script(&fs::read_to_string(path)?)?,
        _ => return Err("give either a command or --script".into()),
    };
    let default_caller = cmd.caller.as_deref().map(resolve_address).transpose()?;

    let (clock, shared) = ctx.shared_clock();
    let mut templ = state_file::load(&ctx.state_path, shared)?;
    let result = apply_steps(&mut templ, &clock, default_caller, steps);
    state_file::save(&ctx.state_path, &templ)?;
    result
}

fn parse_script(contents: &str) -> Result<Vec<Step>, Box<dyn std::error::Error>> {
    let mut steps = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step = serde_json::from_str(line)
            .map_err(|e| format!("script line {}: {}", i + 1, e))?;
        steps.push(step);
    }
    Ok(steps)
}

fn apply_steps(
    templ: &mut Templ<InMemoryBank>,
    clock: &ManualClock,
    default_caller: Option<Address>,
    steps: Vec<Step>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (i, step) in steps.into_iter().enumerate() {
        if step.advance > 0 {
            clock.advance(step.advance);
            tracing::debug!(now = templ.now(), "clock advanced");
        }
        let Some(command) = step.command else {
            continue;
        };
        let caller = match step.caller.as_deref() {
            Some(input) => resolve_address(input)?,
            None => default_caller.ok_or_else(|| format!("step {}: no caller; pass --as", i + 1))?,
        };

        let response = templ
            .apply(caller, command)
            .map_err(|e| format!("step {} ({}): {}", i + 1, caller, e))?;
        let events = templ.drain_events();
        println!(
            "{}",
            format_json(&StepReport {
                step: i + 1,
                caller,
                response: &response,
                events: &events,
            })
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use templ_core::address::Asset;
    use templ_core::clock::Clock;
    use templ_ledger::TemplConfig;

    fn ledger(clock: &ManualClock) -> Templ<InMemoryBank> {
        let config = TemplConfig::default();
        let mut bank = InMemoryBank::new();
        bank.register_token(config.access_token);
        for label in ["alice", "bob"] {
            let who = Address::from_label(label);
            bank.mint(&Asset::Token(config.access_token), &who, 1_000)
                .unwrap();
            bank.approve(&config.access_token, &who, &config.account, 1_000)
                .unwrap();
        }
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        Templ::new(config, bank, shared).unwrap()
    }

    #[test]
    fn test_parse_script_skips_comments() {
        let steps = parse_script(
            "# seed\n{\"as\": \"alice\", \"command\": \"join\"}\n\n{\"advance\": 60}\n",
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].command, Some(Command::Join));
        assert_eq!(steps[1].advance, 60);
        assert!(parse_script("{\"bogus\": 1}").is_err());
    }

    #[test]
    fn test_apply_steps_advances_clock() {
        let clock = ManualClock::new(1_000);
        let mut templ = ledger(&clock);
        let steps = parse_script(
            "{\"as\": \"alice\", \"command\": \"join\"}\n\
             {\"as\": \"bob\", \"command\": \"join\", \"advance\": 30}\n",
        )
        .unwrap();
        apply_steps(&mut templ, &clock, None, steps).unwrap();
        assert_eq!(templ.member_count(), 2);
        let bob = templ.member(&Address::from_label("bob")).unwrap();
        assert_eq!(bob.joined_at, 1_030);
    }

    #[test]
    fn test_apply_steps_needs_a_caller() {
        let clock = ManualClock::new(0);
        let mut templ = ledger(&clock);
        let steps = parse_script("{\"command\": \"join\"}").unwrap();
        assert!(apply_steps(&mut templ, &clock, None, steps).is_err());
        assert_eq!(templ.member_count(), 0);
    }
}
