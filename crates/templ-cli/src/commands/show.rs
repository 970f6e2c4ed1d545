// crates/templ-cli/src/commands/show.rs
//
// `templ show {config, treasury, proposals, proposal, member, council}`:
// read-only views of the ledger state.

use clap::{Args, Subcommand};

use templ_ledger::api::MAX_PAGE;
use templ_ledger::{InMemoryBank, Query, QueryResponse, Templ};

use crate::config::resolve_address;
use crate::output::{
    format_json, format_table, status_label, timestamp, FieldRow, OutputFormat, ProposalRow,
};
use crate::state_file;
use crate::Context;

/// Output selection shared by every view.
#[derive(Debug, Clone, Args)]
pub struct FormatArg {
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

/// Ledger views.
#[derive(Debug, Subcommand)]
pub enum ShowCmd {
    /// Current settings and governance parameters.
    Config(FormatArg),
    /// Treasury and member-pool balances.
    Treasury(FormatArg),
    /// Proposals in creation order.
    Proposals {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[command(flatten)]
        format: FormatArg,
    },
    /// One proposal with its ballots.
    Proposal {
        id: u64,
        #[command(flatten)]
        format: FormatArg,
    },
    /// A member record (address or label).
    Member {
        address: String,
        #[command(flatten)]
        format: FormatArg,
    },
    /// Council mode and seats.
    Council(FormatArg),
}

/// Run the show subcommand.
pub fn run(ctx: &Context, cmd: &ShowCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (_, clock) = ctx.shared_clock();
    let templ = state_file::load(&ctx.state_path, clock)?;
    let (query, format) = match cmd {
        ShowCmd::Config(f) => (Query::Config, f.format),
        ShowCmd::Treasury(f) => (Query::Treasury, f.format),
        ShowCmd::Proposals {
            offset,
            limit,
            format,
        } => (
            Query::Proposals {
                offset: *offset,
                limit: (*limit).min(MAX_PAGE),
            },
            format.format,
        ),
        ShowCmd::Proposal { id, format } => (Query::Proposal { id: *id }, format.format),
        ShowCmd::Member { address, format } => (
            Query::Member {
                member: resolve_address(address)?,
            },
            format.format,
        ),
        ShowCmd::Council(f) => (Query::Council, f.format),
    };

    let response = templ.query(query)?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&response)),
        OutputFormat::Table => println!("{}", render_table(&templ, &response)),
    }
    Ok(())
}

fn render_table(templ: &Templ<InMemoryBank>, response: &QueryResponse) -> String {
    match response {
        QueryResponse::Config(view) => {
            let s = &view.settings;
            let g = &view.governance;
            let split = &s.fee_split;
            let rows = vec![
                FieldRow::new("Operator", s.operator),
                FieldRow::new("Access token", s.access_token),
                FieldRow::new("Entry price", templ.current_price()),
                FieldRow::new("Base entry fee", s.base_entry_fee),
                FieldRow::new(
                    "Split (burn/treasury/pool/protocol)",
                    format!(
                        "{}/{}/{}/{}",
                        split.burn_bps, split.treasury_bps, split.member_pool_bps, split.protocol_bps
                    ),
                ),
                FieldRow::new("Max members", s.max_members),
                FieldRow::new("Join paused", s.join_paused),
                FieldRow::new("Dictator mode", s.dictator_mode),
                FieldRow::new("Council mode", s.council_mode),
                FieldRow::new("Burn address", s.burn_address),
                FieldRow::new("Home link", &s.home_link),
                FieldRow::new("Quorum bps", g.quorum_bps),
                FieldRow::new("Yes threshold bps", g.yes_threshold_bps),
                FieldRow::new("Instant quorum bps", g.instant_quorum_bps),
                FieldRow::new("Post-quorum delay (s)", g.post_quorum_delay),
                FieldRow::new("Proposal fee bps", g.proposal_fee_bps),
                FieldRow::new("Custom handlers", view.custom_handlers.join(", ")),
            ];
            format_table(&rows)
        }
        QueryResponse::Treasury(info) => {
            let rows = vec![
                FieldRow::new("Treasury", info.treasury_balance),
                FieldRow::new("Member pool", info.member_pool_balance),
                FieldRow::new("Pool remainder", info.pool_remainder),
                FieldRow::new("Members", info.member_count),
                FieldRow::new("Admissions", info.purchase_count),
                FieldRow::new("Current price", info.current_price),
                FieldRow::new("Burned", info.totals.burned),
                FieldRow::new("Protocol", info.totals.protocol),
                FieldRow::new("Referrals", info.totals.referrals),
                FieldRow::new("Proposal fees", info.totals.proposal_fees),
            ];
            format_table(&rows)
        }
        QueryResponse::Proposals {
            proposals,
            has_more,
        } => {
            let rows: Vec<ProposalRow> = proposals.iter().map(ProposalRow::from).collect();
            let mut out = format_table(&rows);
            if *has_more {
                out.push_str("\n(more proposals; raise --offset)");
            }
            out
        }
        QueryResponse::Proposal(view) => {
            let p = &view.proposal;
            let mut rows = vec![
                FieldRow::new("ID", p.id),
                FieldRow::new("Proposer", p.proposer),
                FieldRow::new("Action", p.action.kind()),
                FieldRow::new("Title", &p.title),
                FieldRow::new("Created", timestamp(p.created_at)),
                FieldRow::new("Deadline", timestamp(p.deadline)),
                FieldRow::new("Yes / No", format!("{} / {}", p.yes_votes, p.no_votes)),
                FieldRow::new("Eligible voters", p.rules.eligible_voters),
                FieldRow::new("Status", status_label(&view.status)),
            ];
            if let Some(at) = p.quorum_reached_at {
                rows.push(FieldRow::new("Quorum reached", timestamp(at)));
            }
            for (voter, support) in &p.ballots {
                rows.push(FieldRow::new(
                    "Ballot",
                    format!("{} {}", voter, if *support { "yes" } else { "no" }),
                ));
            }
            format_table(&rows)
        }
        QueryResponse::Member { member: Some(m) } => {
            let rows = vec![
                FieldRow::new("Address", m.address),
                FieldRow::new("Join sequence", m.join_sequence),
                FieldRow::new("Joined", timestamp(m.joined_at)),
                FieldRow::new("Paid by", m.payer),
                FieldRow::new("Claimable pool", m.claimable_pool),
                FieldRow::new("Council", m.council),
            ];
            format_table(&rows)
        }
        QueryResponse::Member { member: None } => "Not a member.".to_string(),
        QueryResponse::Council(view) => {
            let mut rows = vec![
                FieldRow::new("Council mode", view.council_mode),
                FieldRow::new("Bootstrap used", view.bootstrap_consumed),
            ];
            rows.extend(view.members.iter().map(|m| FieldRow::new("Seat", m)));
            format_table(&rows)
        }
        other => format_json(other),
    }
}
