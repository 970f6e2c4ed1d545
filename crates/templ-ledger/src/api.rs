// crates/templ-ledger/src/api.rs
//
// Serializable command and query surface.
//
// Relays, chat provisioning and bots talk to a Templ only through these
// types: a `Command` mutates in one atomic step, a `Query` reads.
// Commands and queries are externally tagged (`"join"`,
// `{"vote": {"id": 0, "support": true}}`); responses carry a `result` tag.

use serde::{Deserialize, Serialize};

use templ_core::address::{Address, Asset};
use templ_core::error::TemplResult;
use templ_core::traits::TokenBank;
use templ_core::units::{Amount, Timestamp};
use templ_economics::checkpoint::Checkpoint;
use templ_governance::action::Action;
use templ_governance::engine::GovernanceParams;
use templ_governance::proposal::{Proposal, ProposalStatus};

use crate::membership::JoinReceipt;
use crate::state::Settings;
use crate::templ::Templ;
use crate::treasury::TreasuryInfo;

/// Largest page a listing query returns.
pub const MAX_PAGE: usize = 100;

fn default_page() -> usize {
    20
}

/// A mutating entry point, invoked by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Join,
    JoinFor {
        recipient: Address,
    },
    JoinWithReferral {
        referrer: Address,
    },
    JoinForWithReferral {
        recipient: Address,
        referrer: Address,
    },
    ClaimMemberPool,
    ClaimExternalReward {
        asset: Asset,
    },
    CreateProposal {
        action: Action,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        /// Seconds, 0 for the default.
        #[serde(default)]
        voting_period: u64,
    },
    Vote {
        id: u64,
        support: bool,
    },
    ExecuteProposal {
        id: u64,
    },
    /// Any action, run directly by the operator under dictator mode.
    Direct {
        action: Action,
    },
    WithdrawTreasury {
        asset: Asset,
        recipient: Address,
        amount: Amount,
        #[serde(default)]
        reason: String,
    },
    WithdrawAllTreasury {
        asset: Asset,
        recipient: Address,
        #[serde(default)]
        reason: String,
    },
    DisbandTreasury {
        asset: Asset,
    },
    BootstrapCouncilMember {
        member: Address,
    },
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Joined(JoinReceipt),
    Claimed { amount: Amount },
    ProposalCreated { id: u64 },
    Done,
}

/// A read-only question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Config,
    Treasury,
    CurrentPrice,
    MemberCount,
    ClaimablePool {
        member: Address,
    },
    ClaimableExternal {
        member: Address,
        asset: Asset,
    },
    Member {
        member: Address,
    },
    Proposal {
        id: u64,
    },
    Proposals {
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_page")]
        limit: usize,
    },
    ActiveProposal {
        proposer: Address,
    },
    Council,
    /// Pool checkpoints, or an external asset's when `asset` is set.
    Checkpoints {
        #[serde(default)]
        asset: Option<Asset>,
    },
    ExternalAssets {
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_page")]
        limit: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    pub settings: Settings,
    pub governance: GovernanceParams,
    pub custom_handlers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub address: Address,
    pub join_sequence: u64,
    pub joined_at: Timestamp,
    pub payer: Address,
    pub claimable_pool: Amount,
    pub council: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouncilView {
    pub council_mode: bool,
    pub bootstrap_consumed: bool,
    pub members: Vec<Address>,
}

/// Answer to a `Query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QueryResponse {
    Config(ConfigView),
    Treasury(TreasuryInfo),
    Amount { amount: Amount },
    Count { count: u64 },
    Member { member: Option<MemberView> },
    Proposal(ProposalView),
    Proposals {
        proposals: Vec<ProposalView>,
        has_more: bool,
    },
    ActiveProposal { id: Option<u64> },
    Council(CouncilView),
    Checkpoints { checkpoints: Vec<Checkpoint> },
    Assets { assets: Vec<Asset>, has_more: bool },
}

impl<B: TokenBank> Templ<B> {
    /// Run `command` on behalf of `caller`.
    pub fn apply(&mut self, caller: Address, command: Command) -> TemplResult<Response> {
        let response = match command {
            Command::Join => Response::Joined(self.join(caller)?),
            Command::JoinFor { recipient } => Response::Joined(self.join_for(caller, recipient)?),
            Command::JoinWithReferral { referrer } => {
                Response::Joined(self.join_with_referral(caller, referrer)?)
            }
            Command::JoinForWithReferral {
                recipient,
                referrer,
            } => Response::Joined(self.join_for_with_referral(caller, recipient, referrer)?),
            Command::ClaimMemberPool => Response::Claimed {
                amount: self.claim_member_pool(caller)?,
            },
            Command::ClaimExternalReward { asset } => Response::Claimed {
                amount: self.claim_external_reward(caller, asset)?,
            },
            Command::CreateProposal {
                action,
                title,
                description,
                voting_period,
            } => Response::ProposalCreated {
                id: self.create_proposal(caller, action, title, description, voting_period)?,
            },
            Command::Vote { id, support } => {
                self.vote(caller, id, support)?;
                Response::Done
            }
            Command::ExecuteProposal { id } => {
                self.execute_proposal(caller, id)?;
                Response::Done
            }
            Command::Direct { action } => {
                self.execute_direct(caller, action)?;
                Response::Done
            }
            Command::WithdrawTreasury {
                asset,
                recipient,
                amount,
                reason,
            } => {
                self.withdraw_treasury(caller, asset, recipient, amount, reason)?;
                Response::Done
            }
            Command::WithdrawAllTreasury {
                asset,
                recipient,
                reason,
            } => {
                self.withdraw_all_treasury(caller, asset, recipient, reason)?;
                Response::Done
            }
            Command::DisbandTreasury { asset } => {
                self.disband_treasury(caller, asset)?;
                Response::Done
            }
            Command::BootstrapCouncilMember { member } => {
                self.bootstrap_council_member(caller, member)?;
                Response::Done
            }
        };
        Ok(response)
    }

    /// Answer `query`.
    pub fn query(&self, query: Query) -> TemplResult<QueryResponse> {
        let response = match query {
            Query::Config => QueryResponse::Config(ConfigView {
                settings: self.state.settings.clone(),
                governance: *self.state.governance.params(),
                custom_handlers: self
                    .handlers
                    .names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
            Query::Treasury => QueryResponse::Treasury(self.treasury_info()),
            Query::CurrentPrice => QueryResponse::Amount {
                amount: self.current_price(),
            },
            Query::MemberCount => QueryResponse::Count {
                count: self.member_count(),
            },
            Query::ClaimablePool { member } => QueryResponse::Amount {
                amount: self.claimable_pool(&member),
            },
            Query::ClaimableExternal { member, asset } => QueryResponse::Amount {
                amount: self.claimable_external(&member, &asset),
            },
            Query::Member { member } => QueryResponse::Member {
                member: self.member_view(&member),
            },
            Query::Proposal { id } => QueryResponse::Proposal(self.proposal_view(self.proposal(id)?)),
            Query::Proposals { offset, limit } => {
                let (page, has_more) = self
                    .state
                    .governance
                    .proposals_page(offset, limit.min(MAX_PAGE));
                QueryResponse::Proposals {
                    proposals: page.into_iter().map(|p| self.proposal_view(p)).collect(),
                    has_more,
                }
            }
            Query::ActiveProposal { proposer } => QueryResponse::ActiveProposal {
                id: self.active_proposal_of(&proposer),
            },
            Query::Council => QueryResponse::Council(CouncilView {
                council_mode: self.state.settings.council_mode,
                bootstrap_consumed: self.state.council.bootstrap_consumed(),
                members: self.state.council.members().copied().collect(),
            }),
            Query::Checkpoints { asset } => {
                let checkpoints = match asset {
                    None => self.state.pool.checkpoints().entries().to_vec(),
                    Some(asset) => self
                        .state
                        .external
                        .state(&asset)
                        .map(|s| s.checkpoints.entries().to_vec())
                        .unwrap_or_default(),
                };
                QueryResponse::Checkpoints { checkpoints }
            }
            Query::ExternalAssets { offset, limit } => {
                let (assets, has_more) = self.external_reward_assets(offset, limit.min(MAX_PAGE));
                QueryResponse::Assets { assets, has_more }
            }
        };
        Ok(response)
    }

    pub fn member_view(&self, address: &Address) -> Option<MemberView> {
        self.state.members.get(address).map(|m| MemberView {
            address: *address,
            join_sequence: m.join_sequence,
            joined_at: m.joined_at,
            payer: m.payer,
            claimable_pool: self.state.pool.claimable(m.pool_debt),
            council: self.state.council.contains(address),
        })
    }

    fn proposal_view(&self, proposal: &Proposal) -> ProposalView {
        ProposalView {
            proposal: proposal.clone(),
            status: proposal.status(self.now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_forms() {
        let join: Command = serde_json::from_str(r#""join""#).unwrap();
        assert_eq!(join, Command::Join);

        let vote: Command = serde_json::from_str(r#"{"vote": {"id": 3, "support": false}}"#).unwrap();
        assert_eq!(vote, Command::Vote { id: 3, support: false });

        let create: Command = serde_json::from_str(
            r#"{"create_proposal": {
                "action": {"set_join_paused": {"paused": true}},
                "title": "pause"
            }}"#,
        )
        .unwrap();
        assert_eq!(
            create,
            Command::CreateProposal {
                action: Action::SetJoinPaused { paused: true },
                title: "pause".into(),
                description: String::new(),
                voting_period: 0,
            }
        );
    }

    #[test]
    fn test_query_defaults_page() {
        let q: Query = serde_json::from_str(r#"{"proposals": {}}"#).unwrap();
        assert_eq!(q, Query::Proposals { offset: 0, limit: 20 });
    }

    #[test]
    fn test_response_is_tagged() {
        let json = serde_json::to_value(Response::Claimed { amount: 30 }).unwrap();
        assert_eq!(json["result"], "claimed");
        assert_eq!(json["amount"], 30);
    }
}
