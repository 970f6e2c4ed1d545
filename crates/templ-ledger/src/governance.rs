// crates/templ-ledger/src/governance.rs
//
// Proposal entry points and action dispatch.
//
// Who may vote and who may act alone are two orthogonal flags:
//   eligible   = council_mode ? council.contains(caller) : is_member(caller)
//   authorized = dictator_mode ? caller == operator : governance_executing()
// Every internal handler checks the dispatch marker before touching state,
// and every handler finishes its checks before its first mutation.

use tracing::{info, warn};

use templ_core::address::Address;
use templ_core::error::{AuthorizationError, StateError, TemplResult, ValidationError};
use templ_core::events::TemplEvent;
use templ_core::traits::TokenBank;
use templ_core::units::apply_bps;
use templ_governance::action::Action;
use templ_governance::engine::{ProposalDraft, VoterStanding};
use templ_governance::handlers::Resolution;
use templ_governance::proposal::{Proposal, ProposalStatus};

use crate::templ::{DispatchOrigin, Templ};

impl<B: TokenBank> Templ<B> {
    /// Open a proposal. The proposer pays the proposal fee and casts a
    /// yes ballot.
    ///
    /// # Arguments
    /// * `voting_period` - seconds, 0 for the configured default.
    ///
    /// # Errors
    /// `DictatorshipEnabled` for anything but a dictatorship toggle while
    /// dictator mode is on, `NotCouncil` / `NotMember` for ineligible
    /// proposers, payload validation errors, `ActiveProposalExists`, and
    /// payment errors for the fee.
    pub fn create_proposal(
        &mut self,
        caller: Address,
        action: Action,
        title: String,
        description: String,
        voting_period: u64,
    ) -> TemplResult<u64> {
        self.atomic("create_proposal", |t| {
            let settings = &t.state.settings;
            if settings.dictator_mode && !action.is_dictatorship_toggle() {
                return Err(StateError::DictatorshipEnabled.into());
            }
            let council_mode = settings.council_mode;
            if council_mode {
                if !t.state.council.contains(&caller) {
                    return Err(AuthorizationError::NotCouncil.into());
                }
            } else {
                t.require_member(&caller)?;
            }
            let resolution = action.resolve(&t.handlers)?;
            t.precheck(&resolution)?;

            let now = t.now();
            t.state
                .governance
                .check_open(&caller, &title, &description, voting_period, now)?;
            let fee = apply_bps(
                t.state.current_price(),
                t.state.governance.params().proposal_fee_bps,
            )
            .ok_or(StateError::ArithmeticOverflow)?;
            if fee > 0 {
                t.collect_payment(&caller, fee)?;
            }

            let eligible_voters = if council_mode {
                t.state.council.len() as u64
            } else {
                t.state.member_count()
            };
            let kind = action.kind();
            let draft = ProposalDraft {
                proposer: caller,
                action,
                title: title.clone(),
                description,
                voting_period,
                eligible_voters,
                join_cutoff: t.state.purchase_count,
                council_mode,
                fee_paid: fee,
                proposer_votes: true,
            };
            let opened = t.state.governance.open(draft, now)?;

            t.state.treasury.deposit(fee);
            let totals = &mut t.state.totals;
            totals.proposal_fees = totals.proposal_fees.saturating_add(fee);

            t.emit(TemplEvent::ProposalCreated {
                id: opened.id,
                proposer: caller,
                action: kind.to_string(),
                title,
                deadline: opened.deadline,
                fee_paid: fee,
            });
            t.emit(TemplEvent::VoteCast {
                id: opened.id,
                voter: caller,
                support: true,
                timestamp: now,
            });
            if let Some(at) = opened.quorum_reached {
                let deadline = t
                    .state
                    .governance
                    .proposal(opened.id)
                    .map_or(opened.deadline, |p| p.deadline);
                t.emit(TemplEvent::QuorumReached {
                    id: opened.id,
                    at,
                    deadline,
                });
            }
            info!(id = opened.id, proposer = %caller, action = kind, "proposal created");
            Ok(opened.id)
        })
    }

    /// Cast a ballot on proposal `id`.
    ///
    /// # Errors
    /// `InvalidProposal`, `NotCouncil` / `NotMember`, then the engine's
    /// ballot errors.
    pub fn vote(&mut self, caller: Address, id: u64, support: bool) -> TemplResult<()> {
        self.atomic("vote", |t| {
            t.state.governance.get(id)?;
            let standing = if t.state.settings.council_mode {
                if !t.state.council.contains(&caller) {
                    return Err(AuthorizationError::NotCouncil.into());
                }
                VoterStanding::Council
            } else {
                VoterStanding::Member {
                    join_sequence: t.require_member(&caller)?.join_sequence,
                }
            };
            let now = t.now();
            let outcome = t
                .state
                .governance
                .vote(id, caller, support, standing, now)?;
            t.emit(TemplEvent::VoteCast {
                id,
                voter: caller,
                support,
                timestamp: now,
            });
            if let Some((at, deadline)) = outcome.quorum_reached {
                t.emit(TemplEvent::QuorumReached { id, at, deadline });
                info!(id, at, deadline, "quorum reached");
            }
            Ok(())
        })
    }

    /// Execute proposal `id`. Anyone may call.
    ///
    /// A proposal that is executable but fails its yes threshold is recorded
    /// as executed and not passed, and `ProposalNotPassed` is returned.
    pub fn execute_proposal(&mut self, caller: Address, id: u64) -> TemplResult<()> {
        self.atomic("execute_proposal", |t| {
            let proposal = t.state.governance.get(id)?;
            if proposal.executed {
                return Err(StateError::AlreadyExecuted.into());
            }
            if t.state.settings.dictator_mode && !proposal.action.is_dictatorship_toggle() {
                return Err(StateError::DictatorshipEnabled.into());
            }
            let proposer = proposal.proposer;
            let now = t.now();
            let action = match t.state.governance.prepare_execution(id, now) {
                Ok(action) => action,
                Err(e) => {
                    warn!(id, error = %e, "proposal execution rejected");
                    return Err(e.into());
                }
            };
            let kind = action.kind();
            let resolution = action.resolve(&t.handlers)?;
            t.with_dispatch(DispatchOrigin::Proposal { id, proposer }, |t| {
                t.dispatch(resolution)
            })?;
            t.state.governance.finalize_passed(id)?;
            t.emit(TemplEvent::ProposalExecuted { id, passed: true });
            info!(id, action = kind, executor = %caller, "proposal executed");
            Ok(())
        })
    }

    /// Run `action` without a proposal.
    ///
    /// Under dictator mode only the operator may do this. Otherwise these
    /// entry points are reachable only from inside proposal execution, so
    /// any outside call fails with `NotGovernance`.
    pub fn execute_direct(&mut self, caller: Address, action: Action) -> TemplResult<()> {
        self.atomic("execute_direct", |t| {
            if t.state.settings.dictator_mode {
                if caller != t.state.settings.operator {
                    return Err(AuthorizationError::OperatorOnly.into());
                }
            } else if !t.governance_executing() {
                return Err(AuthorizationError::NotGovernance.into());
            }
            let kind = action.kind();
            let resolution = action.resolve(&t.handlers)?;
            t.with_dispatch(DispatchOrigin::Operator(caller), |t| t.dispatch(resolution))?;
            info!(operator = %caller, action = kind, "operator action executed");
            Ok(())
        })
    }

    /// Seed the council once. Operator only; the seat must go to a member.
    pub fn bootstrap_council_member(&mut self, caller: Address, member: Address) -> TemplResult<()> {
        self.atomic("bootstrap_council_member", |t| {
            if caller != t.state.settings.operator {
                return Err(AuthorizationError::OperatorOnly.into());
            }
            member.require_recipient()?;
            t.state.council.check_bootstrap(&member)?;
            t.require_member(&member)?;
            t.state.council.bootstrap(member)?;
            t.emit(TemplEvent::CouncilMemberAdded {
                member,
                added_by: caller,
            });
            info!(%member, "council bootstrapped");
            Ok(())
        })
    }

    pub fn proposal(&self, id: u64) -> TemplResult<&Proposal> {
        Ok(self.state.governance.get(id)?)
    }

    pub fn proposal_status(&self, id: u64) -> TemplResult<ProposalStatus> {
        let now = self.now();
        Ok(self.state.governance.get(id)?.status(now))
    }

    /// The proposer's outstanding proposal, if any.
    pub fn active_proposal_of(&self, proposer: &Address) -> Option<u64> {
        self.state
            .governance
            .active_proposal_of(proposer, self.now())
    }

    /// State-dependent checks run when a proposal is created, and again by
    /// the handler at execution.
    fn precheck(&self, resolution: &Resolution) -> TemplResult<()> {
        let Resolution::Action(action) = resolution else {
            return Ok(());
        };
        match action {
            Action::AddCouncilMember { member } => {
                self.require_member(member)?;
                self.state.council.check_add(member)?;
            }
            Action::RemoveCouncilMember { member } => {
                self.state.council.check_remove(member)?;
            }
            Action::SetMaxMembers { limit } => self.check_member_limit(*limit)?,
            Action::SetCouncilMode { enabled: true } if self.state.council.is_empty() => {
                return Err(StateError::CouncilMemberMinimum.into());
            }
            _ => {}
        }
        Ok(())
    }

    fn check_member_limit(&self, limit: u64) -> Result<(), ValidationError> {
        let members = self.state.member_count();
        if limit != 0 && limit < members {
            return Err(ValidationError::MemberLimitTooLow { limit, members });
        }
        Ok(())
    }

    fn dispatch(&mut self, resolution: Resolution) -> TemplResult<()> {
        let origin = self.require_dispatch()?;
        match resolution {
            Resolution::Action(action) => self.handle_action(action),
            Resolution::Notice { message } => {
                self.emit(TemplEvent::Notice {
                    proposal_id: origin.proposal_id(),
                    message,
                });
                Ok(())
            }
        }
    }

    /// Apply one built-in action.
    pub(crate) fn handle_action(&mut self, action: Action) -> TemplResult<()> {
        let origin = self.require_dispatch()?;
        action.validate()?;
        let purchase_count = self.state.purchase_count;
        match action {
            Action::SetJoinPaused { paused } => {
                self.state.settings.join_paused = paused;
                self.emit(TemplEvent::JoinPauseUpdated { paused });
            }
            Action::ChangeOperator { new_operator } => {
                let old = std::mem::replace(&mut self.state.settings.operator, new_operator);
                self.emit(TemplEvent::OperatorChanged {
                    old,
                    new: new_operator,
                });
            }
            Action::SetMaxMembers { limit } => {
                self.check_member_limit(limit)?;
                self.state.settings.max_members = limit;
                self.emit(TemplEvent::MaxMembersUpdated { limit });
            }
            Action::WithdrawTreasury {
                asset,
                recipient,
                amount,
                reason,
            } => self.handle_withdraw(asset, recipient, Some(amount), reason)?,
            Action::WithdrawAllTreasury {
                asset,
                recipient,
                reason,
            } => self.handle_withdraw(asset, recipient, None, reason)?,
            Action::UpdateConfig {
                entry_fee,
                fee_split,
            } => {
                if let Some(fee) = entry_fee {
                    self.state.settings.base_entry_fee = fee;
                    self.state.settings.price_anchor = purchase_count;
                    self.emit(TemplEvent::EntryFeeUpdated { entry_fee: fee });
                }
                if let Some(split) = fee_split {
                    self.state.settings.fee_split = split;
                    self.emit(TemplEvent::FeeSplitUpdated {
                        burn_bps: split.burn_bps,
                        treasury_bps: split.treasury_bps,
                        member_pool_bps: split.member_pool_bps,
                        protocol_bps: split.protocol_bps,
                    });
                }
            }
            Action::SetHomeLink { link } => {
                self.state.settings.home_link = link.clone();
                self.emit(TemplEvent::HomeLinkUpdated { link });
            }
            Action::SetPricingCurve {
                curve,
                base_entry_fee,
            } => {
                let base = base_entry_fee.unwrap_or_else(|| self.state.current_price());
                let settings = &mut self.state.settings;
                settings.pricing_curve = curve;
                settings.base_entry_fee = base;
                settings.price_anchor = purchase_count;
                self.emit(TemplEvent::PricingCurveUpdated {
                    base_entry_fee: base,
                });
            }
            Action::DisbandTreasury { asset } => self.handle_disband(asset)?,
            Action::AddCouncilMember { member } => self.handle_council_add(member)?,
            Action::RemoveCouncilMember { member } => self.handle_council_remove(member)?,
            Action::SetCouncilMode { enabled } => {
                if enabled && self.state.council.is_empty() {
                    return Err(StateError::CouncilMemberMinimum.into());
                }
                self.state.settings.council_mode = enabled;
                self.emit(TemplEvent::CouncilModeUpdated { enabled });
            }
            Action::SetDictatorship { enabled } => {
                self.state.settings.dictator_mode = enabled;
                self.emit(TemplEvent::DictatorshipUpdated { enabled });
            }
            Action::SetBurnAddress { address } => {
                self.state.settings.burn_address = address;
                self.emit(TemplEvent::BurnAddressUpdated { address });
            }
            Action::SetQuorumBps { bps } => {
                self.state.governance.params_mut().quorum_bps = bps;
                self.param_updated("quorum_bps", bps.into());
            }
            Action::SetYesThresholdBps { bps } => {
                self.state.governance.params_mut().yes_threshold_bps = bps;
                self.param_updated("yes_threshold_bps", bps.into());
            }
            Action::SetInstantQuorumBps { bps } => {
                self.state.governance.params_mut().instant_quorum_bps = bps;
                self.param_updated("instant_quorum_bps", bps.into());
            }
            Action::SetPostQuorumDelay { seconds } => {
                self.state.governance.params_mut().post_quorum_delay = seconds;
                self.param_updated("post_quorum_delay", seconds);
            }
            Action::SetProposalFeeBps { bps } => {
                self.state.governance.params_mut().proposal_fee_bps = bps;
                self.param_updated("proposal_fee_bps", bps.into());
            }
            Action::SetReferralShareBps { bps } => {
                self.state.settings.referral_share_bps = bps;
                self.param_updated("referral_share_bps", bps.into());
            }
            Action::Custom { handler, .. } => {
                return Err(ValidationError::InvalidCallData(format!(
                    "custom handler {handler} did not resolve to a built-in action"
                ))
                .into());
            }
        }
        info!(actor = %origin.actor(), proposal = ?origin.proposal_id(), "action applied");
        Ok(())
    }

    fn param_updated(&mut self, name: &str, value: u64) {
        self.emit(TemplEvent::GovernanceParamUpdated {
            name: name.to_string(),
            value,
        });
    }

    fn handle_council_add(&mut self, member: Address) -> TemplResult<()> {
        let origin = self.require_dispatch()?;
        self.require_member(&member)?;
        self.state.council.add(member)?;
        self.emit(TemplEvent::CouncilMemberAdded {
            member,
            added_by: origin.actor(),
        });
        Ok(())
    }

    fn handle_council_remove(&mut self, member: Address) -> TemplResult<()> {
        let origin = self.require_dispatch()?;
        // In council mode only a seat holder may unseat another, whether
        // acting through a proposal or as the operator.
        if self.state.settings.council_mode && !self.state.council.contains(&origin.actor()) {
            return Err(AuthorizationError::NotCouncil.into());
        }
        self.state.council.remove(&member)?;
        self.emit(TemplEvent::CouncilMemberRemoved {
            member,
            removed_by: origin.actor(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use templ_core::address::Asset;
    use templ_core::clock::ManualClock;
    use templ_core::error::TemplError;

    use crate::bank::InMemoryBank;
    use crate::config::TemplConfig;

    use super::*;

    fn templ() -> Templ<InMemoryBank> {
        let config = TemplConfig::default();
        let mut bank = InMemoryBank::new();
        bank.register_token(config.access_token);
        Templ::new(config, bank, Arc::new(ManualClock::new(1_000))).unwrap()
    }

    #[test]
    fn test_handlers_require_dispatch_marker() {
        let mut t = templ();
        assert_eq!(
            t.handle_action(Action::SetJoinPaused { paused: true }),
            Err(TemplError::Authorization(AuthorizationError::DispatchOnly))
        );
        let asset = t.access_asset();
        assert_eq!(
            t.handle_disband(asset),
            Err(TemplError::Authorization(AuthorizationError::DispatchOnly))
        );
        assert_eq!(
            t.handle_withdraw(Asset::Native, Address::from_label("x"), None, String::new()),
            Err(TemplError::Authorization(AuthorizationError::DispatchOnly))
        );
        assert!(!t.state().settings.join_paused);
    }

    #[test]
    fn test_dispatch_marker_is_scoped() {
        let mut t = templ();
        let origin = DispatchOrigin::Operator(t.state().settings.operator);
        t.with_dispatch(origin, |t| {
            t.handle_action(Action::SetJoinPaused { paused: true })
        })
        .unwrap();
        assert!(t.state().settings.join_paused);
        // Marker is gone once the dispatch returns.
        assert!(t.handle_action(Action::SetJoinPaused { paused: false }).is_err());
    }

    #[test]
    fn test_direct_call_without_dictatorship_is_governance_only() {
        let mut t = templ();
        let operator = t.state().settings.operator;
        assert_eq!(
            t.execute_direct(operator, Action::SetJoinPaused { paused: true }),
            Err(TemplError::Authorization(AuthorizationError::NotGovernance))
        );
    }

    #[test]
    fn test_custom_action_rejected_by_handler() {
        let mut t = templ();
        let origin = DispatchOrigin::Operator(t.state().settings.operator);
        let result = t.with_dispatch(origin, |t| {
            t.handle_action(Action::Custom {
                handler: "notice".into(),
                payload: String::new(),
            })
        });
        assert!(matches!(
            result,
            Err(TemplError::Validation(ValidationError::InvalidCallData(_)))
        ));
    }
}
