// crates/templ-governance/src/proposal.rs
//
// Proposal record and its lifecycle evaluation.
//
// Every threshold a proposal is judged by is copied into `ProposalRules` when
// it is created and never re-read from the mutable global parameters, so a
// governance change can not retroactively rescue or sink a proposal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use templ_core::address::Address;
use templ_core::error::StateError;
use templ_core::units::{meets_bps, Amount, Bps, Timestamp};

use crate::action::Action;

/// Thresholds and electorate fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRules {
    pub quorum_bps: Bps,
    pub yes_threshold_bps: Bps,
    pub instant_quorum_bps: Bps,
    pub post_quorum_delay: u64,
    /// Participation denominator: member count, or council size in council mode.
    pub eligible_voters: u64,
    /// Members admitted after this join sequence may not vote.
    pub join_cutoff: u64,
    /// Whether council mode was on at creation.
    pub council_mode: bool,
}

/// Lifecycle state of a proposal at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Voting, quorum not yet met.
    Open { deadline: Timestamp },
    /// Quorum met, waiting for the post-quorum delay.
    QuorumMet { ready_at: Timestamp },
    /// May be executed now.
    Executable,
    /// Deadline passed without quorum. Can never execute.
    Expired,
    Executed { passed: bool },
}

/// A governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub action: Action,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    /// End of voting. Reset to `quorum_reached_at + post_quorum_delay` when
    /// quorum is first met.
    pub deadline: Timestamp,
    pub quorum_reached_at: Option<Timestamp>,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub ballots: BTreeMap<Address, bool>,
    pub rules: ProposalRules,
    pub fee_paid: Amount,
    pub executed: bool,
    pub passed: bool,
}

impl Proposal {
    /// Ballots cast so far.
    pub fn participation(&self) -> u64 {
        self.yes_votes + self.no_votes
    }

    pub fn quorum_met(&self) -> bool {
        meets_bps(
            self.participation(),
            self.rules.eligible_voters,
            self.rules.quorum_bps,
        )
    }

    pub fn instant_quorum_met(&self) -> bool {
        meets_bps(
            self.participation(),
            self.rules.eligible_voters,
            self.rules.instant_quorum_bps,
        )
    }

    /// `yes / (yes + no) >= threshold`, evaluated without division.
    pub fn passes(&self) -> bool {
        meets_bps(
            self.yes_votes,
            self.participation(),
            self.rules.yes_threshold_bps,
        )
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.ballots.contains_key(voter)
    }

    /// Voting is open while not executed and before the deadline.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        !self.executed && now < self.deadline
    }

    /// Record a ballot. Returns `Some((at, deadline))` the first time the
    /// ballot brings participation up to quorum.
    pub(crate) fn record_ballot(
        &mut self,
        voter: Address,
        support: bool,
        now: Timestamp,
    ) -> Option<(Timestamp, Timestamp)> {
        self.ballots.insert(voter, support);
        if support {
            self.yes_votes += 1;
        } else {
            self.no_votes += 1;
        }
        if self.quorum_reached_at.is_none() && self.quorum_met() {
            self.quorum_reached_at = Some(now);
            self.deadline = now.saturating_add(self.rules.post_quorum_delay);
            return Some((now, self.deadline));
        }
        None
    }

    /// Check the timing conditions for execution.
    ///
    /// Instant quorum bypasses both the deadline and the post-quorum delay.
    ///
    /// # Errors
    /// - `ExecutionDelayActive` while quorum is met but the delay runs.
    /// - `VotingNotEnded` before the deadline without quorum.
    /// - `QuorumNotReached` at or after the deadline without quorum.
    pub fn check_timing(&self, now: Timestamp) -> Result<(), StateError> {
        if self.instant_quorum_met() {
            return Ok(());
        }
        match self.quorum_reached_at {
            Some(_) if now < self.deadline => Err(StateError::ExecutionDelayActive {
                ready_at: self.deadline,
            }),
            Some(_) => Ok(()),
            None if now < self.deadline => Err(StateError::VotingNotEnded),
            None => Err(StateError::QuorumNotReached),
        }
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        if self.executed {
            return ProposalStatus::Executed {
                passed: self.passed,
            };
        }
        match self.check_timing(now) {
            Ok(()) => ProposalStatus::Executable,
            Err(StateError::ExecutionDelayActive { ready_at }) => {
                ProposalStatus::QuorumMet { ready_at }
            }
            Err(StateError::QuorumNotReached) => ProposalStatus::Expired,
            Err(_) => ProposalStatus::Open {
                deadline: self.deadline,
            },
        }
    }

    /// Whether this proposal still blocks its proposer from opening another.
    ///
    /// A proposal stops blocking once executed, or once its deadline has
    /// passed. After quorum the deadline is the end of the post-quorum
    /// delay; a proposal past it may still be executed.
    pub fn is_outstanding(&self, now: Timestamp) -> bool {
        !self.executed && now < self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(eligible: u64, quorum: Bps, instant: Bps) -> Proposal {
        Proposal {
            id: 0,
            proposer: Address::from_label("p"),
            action: Action::SetJoinPaused { paused: true },
            title: "t".into(),
            description: String::new(),
            created_at: 0,
            deadline: 1_000,
            quorum_reached_at: None,
            yes_votes: 0,
            no_votes: 0,
            ballots: BTreeMap::new(),
            rules: ProposalRules {
                quorum_bps: quorum,
                yes_threshold_bps: 5_100,
                instant_quorum_bps: instant,
                post_quorum_delay: 100,
                eligible_voters: eligible,
                join_cutoff: eligible,
                council_mode: false,
            },
            fee_paid: 0,
            executed: false,
            passed: false,
        }
    }

    #[test]
    fn test_quorum_resets_deadline() {
        let mut p = proposal(4, 5_000, 10_000);
        assert!(p.record_ballot(Address::from_label("a"), true, 10).is_none());
        assert_eq!(p.status(10), ProposalStatus::Open { deadline: 1_000 });
        let reached = p.record_ballot(Address::from_label("b"), false, 20);
        assert_eq!(reached, Some((20, 120)));
        assert_eq!(p.deadline, 120);
        // Quorum is only reported once.
        assert!(p.record_ballot(Address::from_label("c"), true, 30).is_none());
    }

    #[test]
    fn test_timing_errors() {
        let mut p = proposal(4, 5_000, 10_000);
        assert_eq!(p.check_timing(999), Err(StateError::VotingNotEnded));
        assert_eq!(p.check_timing(1_000), Err(StateError::QuorumNotReached));
        assert_eq!(p.status(1_000), ProposalStatus::Expired);

        p.record_ballot(Address::from_label("a"), true, 10);
        p.record_ballot(Address::from_label("b"), true, 10);
        assert_eq!(
            p.check_timing(109),
            Err(StateError::ExecutionDelayActive { ready_at: 110 })
        );
        assert_eq!(p.check_timing(110), Ok(()));
    }

    #[test]
    fn test_instant_quorum_bypasses_delay() {
        let mut p = proposal(2, 3_300, 2_500);
        p.record_ballot(Address::from_label("a"), true, 5);
        assert!(p.instant_quorum_met());
        assert_eq!(p.check_timing(5), Ok(()));
        assert_eq!(p.status(5), ProposalStatus::Executable);
    }

    #[test]
    fn test_pass_rule_at_boundary() {
        let mut p = proposal(5, 0, 10_000);
        p.rules.yes_threshold_bps = 6_000;
        for (who, support) in [("a", true), ("b", true), ("c", true), ("d", false), ("e", false)] {
            p.record_ballot(Address::from_label(who), support, 1);
        }
        assert!(p.passes());
        p.rules.yes_threshold_bps = 6_001;
        assert!(!p.passes());
    }

    #[test]
    fn test_outstanding() {
        let mut p = proposal(4, 5_000, 10_000);
        assert!(p.is_outstanding(0));
        assert!(!p.is_outstanding(1_000));
        p.record_ballot(Address::from_label("a"), true, 1);
        p.record_ballot(Address::from_label("b"), true, 1);
        // Quorum met at 1: blocks until the post-quorum delay ends.
        assert!(p.is_outstanding(100));
        assert!(!p.is_outstanding(101));
        p.executed = true;
        assert!(!p.is_outstanding(0));
    }
}
