// crates/templ-core/src/error.rs
//
// Error taxonomy for the Templ ledger.
//
// Every failure is a specific, discriminated reason so relay and UI layers can
// map it to actionable guidance ("increase allowance", "wait for the execution
// delay"). Errors fall into three families: who may call (authorization), what
// was passed (validation), and what the ledger currently holds (state).

use thiserror::Error;

use crate::units::{Amount, Bps, Timestamp};

/// Caller is not allowed to invoke the entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// Only the privileged operator may call this.
    #[error("only the operator can call this")]
    OperatorOnly,

    /// Caller is not a member.
    #[error("caller is not a member")]
    NotMember,

    /// Caller is not a council member while council mode is active.
    #[error("caller is not a council member")]
    NotCouncil,

    /// Governance-only entry point called outside proposal execution.
    #[error("only governance can call this")]
    NotGovernance,

    /// Internal handler reached without a dispatch marker.
    #[error("internal handler invoked outside dispatch")]
    DispatchOnly,
}

/// A parameter or payload is malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid percentage for {field}: {value} bps")]
    InvalidPercentage { field: &'static str, value: Bps },

    #[error("fee split must sum to 10000 bps, got {total}")]
    SplitSum { total: u32 },

    #[error("invalid recipient")]
    InvalidRecipient,

    #[error("entry fee {fee} is below the minimum viable split of {minimum}")]
    EntryFeeTooSmall { fee: Amount, minimum: Amount },

    #[error("entry fee exceeds the supported maximum")]
    EntryFeeTooLarge,

    #[error("invalid pricing curve: {0}")]
    InvalidCurve(String),

    #[error("voting period {period}s outside [{min}s, {max}s]")]
    InvalidVotingPeriod { period: u64, min: u64, max: u64 },

    #[error("invalid call data: {0}")]
    InvalidCallData(String),

    #[error("member limit {limit} is below the current member count {members}")]
    MemberLimitTooLow { limit: u64, members: u64 },

    #[error("{field} exceeds {max} characters")]
    TextTooLong { field: &'static str, max: usize },

    #[error("unknown handler: {0}")]
    UnknownHandler(String),

    #[error("snapshot width must be within 8..=64 bits, got {0}")]
    InvalidSnapshotWidth(u32),
}

/// Failure reported by the token bank seam.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("insufficient allowance: need {required}, have {available}")]
    InsufficientAllowance { required: Amount, available: Amount },

    #[error("unknown asset")]
    UnknownAsset,
}

/// The ledger's current state does not permit the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("joins are paused")]
    JoinPaused,

    #[error("already a member")]
    AlreadyMember,

    #[error("member limit reached")]
    MemberLimitReached,

    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("insufficient allowance: need {required}, have {available}; increase allowance")]
    InsufficientAllowance { required: Amount, available: Amount },

    #[error("unsupported token semantics: transfer delivered an unexpected amount")]
    UnsupportedToken,

    #[error("no treasury funds")]
    NoTreasuryFunds,

    #[error("insufficient treasury balance: requested {requested}, available {available}")]
    InsufficientTreasury { requested: Amount, available: Amount },

    #[error("No rewards to claim")]
    NoRewardsToClaim,

    #[error("no members to distribute to")]
    NoMembers,

    #[error("amount too small to give every member a share")]
    DistributionTooSmall,

    #[error("proposer already has active proposal {proposal_id}")]
    ActiveProposalExists { proposal_id: u64 },

    #[error("invalid proposal {id}")]
    InvalidProposal { id: u64 },

    #[error("voting has closed")]
    VotingClosed,

    #[error("proposal already executed")]
    AlreadyExecuted,

    #[error("already voted")]
    AlreadyVoted,

    #[error("joined after the proposal was created")]
    JoinedAfterProposal,

    #[error("proposal did not pass")]
    ProposalNotPassed,

    #[error("quorum not reached")]
    QuorumNotReached,

    #[error("voting period has not ended")]
    VotingNotEnded,

    #[error("execution delay active until {ready_at}; wait for the delay to elapse")]
    ExecutionDelayActive { ready_at: Timestamp },

    #[error("council bootstrap already consumed")]
    CouncilBootstrapConsumed,

    #[error("council member already present")]
    CouncilMemberExists,

    #[error("not a council member")]
    CouncilMemberMissing,

    #[error("council would drop below its minimum size")]
    CouncilMemberMinimum,

    #[error("dictatorship is enabled")]
    DictatorshipEnabled,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("checkpoint sequence must not decrease")]
    CheckpointOrder,

    #[error("bank error: {0}")]
    Bank(#[from] BankError),
}

/// Ledger-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplError {
    #[error("authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl From<BankError> for TemplError {
    fn from(e: BankError) -> Self {
        TemplError::State(StateError::Bank(e))
    }
}

impl TemplError {
    /// Short machine-readable family name, for relay responses.
    pub fn family(&self) -> &'static str {
        match self {
            TemplError::Authorization(_) => "authorization",
            TemplError::Validation(_) => "validation",
            TemplError::State(_) => "state",
        }
    }
}

/// Result alias used by every ledger entry point.
pub type TemplResult<T> = Result<T, TemplError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rewards_message() {
        let err: TemplError = StateError::NoRewardsToClaim.into();
        assert_eq!(err.to_string(), "state error: No rewards to claim");
        assert_eq!(err.family(), "state");
    }

    #[test]
    fn test_bank_error_lifts_into_state_family() {
        let err: TemplError = BankError::UnknownAsset.into();
        assert!(matches!(err, TemplError::State(StateError::Bank(BankError::UnknownAsset))));
    }
}
