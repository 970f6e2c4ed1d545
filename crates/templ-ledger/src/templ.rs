// crates/templ-ledger/src/templ.rs
//
// The umbrella `Templ` ledger.
//
// Every externally invoked operation runs as one atomic step through
// `Templ::atomic`: the bank opens a transaction, the operation validates and
// plans, stages its transfers, then applies its bookkeeping. On success the
// bank commits and the staged records are released; on any error the bank
// rolls back and the records are dropped. Operations never mutate ledger
// state before their last fallible step, so a rolled-back bank always
// matches untouched books. The one deliberate exception is a proposal that
// fails its vote, which is finalized before `ProposalNotPassed` is returned.
//
// Transfers staged inside a step become observable only at commit, after all
// bookkeeping for the step is done.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use templ_core::address::{Address, Asset};
use templ_core::clock::Clock;
use templ_core::error::{AuthorizationError, StateError, TemplResult};
use templ_core::events::TemplEvent;
use templ_core::traits::TokenBank;
use templ_core::units::{Amount, Timestamp};
use templ_governance::handlers::HandlerRegistry;

use crate::config::TemplConfig;
use crate::state::{LedgerState, Member};

/// Why an internal handler is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOrigin {
    /// Executing a passed proposal.
    Proposal { id: u64, proposer: Address },
    /// The operator acting directly under dictator mode.
    Operator(Address),
}

impl DispatchOrigin {
    /// The address credited with the change in emitted records.
    pub fn actor(&self) -> Address {
        match self {
            DispatchOrigin::Proposal { proposer, .. } => *proposer,
            DispatchOrigin::Operator(addr) => *addr,
        }
    }

    pub fn proposal_id(&self) -> Option<u64> {
        match self {
            DispatchOrigin::Proposal { id, .. } => Some(*id),
            DispatchOrigin::Operator(_) => None,
        }
    }
}

/// Serializable ledger plus bank, for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplSnapshot<B> {
    pub state: LedgerState,
    pub bank: B,
}

/// A Templ: membership, rewards, treasury, and governance over one bank.
pub struct Templ<B: TokenBank> {
    pub(crate) state: LedgerState,
    pub(crate) bank: B,
    clock: Arc<dyn Clock>,
    pub(crate) handlers: HandlerRegistry,
    staged: Vec<TemplEvent>,
    events: Vec<TemplEvent>,
    dispatch: Option<DispatchOrigin>,
}

impl<B: TokenBank> Templ<B> {
    /// Create a Templ from a config.
    ///
    /// # Errors
    /// Any `ValidationError` from [`TemplConfig::validate`].
    pub fn new(config: TemplConfig, bank: B, clock: Arc<dyn Clock>) -> TemplResult<Self> {
        config.validate()?;
        info!(
            operator = %config.operator,
            access_token = %config.access_token,
            entry_fee = %config.base_entry_fee,
            "templ created"
        );
        Ok(Self::from_parts(LedgerState::from_config(&config), bank, clock))
    }

    /// Rebuild a Templ from a snapshot.
    pub fn restore(snapshot: TemplSnapshot<B>, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(snapshot.state, snapshot.bank, clock)
    }

    fn from_parts(state: LedgerState, bank: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            state,
            bank,
            clock,
            handlers: HandlerRegistry::with_builtin(),
            staged: Vec::new(),
            events: Vec::new(),
            dispatch: None,
        }
    }

    /// Consume the Templ into its persistent parts.
    pub fn into_snapshot(self) -> TemplSnapshot<B> {
        TemplSnapshot {
            state: self.state,
            bank: self.bank,
        }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Direct bank access for setup (minting, approvals) between steps.
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    /// Register additional custom handlers.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The ledger's own bank account.
    pub fn account(&self) -> Address {
        self.state.settings.account
    }

    pub fn access_asset(&self) -> Asset {
        self.state.settings.access_asset()
    }

    /// Records released by committed steps, oldest first.
    pub fn events(&self) -> &[TemplEvent] {
        &self.events
    }

    /// Take every released record.
    pub fn drain_events(&mut self) -> Vec<TemplEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn member(&self, addr: &Address) -> Option<&Member> {
        self.state.members.get(addr)
    }

    pub fn member_count(&self) -> u64 {
        self.state.member_count()
    }

    // ------------------------------------------------------------------
    // Step and dispatch plumbing
    // ------------------------------------------------------------------

    /// Run `f` as one atomic step.
    pub(crate) fn atomic<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> TemplResult<T>,
    ) -> TemplResult<T> {
        self.bank.begin();
        match f(self) {
            Ok(value) => {
                self.bank.commit();
                self.events.append(&mut self.staged);
                Ok(value)
            }
            Err(e) => {
                self.bank.rollback();
                self.staged.clear();
                self.dispatch = None;
                debug!(op, error = %e, "step rolled back");
                Err(e)
            }
        }
    }

    /// Stage a record for release at commit.
    pub(crate) fn emit(&mut self, event: TemplEvent) {
        self.staged.push(event);
    }

    /// Run `f` with a dispatch marker set, restoring the previous marker
    /// afterwards.
    pub(crate) fn with_dispatch<T>(
        &mut self,
        origin: DispatchOrigin,
        f: impl FnOnce(&mut Self) -> TemplResult<T>,
    ) -> TemplResult<T> {
        let previous = self.dispatch.replace(origin);
        let result = f(self);
        self.dispatch = previous;
        result
    }

    /// Guard at the top of every internal handler.
    pub(crate) fn require_dispatch(&self) -> Result<DispatchOrigin, AuthorizationError> {
        self.dispatch.ok_or(AuthorizationError::DispatchOnly)
    }

    /// True while a passed proposal's action is running.
    pub(crate) fn governance_executing(&self) -> bool {
        matches!(self.dispatch, Some(DispatchOrigin::Proposal { .. }))
    }

    pub(crate) fn require_member(&self, addr: &Address) -> Result<&Member, AuthorizationError> {
        self.state
            .members
            .get(addr)
            .ok_or(AuthorizationError::NotMember)
    }

    /// Check that `payer` can cover `amount` of the access token.
    pub(crate) fn check_payment(&self, payer: &Address, amount: Amount) -> Result<(), StateError> {
        let token = self.state.settings.access_token;
        let available = self.bank.balance_of(&self.access_asset(), payer);
        if available < amount {
            return Err(StateError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let allowed = self.bank.allowance(&token, payer, &self.account());
        if allowed < amount {
            return Err(StateError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        Ok(())
    }

    /// Pull `amount` of the access token from `payer` into the ledger
    /// account, rejecting tokens that deliver anything else.
    pub(crate) fn collect_payment(&mut self, payer: &Address, amount: Amount) -> TemplResult<()> {
        self.check_payment(payer, amount)?;
        let token = self.state.settings.access_token;
        let asset = self.access_asset();
        let account = self.account();
        let before = self.bank.balance_of(&asset, &account);
        self.bank
            .transfer_from(&token, &account, payer, &account, amount)?;
        let after = self.bank.balance_of(&asset, &account);
        if after.checked_sub(before) != Some(amount) {
            return Err(StateError::UnsupportedToken.into());
        }
        Ok(())
    }
}

impl<B: TokenBank + Clone> Templ<B> {
    /// Copy of the persistent parts.
    pub fn snapshot(&self) -> TemplSnapshot<B> {
        TemplSnapshot {
            state: self.state.clone(),
            bank: self.bank.clone(),
        }
    }
}

impl<B: TokenBank> std::fmt::Debug for Templ<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templ")
            .field("members", &self.state.member_count())
            .field("purchase_count", &self.state.purchase_count)
            .field("proposals", &self.state.governance.proposal_count())
            .finish()
    }
}
