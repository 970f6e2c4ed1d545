// crates/templ-economics/src/treasury.rs
//
// Access-token treasury of a Templ.
//
// The treasury receives:
//   - The treasury share of every entry fee.
//   - The member-pool share of an admission that had no prior members.
//   - Proposal fees.
//
// It is spent only by governance (or the operator under dictator mode) via
// withdrawals, or swept into the member pool by a disband. Member-pool funds
// are tracked separately and are never reachable through this balance.

use serde::{Deserialize, Serialize};

use templ_core::error::StateError;
use templ_core::units::Amount;

/// The access-token treasury.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    /// Current balance in access-token base units.
    balance: Amount,
    /// Total ever received.
    total_received: Amount,
    /// Total ever withdrawn or swept out.
    total_spent: Amount,
}

impl Treasury {
    /// Create a new treasury with zero balance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a treasury with an initial balance.
    pub fn with_balance(balance: Amount) -> Self {
        Self {
            balance,
            total_received: balance,
            total_spent: 0,
        }
    }

    /// Deposit tokens into the treasury.
    pub fn deposit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        self.total_received = self.total_received.saturating_add(amount);
    }

    /// Check that `amount` could be withdrawn.
    ///
    /// # Errors
    /// - `StateError::NoTreasuryFunds` if the treasury is empty.
    /// - `StateError::InsufficientTreasury` if `amount` exceeds the balance.
    pub fn ensure_available(&self, amount: Amount) -> Result<(), StateError> {
        if self.balance == 0 {
            return Err(StateError::NoTreasuryFunds);
        }
        if amount > self.balance {
            return Err(StateError::InsufficientTreasury {
                requested: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Withdraw tokens from the treasury.
    ///
    /// # Arguments
    /// - `amount` - Amount to withdraw.
    ///
    /// # Errors
    /// Same as [`Treasury::ensure_available`]. The balance is unchanged on error.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), StateError> {
        self.ensure_available(amount)?;
        self.balance -= amount;
        self.total_spent = self.total_spent.saturating_add(amount);
        Ok(())
    }

    /// Get the current treasury balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn total_received(&self) -> Amount {
        self.total_received
    }

    pub fn total_spent(&self) -> Amount {
        self.total_spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_treasury_has_zero_balance() {
        let treasury = Treasury::new();
        assert_eq!(treasury.balance(), 0);
        assert_eq!(treasury.ensure_available(1), Err(StateError::NoTreasuryFunds));
    }

    #[test]
    fn test_multiple_deposits() {
        let mut treasury = Treasury::new();
        treasury.deposit(50);
        treasury.deposit(30);
        assert_eq!(treasury.balance(), 80);
        assert_eq!(treasury.total_received(), 80);
    }

    #[test]
    fn test_withdraw_exact_balance() {
        let mut treasury = Treasury::with_balance(100);
        treasury.withdraw(100).unwrap();
        assert_eq!(treasury.balance(), 0);
        assert_eq!(treasury.total_spent(), 100);
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let mut treasury = Treasury::with_balance(50);
        let result = treasury.withdraw(100);
        assert_eq!(
            result,
            Err(StateError::InsufficientTreasury {
                requested: 100,
                available: 50
            })
        );
        // Balance should be unchanged
        assert_eq!(treasury.balance(), 50);
    }
}
