// crates/templ-ledger/src/bank.rs
//
// In-memory token bank with a rollback journal.
//
// Balances are kept per asset and owner. Tokens expose ERC-20 style
// allowances; the native asset has none. A token may be registered with a
// transfer fee, in which case the recipient receives less than was sent.
// The ledger rejects such tokens for entry fees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use templ_core::address::{Address, Asset};
use templ_core::error::BankError;
use templ_core::traits::TokenBank;
use templ_core::units::{apply_bps, Amount, Bps, BPS_DENOMINATOR};

/// Per-token transfer behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProfile {
    /// Bps of every transfer that never reaches the recipient.
    #[serde(default)]
    pub transfer_fee_bps: Bps,
}

/// Undo record for one mutated cell.
#[derive(Debug, Clone)]
enum JournalEntry {
    Balance {
        asset: Asset,
        owner: Address,
        previous: Amount,
    },
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
        previous: Amount,
    },
}

/// A bank held entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryBank {
    tokens: BTreeMap<Address, TokenProfile>,
    balances: BTreeMap<Asset, BTreeMap<Address, Amount>>,
    /// token → owner → spender → allowance.
    allowances: BTreeMap<Address, BTreeMap<Address, BTreeMap<Address, Amount>>>,
    #[serde(skip)]
    journal: Option<Vec<JournalEntry>>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a standard token.
    pub fn register_token(&mut self, token: Address) {
        self.tokens.entry(token).or_default();
    }

    /// Register a token that keeps `transfer_fee_bps` of every transfer.
    /// Rates above 100% are capped.
    pub fn register_fee_token(&mut self, token: Address, transfer_fee_bps: Bps) {
        self.tokens.insert(
            token,
            TokenProfile {
                transfer_fee_bps: transfer_fee_bps.min(BPS_DENOMINATOR),
            },
        );
    }

    /// Credit `amount` of `asset` to `to` out of thin air.
    ///
    /// # Errors
    /// `BankError::UnknownAsset` for an unregistered token.
    pub fn mint(&mut self, asset: &Asset, to: &Address, amount: Amount) -> Result<(), BankError> {
        if !self.supports(asset) {
            return Err(BankError::UnknownAsset);
        }
        let current = self.balance_of(asset, to);
        self.set_balance(asset, to, current.saturating_add(amount));
        Ok(())
    }

    /// Set the allowance `spender` may pull from `owner`.
    pub fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        if !self.tokens.contains_key(token) {
            return Err(BankError::UnknownAsset);
        }
        self.set_allowance(token, owner, spender, amount);
        Ok(())
    }

    /// Sum of every balance of `asset`.
    pub fn total_supply(&self, asset: &Asset) -> Amount {
        self.balances
            .get(asset)
            .map_or(0, |m| m.values().fold(0, |acc: Amount, v| acc.saturating_add(*v)))
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    fn set_balance(&mut self, asset: &Asset, owner: &Address, value: Amount) {
        let slot = self
            .balances
            .entry(*asset)
            .or_default()
            .entry(*owner)
            .or_insert(0);
        if let Some(journal) = self.journal.as_mut() {
            journal.push(JournalEntry::Balance {
                asset: *asset,
                owner: *owner,
                previous: *slot,
            });
        }
        *slot = value;
    }

    fn set_allowance(&mut self, token: &Address, owner: &Address, spender: &Address, value: Amount) {
        let slot = self
            .allowances
            .entry(*token)
            .or_default()
            .entry(*owner)
            .or_default()
            .entry(*spender)
            .or_insert(0);
        if let Some(journal) = self.journal.as_mut() {
            journal.push(JournalEntry::Allowance {
                token: *token,
                owner: *owner,
                spender: *spender,
                previous: *slot,
            });
        }
        *slot = value;
    }

    fn move_funds(
        &mut self,
        asset: &Asset,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        if !self.supports(asset) {
            return Err(BankError::UnknownAsset);
        }
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let fee = match asset {
            Asset::Token(token) => self
                .tokens
                .get(token)
                .and_then(|p| apply_bps(amount, p.transfer_fee_bps))
                .unwrap_or(0),
            Asset::Native => 0,
        };
        self.set_balance(asset, from, available - amount);
        let received = self.balance_of(asset, to);
        self.set_balance(asset, to, received.saturating_add(amount - fee));
        Ok(())
    }
}

impl TokenBank for InMemoryBank {
    fn supports(&self, asset: &Asset) -> bool {
        match asset {
            Asset::Native => true,
            Asset::Token(token) => self.tokens.contains_key(token),
        }
    }

    fn balance_of(&self, asset: &Asset, owner: &Address) -> Amount {
        self.balances
            .get(asset)
            .and_then(|m| m.get(owner))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(token)
            .and_then(|o| o.get(owner))
            .and_then(|s| s.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: &Asset,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        self.move_funds(asset, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        let allowed = self.allowance(token, from, spender);
        if allowed < amount {
            return Err(BankError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        self.move_funds(&Asset::Token(*token), from, to, amount)?;
        self.set_allowance(token, from, spender, allowed - amount);
        Ok(())
    }

    fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for entry in journal.into_iter().rev() {
            match entry {
                JournalEntry::Balance {
                    asset,
                    owner,
                    previous,
                } => {
                    self.balances
                        .entry(asset)
                        .or_default()
                        .insert(owner, previous);
                }
                JournalEntry::Allowance {
                    token,
                    owner,
                    spender,
                    previous,
                } => {
                    self.allowances
                        .entry(token)
                        .or_default()
                        .entry(owner)
                        .or_default()
                        .insert(spender, previous);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn bank_with_token() -> (InMemoryBank, Address) {
        let mut bank = InMemoryBank::new();
        let token = addr("token");
        bank.register_token(token);
        bank.mint(&Asset::Token(token), &addr("alice"), 1_000).unwrap();
        (bank, token)
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut bank, token) = bank_with_token();
        let asset = Asset::Token(token);
        bank.transfer(&asset, &addr("alice"), &addr("bob"), 300).unwrap();
        assert_eq!(bank.balance_of(&asset, &addr("alice")), 700);
        assert_eq!(bank.balance_of(&asset, &addr("bob")), 300);
        assert_eq!(bank.total_supply(&asset), 1_000);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut bank, token) = bank_with_token();
        let (alice, templ) = (addr("alice"), addr("templ"));
        assert_eq!(
            bank.transfer_from(&token, &templ, &alice, &templ, 100),
            Err(BankError::InsufficientAllowance {
                required: 100,
                available: 0
            })
        );
        bank.approve(&token, &alice, &templ, 150).unwrap();
        bank.transfer_from(&token, &templ, &alice, &templ, 100).unwrap();
        assert_eq!(bank.allowance(&token, &alice, &templ), 50);
        assert_eq!(bank.balance_of(&Asset::Token(token), &templ), 100);
    }

    #[test]
    fn test_rollback_restores_everything() {
        let (mut bank, token) = bank_with_token();
        let asset = Asset::Token(token);
        let (alice, templ) = (addr("alice"), addr("templ"));
        bank.approve(&token, &alice, &templ, 500).unwrap();
        bank.begin();
        bank.transfer_from(&token, &templ, &alice, &templ, 200).unwrap();
        bank.transfer(&asset, &templ, &addr("carol"), 50).unwrap();
        bank.rollback();
        assert_eq!(bank.balance_of(&asset, &alice), 1_000);
        assert_eq!(bank.balance_of(&asset, &templ), 0);
        assert_eq!(bank.balance_of(&asset, &addr("carol")), 0);
        assert_eq!(bank.allowance(&token, &alice, &templ), 500);
        assert!(!bank.in_transaction());
    }

    #[test]
    fn test_commit_keeps_changes() {
        let (mut bank, token) = bank_with_token();
        let asset = Asset::Token(token);
        bank.begin();
        bank.transfer(&asset, &addr("alice"), &addr("bob"), 10).unwrap();
        bank.commit();
        bank.rollback();
        assert_eq!(bank.balance_of(&asset, &addr("bob")), 10);
    }

    #[test]
    fn test_fee_token_delivers_less() {
        let mut bank = InMemoryBank::new();
        let token = addr("fee");
        bank.register_fee_token(token, 100);
        let asset = Asset::Token(token);
        bank.mint(&asset, &addr("alice"), 1_000).unwrap();
        bank.transfer(&asset, &addr("alice"), &addr("bob"), 1_000).unwrap();
        assert_eq!(bank.balance_of(&asset, &addr("bob")), 990);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let mut bank = InMemoryBank::new();
        let asset = Asset::Token(addr("ghost"));
        assert!(!bank.supports(&asset));
        assert_eq!(bank.mint(&asset, &addr("a"), 1), Err(BankError::UnknownAsset));
        assert!(bank.supports(&Asset::Native));
    }
}
