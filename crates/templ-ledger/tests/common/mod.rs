// crates/templ-ledger/tests/common/mod.rs
//
// Shared harness for the ledger integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use templ_core::address::{Address, Asset};
use templ_core::clock::ManualClock;
use templ_core::traits::TokenBank;
use templ_core::units::Amount;
use templ_governance::action::Action;
use templ_ledger::{InMemoryBank, Templ, TemplConfig};

pub const START: u64 = 1_700_000_000;
pub const HOUR: u64 = 60 * 60;
pub const DAY: u64 = 24 * HOUR;

pub fn addr(label: &str) -> Address {
    Address::from_label(label)
}

pub struct Harness {
    pub templ: Templ<InMemoryBank>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new(config: TemplConfig) -> Self {
        let mut bank = InMemoryBank::new();
        bank.register_token(config.access_token);
        Self::with_bank(config, bank)
    }

    pub fn with_bank(config: TemplConfig, bank: InMemoryBank) -> Self {
        let clock = ManualClock::new(START);
        let templ = Templ::new(config, bank, Arc::new(clock.clone())).unwrap();
        Self { templ, clock }
    }

    pub fn access(&self) -> Asset {
        self.templ.access_asset()
    }

    pub fn operator(&self) -> Address {
        self.templ.state().settings.operator
    }

    /// Mint access tokens to `who` and raise their allowance to the ledger.
    pub fn fund(&mut self, who: Address, amount: Amount) {
        let token = self.templ.state().settings.access_token;
        let account = self.templ.account();
        let allowance = self.templ.bank().allowance(&token, &who, &account);
        let bank = self.templ.bank_mut();
        bank.mint(&Asset::Token(token), &who, amount).unwrap();
        bank.approve(&token, &who, &account, allowance + amount).unwrap();
    }

    /// Fund and admit each label at the current price.
    pub fn join_all(&mut self, labels: &[&str]) -> Vec<Address> {
        labels
            .iter()
            .map(|label| {
                let who = addr(label);
                let price = self.templ.current_price();
                self.fund(who, price);
                self.templ.join(who).unwrap();
                who
            })
            .collect()
    }

    pub fn balance(&self, asset: &Asset, who: &Address) -> Amount {
        self.templ.bank().balance_of(asset, who)
    }

    pub fn propose(&mut self, proposer: Address, action: Action) -> u64 {
        self.templ
            .create_proposal(proposer, action, "proposal".into(), String::new(), 0)
            .unwrap()
    }

    pub fn advance(&self, seconds: u64) {
        self.clock.advance(seconds);
    }
}
