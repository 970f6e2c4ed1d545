// crates/templ-cli/src/config.rs
//
// Deploy configuration for `templ init`.
//
// A TOML file with the ledger settings under `[ledger]`, extra tokens the
// in-memory bank should know about under `[[tokens]]`, and genesis balances
// under `[[genesis]]`:
//
//   [ledger]
//   base_entry_fee = 100
//
//   [[tokens]]
//   address = "0x00000000000000000000000000000000000000bb"
//
//   [[genesis]]
//   holder = "alice"
//   amount = "1000"

use std::fs;
use std::path::Path;

use serde::Deserialize;

use templ_core::address::{Address, Asset};
use templ_core::units::{flexible_amount, Amount, Bps};
use templ_ledger::{InMemoryBank, TemplConfig};

/// Top-level CLI deploy config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub ledger: TemplConfig,
    pub tokens: Vec<TokenSpec>,
    pub genesis: Vec<GenesisMint>,
}

/// A token registered with the bank besides the access token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSpec {
    pub address: Address,
    /// Non-zero makes this a fee-on-transfer token.
    #[serde(default)]
    pub transfer_fee_bps: Bps,
}

/// A balance minted at genesis.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisMint {
    /// `0x…` address or a label hashed with `Address::from_label`.
    pub holder: String,
    /// Defaults to the access token.
    #[serde(default)]
    pub asset: Option<Asset>,
    #[serde(with = "flexible_amount")]
    pub amount: Amount,
    /// Also approve the ledger account to pull the minted amount. Only
    /// meaningful for tokens.
    #[serde(default = "default_true")]
    pub approve: bool,
}

fn default_true() -> bool {
    true
}

impl CliConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Build the bank described by `tokens` and `genesis`.
    pub fn build_bank(&self) -> Result<InMemoryBank, Box<dyn std::error::Error>> {
        let mut bank = InMemoryBank::new();
        bank.register_token(self.ledger.access_token);
        for token in &self.tokens {
            if token.transfer_fee_bps > 0 {
                bank.register_fee_token(token.address, token.transfer_fee_bps);
            } else {
                bank.register_token(token.address);
            }
        }

        let access = Asset::Token(self.ledger.access_token);
        for mint in &self.genesis {
            let holder = resolve_address(&mint.holder)?;
            let asset = mint.asset.unwrap_or(access);
            bank.mint(&asset, &holder, mint.amount)?;
            if let (Asset::Token(token), true) = (asset, mint.approve) {
                bank.approve(&token, &holder, &self.ledger.account, mint.amount)?;
            }
            tracing::debug!(%holder, %asset, amount = %mint.amount, "genesis mint");
        }
        Ok(bank)
    }
}

/// Parse a `0x…` address, or derive one from a label.
pub fn resolve_address(input: &str) -> Result<Address, Box<dyn std::error::Error>> {
    if input.starts_with("0x") {
        Ok(input.parse::<Address>()?)
    } else {
        Ok(Address::from_label(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templ_core::traits::TokenBank;

    #[test]
    fn test_genesis_mints_and_approves() {
        let config: CliConfig = toml::from_str(
            r#"
            [ledger]
            base_entry_fee = 100

            [[tokens]]
            address = "0x00000000000000000000000000000000000000bb"
            transfer_fee_bps = 100

            [[genesis]]
            holder = "alice"
            amount = "250"

            [[genesis]]
            holder = "bob"
            asset = "native"
            amount = 7
            "#,
        )
        .unwrap();
        let bank = config.build_bank().unwrap();
        let access = Asset::Token(config.ledger.access_token);
        let alice = Address::from_label("alice");
        assert_eq!(bank.balance_of(&access, &alice), 250);
        assert_eq!(
            bank.allowance(&config.ledger.access_token, &alice, &config.ledger.account),
            250
        );
        assert_eq!(bank.balance_of(&Asset::Native, &Address::from_label("bob")), 7);
        assert!(bank.supports(&Asset::Token(
            "0x00000000000000000000000000000000000000bb".parse().unwrap()
        )));
    }

    #[test]
    fn test_resolve_address_forms() {
        assert_eq!(resolve_address("alice").unwrap(), Address::from_label("alice"));
        let hex = "0x00000000000000000000000000000000000000aa";
        assert_eq!(resolve_address(hex).unwrap().to_string(), hex);
        assert!(resolve_address("0xzz").is_err());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.ledger.base_entry_fee, 100);
        assert!(config.genesis.is_empty());
    }
}
