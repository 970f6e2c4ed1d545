// crates/templ-ledger/src/config.rs
//
// Deploy-time configuration for a Templ.
// Loaded from a TOML table or populated with sensible defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use templ_core::address::Address;
use templ_core::error::ValidationError;
use templ_core::units::{check_bps, flexible_amount, Amount, Bps};
use templ_economics::checkpoint::SnapshotWidth;
use templ_economics::pricing::PricingCurve;
use templ_economics::split::FeeSplit;
use templ_governance::action::{check_entry_fee, check_len, MAX_HOME_LINK_LEN};
use templ_governance::engine::GovernanceParams;

/// Configuration a Templ is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplConfig {
    /// Privileged operator ("priest"). Acts alone only under dictator mode.
    #[serde(default = "default_operator")]
    pub operator: Address,

    /// The ledger's own account in the bank.
    #[serde(default = "default_account")]
    pub account: Address,

    /// Receives the protocol share of every entry fee.
    #[serde(default = "default_protocol_recipient")]
    pub protocol_recipient: Address,

    /// Token members pay their entry fee in.
    #[serde(default = "default_access_token")]
    pub access_token: Address,

    /// Price of the first admission, in access-token base units.
    #[serde(default = "default_entry_fee", with = "flexible_amount")]
    pub base_entry_fee: Amount,

    /// Burn / treasury / member pool / protocol weights.
    #[serde(default)]
    pub fee_split: FeeSplit,

    /// Quorum, thresholds, delays and voting periods.
    #[serde(default)]
    pub governance: GovernanceParams,

    /// Maximum members, 0 for no cap.
    #[serde(default)]
    pub max_members: u64,

    #[serde(default)]
    pub join_paused: bool,

    #[serde(default)]
    pub dictator_mode: bool,

    #[serde(default)]
    pub council_mode: bool,

    /// Council seats at creation.
    #[serde(default)]
    pub initial_council: Vec<Address>,

    #[serde(default = "default_burn_address")]
    pub burn_address: Address,

    /// Link to the group's home (chat invite, site).
    #[serde(default)]
    pub home_link: String,

    #[serde(default)]
    pub pricing_curve: PricingCurve,

    /// Share of the member-pool cut paid to a referrer.
    #[serde(default)]
    pub referral_share_bps: Bps,

    /// Width in bits of external-reward settlement snapshots.
    #[serde(default)]
    pub external_snapshot_width: SnapshotWidth,
}

fn default_operator() -> Address {
    Address::from_label("operator")
}

fn default_account() -> Address {
    Address::from_label("templ")
}

fn default_protocol_recipient() -> Address {
    Address::from_label("protocol")
}

fn default_access_token() -> Address {
    Address::from_label("access-token")
}

fn default_entry_fee() -> Amount {
    100
}

fn default_burn_address() -> Address {
    Address::DEAD
}

impl Default for TemplConfig {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            account: default_account(),
            protocol_recipient: default_protocol_recipient(),
            access_token: default_access_token(),
            base_entry_fee: default_entry_fee(),
            fee_split: FeeSplit::default(),
            governance: GovernanceParams::default(),
            max_members: 0,
            join_paused: false,
            dictator_mode: false,
            council_mode: false,
            initial_council: Vec::new(),
            burn_address: default_burn_address(),
            home_link: String::new(),
            pricing_curve: PricingCurve::default(),
            referral_share_bps: 0,
            external_snapshot_width: SnapshotWidth::default(),
        }
    }
}

impl TemplConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: TemplConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Run every rule the governance handlers enforce on the same fields.
    ///
    /// # Errors
    /// The first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.operator.require_recipient()?;
        self.account.require_recipient()?;
        self.protocol_recipient.require_recipient()?;
        self.access_token.require_recipient()?;
        self.burn_address.require_recipient()?;
        check_entry_fee(self.base_entry_fee)?;
        self.fee_split.validate()?;
        self.governance.validate()?;
        self.pricing_curve.validate()?;
        check_bps("referral_share_bps", self.referral_share_bps)?;
        check_len("home_link", &self.home_link, MAX_HOME_LINK_LEN)?;
        for seat in &self.initial_council {
            seat.require_recipient()?;
        }
        Ok(())
    }
}
