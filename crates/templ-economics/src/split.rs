// crates/templ-economics/src/split.rs
//
// Fee splitting for admissions.
//
// Each entry payment is divided into four buckets by basis-point weights:
//   - Burn:        sent to the burn address.
//   - Treasury:    held by the ledger, spendable by governance.
//   - Member pool: distributed pro-rata to existing members.
//   - Protocol:    sent to the protocol recipient.
// Burn, treasury and pool shares are floored; the protocol share absorbs the
// integer-division remainder so the four buckets always sum to the price.

use serde::{Deserialize, Serialize};

use templ_core::error::ValidationError;
use templ_core::units::{apply_bps, check_bps, Amount, Bps, BPS_DENOMINATOR};

/// Basis-point weights of the four entry-fee buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub burn_bps: Bps,
    pub treasury_bps: Bps,
    pub member_pool_bps: Bps,
    pub protocol_bps: Bps,
}

impl Default for FeeSplit {
    /// 30% burn, 30% treasury, 30% member pool, 10% protocol.
    fn default() -> Self {
        Self {
            burn_bps: 3_000,
            treasury_bps: 3_000,
            member_pool_bps: 3_000,
            protocol_bps: 1_000,
        }
    }
}

/// The four integer amounts an entry payment splits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitAmounts {
    pub burn: Amount,
    pub treasury: Amount,
    pub member_pool: Amount,
    pub protocol: Amount,
}

impl SplitAmounts {
    pub fn total(&self) -> Amount {
        self.burn + self.treasury + self.member_pool + self.protocol
    }
}

impl FeeSplit {
    /// Validate that every weight is a percentage and the four sum to 10_000.
    ///
    /// # Errors
    /// `ValidationError::InvalidPercentage` for a weight above 10_000 bps,
    /// `ValidationError::SplitSum` if the weights do not sum to 10_000.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_bps("burn_bps", self.burn_bps)?;
        check_bps("treasury_bps", self.treasury_bps)?;
        check_bps("member_pool_bps", self.member_pool_bps)?;
        check_bps("protocol_bps", self.protocol_bps)?;
        let total = self.burn_bps as u32
            + self.treasury_bps as u32
            + self.member_pool_bps as u32
            + self.protocol_bps as u32;
        if total != BPS_DENOMINATOR as u32 {
            return Err(ValidationError::SplitSum { total });
        }
        Ok(())
    }

    /// Split `price` into the four buckets.
    ///
    /// Returns `None` only if `price * bps` overflows, which cannot happen for
    /// prices below `MAX_ENTRY_FEE`.
    pub fn split(&self, price: Amount) -> Option<SplitAmounts> {
        let burn = apply_bps(price, self.burn_bps)?;
        let treasury = apply_bps(price, self.treasury_bps)?;
        let member_pool = apply_bps(price, self.member_pool_bps)?;
        let protocol = price.checked_sub(burn + treasury + member_pool)?;
        Some(SplitAmounts {
            burn,
            treasury,
            member_pool,
            protocol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split_of_100() {
        let amounts = FeeSplit::default().split(100).unwrap();
        assert_eq!(amounts.burn, 30);
        assert_eq!(amounts.treasury, 30);
        assert_eq!(amounts.member_pool, 30);
        assert_eq!(amounts.protocol, 10);
        assert_eq!(amounts.total(), 100);
    }

    #[test]
    fn test_remainder_goes_to_protocol() {
        let split = FeeSplit {
            burn_bps: 3_333,
            treasury_bps: 3_333,
            member_pool_bps: 3_333,
            protocol_bps: 1,
        };
        split.validate().unwrap();
        let amounts = split.split(101).unwrap();
        assert_eq!(amounts.burn, 33);
        assert_eq!(amounts.treasury, 33);
        assert_eq!(amounts.member_pool, 33);
        assert_eq!(amounts.protocol, 2);
        assert_eq!(amounts.total(), 101);
    }

    #[test]
    fn test_validate_sum() {
        let bad = FeeSplit {
            burn_bps: 3_000,
            treasury_bps: 3_000,
            member_pool_bps: 3_000,
            protocol_bps: 500,
        };
        assert_eq!(bad.validate(), Err(ValidationError::SplitSum { total: 9_500 }));
    }

    #[test]
    fn test_validate_percentage() {
        let bad = FeeSplit {
            burn_bps: 10_001,
            treasury_bps: 0,
            member_pool_bps: 0,
            protocol_bps: 0,
        };
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidPercentage { field: "burn_bps", .. })
        ));
    }
}
