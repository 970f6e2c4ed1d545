// crates/templ-core/src/units.rs
//
// Monetary and proportional units used throughout the Templ ledger.
//
// All token accounting is integer base units (no floating point anywhere in
// the economic path). Proportions are expressed in basis points.

use crate::error::ValidationError;

/// Token amount in base units.
pub type Amount = u128;

/// Basis points: 1/100 of a percent. 10_000 bps = 100%.
pub type Bps = u16;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Basis points denominator.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Reject a bps value above 100%.
pub fn check_bps(field: &'static str, value: Bps) -> Result<(), ValidationError> {
    if value > BPS_DENOMINATOR {
        return Err(ValidationError::InvalidPercentage { field, value });
    }
    Ok(())
}

/// `amount * bps / 10_000`, floored. Returns `None` on overflow.
pub fn apply_bps(amount: Amount, bps: Bps) -> Option<Amount> {
    amount
        .checked_mul(bps as Amount)
        .map(|v| v / BPS_DENOMINATOR as Amount)
}

/// True when `part / whole >= bps / 10_000`, evaluated without division.
///
/// A zero `whole` never satisfies a nonzero threshold.
pub fn meets_bps(part: u64, whole: u64, bps: Bps) -> bool {
    if whole == 0 {
        return bps == 0;
    }
    (part as u128) * (BPS_DENOMINATOR as u128) >= (bps as u128) * (whole as u128)
}

/// Serde helpers for amounts written either as integers or as decimal
/// strings. TOML integers stop at `i64::MAX`, which is below common 18-decimal
/// token amounts, so configuration files may quote large values.
pub mod flexible_amount {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::Amount;

    /// Values that fit in a `u64` are written as integers, wider ones as
    /// strings, so every format can read them back.
    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*value) {
            Ok(small) => serializer.serialize_u64(small),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(v as Amount)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            Amount::try_from(v).map_err(|_| E::custom("amount must not be negative"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.trim()
                .replace('_', "")
                .parse::<Amount>()
                .map_err(|e| E::custom(format!("bad amount {:?}: {}", v, e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Fee {
        #[serde(with = "flexible_amount")]
        fee: Amount,
    }

    #[test]
    fn test_flexible_amount_forms() {
        let a: Fee = serde_json::from_str(r#"{"fee": 100}"#).unwrap();
        assert_eq!(a.fee, 100);
        let b: Fee = serde_json::from_str(r#"{"fee": "100_000000000000000000"}"#).unwrap();
        assert_eq!(b.fee, 100 * 10u128.pow(18));
        assert!(serde_json::from_str::<Fee>(r#"{"fee": -1}"#).is_err());
        let wide = serde_json::to_string(&Fee { fee: u128::MAX }).unwrap();
        assert_eq!(serde_json::from_str::<Fee>(&wide).unwrap().fee, u128::MAX);
    }

    #[test]
    fn test_check_bps_bounds() {
        assert!(check_bps("quorum_bps", 0).is_ok());
        assert!(check_bps("quorum_bps", 10_000).is_ok());
        assert!(check_bps("quorum_bps", 10_001).is_err());
    }

    #[test]
    fn test_apply_bps_floors() {
        assert_eq!(apply_bps(100, 3_000), Some(30));
        assert_eq!(apply_bps(99, 3_333), Some(32));
        assert_eq!(apply_bps(Amount::MAX, 2), None);
    }

    #[test]
    fn test_meets_bps_equality_passes() {
        // 3 of 5 is exactly 60%.
        assert!(meets_bps(3, 5, 6_000));
        assert!(!meets_bps(3, 4, 10_000));
        assert!(meets_bps(4, 4, 10_000));
    }

    #[test]
    fn test_meets_bps_empty_denominator() {
        assert!(!meets_bps(0, 0, 1));
        assert!(meets_bps(0, 0, 0));
    }
}
