// crates/templ-economics/src/pricing.rs
//
// Dynamic entry pricing for the Templ ledger.
//
// The entry price is a pure function of the purchase counter (number of
// admissions since the curve was anchored) and the curve shape:
//   - Static:      constant.
//   - Linear:      p + p * rate * steps / 10_000.
//   - Exponential: p * (rate / 10_000)^steps, computed by square-and-multiply
//                  in bps fixed point.
// A curve is a primary segment followed by up to MAX_SEGMENTS additional
// segments. Each segment covers `length` counter values and starts from the
// price the previous segment ended on. Only the final segment may have length
// 0, which extends it indefinitely. If the final segment is finite, the price
// holds at its last value once the counter runs past it.

use serde::{Deserialize, Serialize};

use templ_core::error::ValidationError;
use templ_core::units::{Amount, BPS_DENOMINATOR};

/// Smallest entry fee that still splits into four nonzero-capable buckets.
pub const MIN_ENTRY_FEE: Amount = 10;

/// Prices saturate here instead of overflowing.
pub const MAX_ENTRY_FEE: Amount = u128::MAX / (BPS_DENOMINATOR as u128 * BPS_DENOMINATOR as u128);

/// Maximum number of segments after the primary one.
pub const MAX_SEGMENTS: usize = 8;

/// Growth style of one curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveStyle {
    Static,
    Linear,
    Exponential,
}

/// One segment of a pricing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub style: CurveStyle,
    /// Static: must be 0. Linear: bps of the segment's start price added per
    /// step. Exponential: per-step multiplier in bps (10_000 = flat).
    pub rate_bps: u32,
    /// Number of counter values covered. 0 = unbounded (final segment only).
    pub length: u64,
}

impl CurveSegment {
    pub const fn flat() -> Self {
        Self {
            style: CurveStyle::Static,
            rate_bps: 0,
            length: 0,
        }
    }
}

/// A full pricing curve: primary segment plus ordered additional segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCurve {
    pub primary: CurveSegment,
    #[serde(default)]
    pub additional: Vec<CurveSegment>,
}

impl Default for PricingCurve {
    fn default() -> Self {
        Self::flat()
    }
}

impl PricingCurve {
    /// A constant price.
    pub fn flat() -> Self {
        Self {
            primary: CurveSegment::flat(),
            additional: Vec::new(),
        }
    }

    /// Single-segment linear curve.
    pub fn linear(rate_bps: u32) -> Self {
        Self {
            primary: CurveSegment {
                style: CurveStyle::Linear,
                rate_bps,
                length: 0,
            },
            additional: Vec::new(),
        }
    }

    /// Single-segment exponential curve.
    pub fn exponential(rate_bps: u32) -> Self {
        Self {
            primary: CurveSegment {
                style: CurveStyle::Exponential,
                rate_bps,
                length: 0,
            },
            additional: Vec::new(),
        }
    }

    fn segments(&self) -> impl Iterator<Item = &CurveSegment> {
        std::iter::once(&self.primary).chain(self.additional.iter())
    }

    /// Validate the curve shape.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidCurve` if a static segment carries a
    /// rate, an exponential segment has a zero rate, a non-final segment has
    /// length 0, or there are too many segments.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.additional.len() > MAX_SEGMENTS {
            return Err(ValidationError::InvalidCurve(format!(
                "at most {} additional segments, got {}",
                MAX_SEGMENTS,
                self.additional.len()
            )));
        }
        let total = 1 + self.additional.len();
        for (i, seg) in self.segments().enumerate() {
            match seg.style {
                CurveStyle::Static if seg.rate_bps != 0 => {
                    return Err(ValidationError::InvalidCurve(format!(
                        "segment {} is static but has rate {}",
                        i, seg.rate_bps
                    )));
                }
                CurveStyle::Exponential if seg.rate_bps == 0 => {
                    return Err(ValidationError::InvalidCurve(format!(
                        "segment {} is exponential with zero rate",
                        i
                    )));
                }
                _ => {}
            }
            if seg.length == 0 && i + 1 < total {
                return Err(ValidationError::InvalidCurve(format!(
                    "only the final segment may be unbounded (segment {})",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Price after `counter` admissions, starting from `base`.
    ///
    /// Pure; never fails. Results saturate at `MAX_ENTRY_FEE`, and a
    /// decaying exponential segment never prices below `MIN_ENTRY_FEE`.
    pub fn price_at(&self, base: Amount, counter: u64) -> Amount {
        let mut price = base.min(MAX_ENTRY_FEE);
        let mut remaining = counter;
        for seg in self.segments() {
            if remaining == 0 {
                break;
            }
            let steps = if seg.length == 0 {
                remaining
            } else {
                remaining.min(seg.length)
            };
            price = apply_segment(seg, price, steps);
            remaining -= steps;
        }
        price
    }
}

fn apply_segment(seg: &CurveSegment, price: Amount, steps: u64) -> Amount {
    match seg.style {
        CurveStyle::Static => price,
        CurveStyle::Linear => {
            let growth = (seg.rate_bps as u128)
                .checked_mul(steps as u128)
                .and_then(|r| price.checked_mul(r))
                .map(|v| v / BPS_DENOMINATOR as u128);
            match growth.and_then(|g| price.checked_add(g)) {
                Some(p) => p.min(MAX_ENTRY_FEE),
                None => MAX_ENTRY_FEE,
            }
        }
        CurveStyle::Exponential => {
            let factor = pow_bps(seg.rate_bps as u128, steps);
            match price.checked_mul(factor) {
                Some(v) => (v / BPS_DENOMINATOR as u128).clamp(MIN_ENTRY_FEE, MAX_ENTRY_FEE),
                None => MAX_ENTRY_FEE,
            }
        }
    }
}

/// `(factor / 10_000)^exp` in bps fixed point, by repeated squaring.
///
/// The squared factor (and the running product) is clamped to at least 1 so
/// very small rates decay towards the smallest representable factor instead
/// of collapsing to zero. Intermediate results saturate at `MAX_ENTRY_FEE`.
pub fn pow_bps(factor_bps: u128, mut exp: u64) -> u128 {
    let one = BPS_DENOMINATOR as u128;
    let mut result = one;
    let mut base = factor_bps;
    while exp > 0 {
        if exp & 1 == 1 {
            result = match result.checked_mul(base) {
                Some(v) => (v / one).clamp(1, MAX_ENTRY_FEE),
                None => MAX_ENTRY_FEE,
            };
        }
        exp >>= 1;
        if exp > 0 {
            base = match base.checked_mul(base) {
                Some(v) => (v / one).clamp(1, MAX_ENTRY_FEE),
                None => MAX_ENTRY_FEE,
            };
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_curve_is_constant() {
        let curve = PricingCurve::flat();
        assert_eq!(curve.price_at(100, 0), 100);
        assert_eq!(curve.price_at(100, 1_000), 100);
    }

    #[test]
    fn test_linear_curve() {
        // +10% of base per admission.
        let curve = PricingCurve::linear(1_000);
        assert_eq!(curve.price_at(1_000, 0), 1_000);
        assert_eq!(curve.price_at(1_000, 1), 1_100);
        assert_eq!(curve.price_at(1_000, 5), 1_500);
    }

    #[test]
    fn test_exponential_curve_doubles() {
        let curve = PricingCurve::exponential(20_000);
        assert_eq!(curve.price_at(100, 0), 100);
        assert_eq!(curve.price_at(100, 1), 200);
        assert_eq!(curve.price_at(100, 3), 800);
        assert_eq!(curve.price_at(100, 10), 102_400);
    }

    #[test]
    fn test_exponential_decay_floors_at_min_fee() {
        // 50 bps squared is 0.25 bps, which would floor to zero.
        assert_eq!(pow_bps(50, 1), 50);
        assert_eq!(pow_bps(50, 2), 1);
        assert_eq!(pow_bps(50, 3), 1);
        let curve = PricingCurve::exponential(50);
        let p = curve.price_at(1_000_000_000_000_000_000, 1);
        assert_eq!(p, 5_000_000_000_000_000);
        // The squared factor stays at 1 bps instead of zero.
        let p4 = curve.price_at(1_000_000_000_000_000_000, 4);
        assert_eq!(p4, 100_000_000_000_000);
        // Decay stops at the smallest fee a join can split.
        assert_eq!(curve.price_at(10, 3), MIN_ENTRY_FEE);
        assert_eq!(curve.price_at(10_000, 40), MIN_ENTRY_FEE);
        let halving = PricingCurve::exponential(5_000);
        assert_eq!(halving.price_at(80, 2), 20);
        assert_eq!(halving.price_at(80, 3), MIN_ENTRY_FEE);
        assert_eq!(halving.price_at(80, 10), MIN_ENTRY_FEE);
    }

    #[test]
    fn test_exponential_saturates() {
        let curve = PricingCurve::exponential(30_000);
        assert_eq!(curve.price_at(1_000, 10_000), MAX_ENTRY_FEE);
    }

    #[test]
    fn test_tiered_segments_fall_through() {
        // Two admissions flat, then +50% per admission forever.
        let curve = PricingCurve {
            primary: CurveSegment {
                style: CurveStyle::Static,
                rate_bps: 0,
                length: 2,
            },
            additional: vec![CurveSegment {
                style: CurveStyle::Linear,
                rate_bps: 5_000,
                length: 0,
            }],
        };
        curve.validate().unwrap();
        assert_eq!(curve.price_at(100, 0), 100);
        assert_eq!(curve.price_at(100, 2), 100);
        assert_eq!(curve.price_at(100, 3), 150);
        assert_eq!(curve.price_at(100, 4), 200);
    }

    #[test]
    fn test_finite_final_segment_holds_price() {
        let curve = PricingCurve {
            primary: CurveSegment {
                style: CurveStyle::Exponential,
                rate_bps: 20_000,
                length: 2,
            },
            additional: Vec::new(),
        };
        curve.validate().unwrap();
        assert_eq!(curve.price_at(10, 2), 40);
        assert_eq!(curve.price_at(10, 50), 40);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let static_with_rate = PricingCurve {
            primary: CurveSegment {
                style: CurveStyle::Static,
                rate_bps: 5,
                length: 0,
            },
            additional: Vec::new(),
        };
        assert!(static_with_rate.validate().is_err());
        assert!(PricingCurve::exponential(0).validate().is_err());

        let unbounded_then_more = PricingCurve {
            primary: CurveSegment::flat(),
            additional: vec![CurveSegment::flat()],
        };
        assert!(unbounded_then_more.validate().is_err());

        let too_many = PricingCurve {
            primary: CurveSegment {
                style: CurveStyle::Static,
                rate_bps: 0,
                length: 1,
            },
            additional: vec![
                CurveSegment {
                    style: CurveStyle::Static,
                    rate_bps: 0,
                    length: 1
                };
                MAX_SEGMENTS + 1
            ],
        };
        assert!(too_many.validate().is_err());
    }
}
