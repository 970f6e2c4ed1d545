// crates/templ-governance/src/action.rs
//
// The closed set of governance actions.
//
// A proposal carries exactly one `Action`. Payload checks that need nothing
// but the payload itself live here (`Action::validate`) and run both when a
// proposal is created and again when it executes. Checks that depend on
// ledger state (member counts, council membership, supported assets) are
// made by the ledger at the same two points.

use serde::{Deserialize, Serialize};

use templ_core::address::{Address, Asset};
use templ_core::error::ValidationError;
use templ_core::units::{check_bps, Amount, Bps};
use templ_economics::pricing::{PricingCurve, MAX_ENTRY_FEE, MIN_ENTRY_FEE};
use templ_economics::split::FeeSplit;

use crate::handlers::{HandlerRegistry, Resolution};

/// Maximum proposal title length, in characters.
pub const MAX_TITLE_LEN: usize = 256;
/// Maximum proposal description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 4_096;
/// Maximum home link length, in characters.
pub const MAX_HOME_LINK_LEN: usize = 2_048;
/// Maximum withdrawal reason length, in characters.
pub const MAX_REASON_LEN: usize = 256;

/// A governance action.
///
/// Externally tagged in JSON (`{"set_burn_address": {"address": "0x…"}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SetJoinPaused {
        paused: bool,
    },
    ChangeOperator {
        new_operator: Address,
    },
    /// 0 removes the cap.
    SetMaxMembers {
        limit: u64,
    },
    /// Withdraw `amount` of `asset`. For the access token only the treasury
    /// balance is reachable; for other assets only the unreserved balance.
    WithdrawTreasury {
        asset: Asset,
        recipient: Address,
        amount: Amount,
        #[serde(default)]
        reason: String,
    },
    /// Withdraw everything reachable of `asset`.
    WithdrawAllTreasury {
        asset: Asset,
        recipient: Address,
        #[serde(default)]
        reason: String,
    },
    /// Update the entry fee and/or the fee split. At least one must be set.
    UpdateConfig {
        #[serde(default)]
        entry_fee: Option<Amount>,
        #[serde(default)]
        fee_split: Option<FeeSplit>,
    },
    SetHomeLink {
        link: String,
    },
    /// Replace the pricing curve. Without `base_entry_fee` the current price
    /// becomes the new base.
    SetPricingCurve {
        curve: PricingCurve,
        #[serde(default)]
        base_entry_fee: Option<Amount>,
    },
    DisbandTreasury {
        asset: Asset,
    },
    AddCouncilMember {
        member: Address,
    },
    RemoveCouncilMember {
        member: Address,
    },
    SetCouncilMode {
        enabled: bool,
    },
    SetDictatorship {
        enabled: bool,
    },
    SetBurnAddress {
        address: Address,
    },
    SetQuorumBps {
        bps: Bps,
    },
    SetYesThresholdBps {
        bps: Bps,
    },
    SetInstantQuorumBps {
        bps: Bps,
    },
    SetPostQuorumDelay {
        seconds: u64,
    },
    SetProposalFeeBps {
        bps: Bps,
    },
    SetReferralShareBps {
        bps: Bps,
    },
    /// Resolved through the custom handler registry. `payload` is the
    /// handler's JSON document, kept as text so wide amounts survive intact.
    Custom {
        handler: String,
        #[serde(default)]
        payload: String,
    },
}

impl Action {
    /// Stable snake_case name, as used in records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetJoinPaused { .. } => "set_join_paused",
            Action::ChangeOperator { .. } => "change_operator",
            Action::SetMaxMembers { .. } => "set_max_members",
            Action::WithdrawTreasury { .. } => "withdraw_treasury",
            Action::WithdrawAllTreasury { .. } => "withdraw_all_treasury",
            Action::UpdateConfig { .. } => "update_config",
            Action::SetHomeLink { .. } => "set_home_link",
            Action::SetPricingCurve { .. } => "set_pricing_curve",
            Action::DisbandTreasury { .. } => "disband_treasury",
            Action::AddCouncilMember { .. } => "add_council_member",
            Action::RemoveCouncilMember { .. } => "remove_council_member",
            Action::SetCouncilMode { .. } => "set_council_mode",
            Action::SetDictatorship { .. } => "set_dictatorship",
            Action::SetBurnAddress { .. } => "set_burn_address",
            Action::SetQuorumBps { .. } => "set_quorum_bps",
            Action::SetYesThresholdBps { .. } => "set_yes_threshold_bps",
            Action::SetInstantQuorumBps { .. } => "set_instant_quorum_bps",
            Action::SetPostQuorumDelay { .. } => "set_post_quorum_delay",
            Action::SetProposalFeeBps { .. } => "set_proposal_fee_bps",
            Action::SetReferralShareBps { .. } => "set_referral_share_bps",
            Action::Custom { .. } => "custom",
        }
    }

    /// The only action accepted while dictator mode is on.
    pub fn is_dictatorship_toggle(&self) -> bool {
        matches!(self, Action::SetDictatorship { .. })
    }

    /// Check the payload on its own.
    ///
    /// # Errors
    /// The specific `ValidationError` for the first malformed field.
    /// `Custom` payloads are checked by their handler instead, see
    /// [`Action::resolve`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Action::ChangeOperator { new_operator } => new_operator.require_recipient(),
            Action::WithdrawTreasury {
                recipient,
                amount,
                reason,
                ..
            } => {
                recipient.require_recipient()?;
                if *amount == 0 {
                    return Err(ValidationError::InvalidCallData(
                        "withdrawal amount must be nonzero".into(),
                    ));
                }
                check_len("reason", reason, MAX_REASON_LEN)
            }
            Action::WithdrawAllTreasury {
                recipient, reason, ..
            } => {
                recipient.require_recipient()?;
                check_len("reason", reason, MAX_REASON_LEN)
            }
            Action::UpdateConfig {
                entry_fee,
                fee_split,
            } => {
                if entry_fee.is_none() && fee_split.is_none() {
                    return Err(ValidationError::InvalidCallData(
                        "update_config needs an entry fee or a fee split".into(),
                    ));
                }
                if let Some(fee) = entry_fee {
                    check_entry_fee(*fee)?;
                }
                if let Some(split) = fee_split {
                    split.validate()?;
                }
                Ok(())
            }
            Action::SetHomeLink { link } => check_len("home_link", link, MAX_HOME_LINK_LEN),
            Action::SetPricingCurve {
                curve,
                base_entry_fee,
            } => {
                curve.validate()?;
                if let Some(fee) = base_entry_fee {
                    check_entry_fee(*fee)?;
                }
                Ok(())
            }
            Action::AddCouncilMember { member } | Action::RemoveCouncilMember { member } => {
                member.require_recipient()
            }
            Action::SetBurnAddress { address } => address.require_recipient(),
            Action::SetQuorumBps { bps } => check_bps("quorum_bps", *bps),
            Action::SetYesThresholdBps { bps } => check_bps("yes_threshold_bps", *bps),
            Action::SetInstantQuorumBps { bps } => check_bps("instant_quorum_bps", *bps),
            Action::SetProposalFeeBps { bps } => check_bps("proposal_fee_bps", *bps),
            Action::SetReferralShareBps { bps } => check_bps("referral_share_bps", *bps),
            Action::SetJoinPaused { .. }
            | Action::SetMaxMembers { .. }
            | Action::DisbandTreasury { .. }
            | Action::SetCouncilMode { .. }
            | Action::SetDictatorship { .. }
            | Action::SetPostQuorumDelay { .. }
            | Action::Custom { .. } => Ok(()),
        }
    }

    /// Validate and resolve into what will actually run.
    ///
    /// Built-in actions resolve to themselves; `Custom` goes through its
    /// handler, which may itself yield a built-in action.
    pub fn resolve(&self, registry: &HandlerRegistry) -> Result<Resolution, ValidationError> {
        match self {
            Action::Custom { handler, payload } => registry.resolve(handler, payload),
            other => {
                other.validate()?;
                Ok(Resolution::Action(other.clone()))
            }
        }
    }
}

/// Entry fees must split into four buckets and stay below saturation.
pub fn check_entry_fee(fee: Amount) -> Result<(), ValidationError> {
    if fee < MIN_ENTRY_FEE {
        return Err(ValidationError::EntryFeeTooSmall {
            fee,
            minimum: MIN_ENTRY_FEE,
        });
    }
    if fee > MAX_ENTRY_FEE {
        return Err(ValidationError::EntryFeeTooLarge);
    }
    Ok(())
}

/// Reject text longer than `max` characters.
pub fn check_len(field: &'static str, text: &str, max: usize) -> Result<(), ValidationError> {
    if text.chars().count() > max {
        return Err(ValidationError::TextTooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tagging() {
        let action = Action::SetBurnAddress {
            address: Address::DEAD,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json["set_burn_address"]["address"],
            Address::DEAD.to_string()
        );
        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_wide_amounts_parse() {
        let text = r#"{"withdraw_treasury": {"asset": "native",
            "recipient": "0x000000000000000000000000000000000000dead",
            "amount": 100000000000000000000}}"#;
        let action: Action = serde_json::from_str(text).unwrap();
        match action {
            Action::WithdrawTreasury { amount, .. } => assert_eq!(amount, 100 * 10u128.pow(18)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_update_config_fee_minimum() {
        let action = Action::UpdateConfig {
            entry_fee: Some(5),
            fee_split: None,
        };
        assert_eq!(
            action.validate(),
            Err(ValidationError::EntryFeeTooSmall {
                fee: 5,
                minimum: MIN_ENTRY_FEE
            })
        );
        let empty = Action::UpdateConfig {
            entry_fee: None,
            fee_split: None,
        };
        assert!(matches!(
            empty.validate(),
            Err(ValidationError::InvalidCallData(_))
        ));
    }

    #[test]
    fn test_zero_recipients_rejected() {
        assert_eq!(
            Action::SetBurnAddress {
                address: Address::ZERO
            }
            .validate(),
            Err(ValidationError::InvalidRecipient)
        );
        assert_eq!(
            Action::WithdrawAllTreasury {
                asset: Asset::Native,
                recipient: Address::ZERO,
                reason: String::new(),
            }
            .validate(),
            Err(ValidationError::InvalidRecipient)
        );
    }

    #[test]
    fn test_bps_bounds() {
        assert!(Action::SetQuorumBps { bps: 10_000 }.validate().is_ok());
        assert!(matches!(
            Action::SetYesThresholdBps { bps: 10_001 }.validate(),
            Err(ValidationError::InvalidPercentage {
                field: "yes_threshold_bps",
                ..
            })
        ));
    }

    #[test]
    fn test_home_link_limit() {
        let link = "x".repeat(MAX_HOME_LINK_LEN + 1);
        assert_eq!(
            Action::SetHomeLink { link }.validate(),
            Err(ValidationError::TextTooLong {
                field: "home_link",
                max: MAX_HOME_LINK_LEN
            })
        );
    }

    #[test]
    fn test_only_dictatorship_toggle_is_flagged() {
        assert!(Action::SetDictatorship { enabled: false }.is_dictatorship_toggle());
        assert!(!Action::SetJoinPaused { paused: true }.is_dictatorship_toggle());
    }
}
