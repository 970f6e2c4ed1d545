// crates/templ-core/src/address.rs
//
// Account and asset identifiers for the Templ ledger.
//
// Addresses are opaque 20-byte identifiers. The ledger never derives them
// from keys (custody of signing keys lives outside this workspace); it only
// compares, stores, and renders them. `from_label` exists so fixtures and
// scripted sessions can name accounts by a human-readable label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// A 20-byte account identifier, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid recipient.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Conventional burn sink (`0x000000000000000000000000000000000000dead`).
    pub const DEAD: Address = Address([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ]);

    /// Derive a deterministic address from a label: the first 20 bytes of
    /// `sha256(label)`.
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    /// Returns true for `Address::ZERO`.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Reject the zero address as a recipient.
    pub fn require_recipient(&self) -> Result<(), ValidationError> {
        if self.is_zero() {
            return Err(ValidationError::InvalidRecipient);
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(trimmed)
            .map_err(|e| ValidationError::InvalidCallData(format!("bad address {}: {}", s, e)))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| {
            ValidationError::InvalidCallData(format!("address {} must be 20 bytes", s))
        })?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// An asset the ledger can hold: the chain's native coin or a token contract.
///
/// Serialized as a plain string (`"native"` or `"token:0x…"`) so assets can
/// key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Asset {
    /// The native coin (no token contract).
    Native,
    /// A fungible token identified by its contract address.
    Token(Address),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(addr) => write!(f, "token:{}", addr),
        }
    }
}

impl FromStr for Asset {
    type Err = ValidationError;

    /// Accepts `native`, `token:0x…`, or a bare token address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Asset::Native);
        }
        let addr = s.strip_prefix("token:").unwrap_or(s);
        Ok(Asset::Token(addr.parse()?))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Asset::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let addr = Address::from_label("alice");
        let rendered = addr.to_string();
        assert!(rendered.starts_with("0x"));
        assert_eq!(rendered.len(), 42);
        assert_eq!(rendered.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_from_label_is_deterministic() {
        assert_eq!(Address::from_label("bob"), Address::from_label("bob"));
        assert_ne!(Address::from_label("bob"), Address::from_label("carol"));
    }

    #[test]
    fn test_dead_address_rendering() {
        assert_eq!(
            Address::DEAD.to_string(),
            "0x000000000000000000000000000000000000dead"
        );
    }

    #[test]
    fn test_zero_is_not_a_recipient() {
        assert!(Address::ZERO.require_recipient().is_err());
        assert!(Address::DEAD.require_recipient().is_ok());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not-hex".parse::<Address>().is_err());
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let addr = Address::from_label("dave");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_asset_string_forms() {
        let token = Asset::Token(Address::from_label("usdc"));
        let json = serde_json::to_string(&token).unwrap();
        assert!(json.starts_with("\"token:0x"));
        assert_eq!(serde_json::from_str::<Asset>(&json).unwrap(), token);
        assert_eq!("native".parse::<Asset>().unwrap(), Asset::Native);
        let bare = Address::from_label("usdc").to_string();
        assert_eq!(bare.parse::<Asset>().unwrap(), token);
    }

    #[test]
    fn test_asset_keys_json_maps() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Asset::Native, 1u64);
        map.insert(Asset::Token(Address::DEAD), 2u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Asset, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
