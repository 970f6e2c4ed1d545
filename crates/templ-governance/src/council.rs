// crates/templ-governance/src/council.rs
//
// Council registry: the restricted voter set used while council mode is on.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use templ_core::address::Address;
use templ_core::error::StateError;

/// The council may never shrink below this many seats.
pub const MIN_COUNCIL_SIZE: usize = 1;

/// Set of council members plus the one-time operator bootstrap flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilRegistry {
    members: BTreeSet<Address>,
    bootstrap_consumed: bool,
}

impl CouncilRegistry {
    /// Create a council seeded with `initial` members.
    pub fn new(initial: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: initial.into_iter().collect(),
            bootstrap_consumed: false,
        }
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.members.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    pub fn bootstrap_consumed(&self) -> bool {
        self.bootstrap_consumed
    }

    /// # Errors
    /// `CouncilBootstrapConsumed` after the first bootstrap,
    /// `CouncilMemberExists` if `addr` already sits on the council.
    pub fn check_bootstrap(&self, addr: &Address) -> Result<(), StateError> {
        if self.bootstrap_consumed {
            return Err(StateError::CouncilBootstrapConsumed);
        }
        self.check_add(addr)
    }

    /// Seed a council member outside governance. Works exactly once.
    pub fn bootstrap(&mut self, addr: Address) -> Result<(), StateError> {
        self.check_bootstrap(&addr)?;
        self.members.insert(addr);
        self.bootstrap_consumed = true;
        Ok(())
    }

    pub fn check_add(&self, addr: &Address) -> Result<(), StateError> {
        if self.members.contains(addr) {
            return Err(StateError::CouncilMemberExists);
        }
        Ok(())
    }

    pub fn add(&mut self, addr: Address) -> Result<(), StateError> {
        self.check_add(&addr)?;
        self.members.insert(addr);
        Ok(())
    }

    /// # Errors
    /// `CouncilMemberMissing` if `addr` is not on the council,
    /// `CouncilMemberMinimum` if removing it would leave too few seats.
    pub fn check_remove(&self, addr: &Address) -> Result<(), StateError> {
        if !self.members.contains(addr) {
            return Err(StateError::CouncilMemberMissing);
        }
        if self.members.len() <= MIN_COUNCIL_SIZE {
            return Err(StateError::CouncilMemberMinimum);
        }
        Ok(())
    }

    pub fn remove(&mut self, addr: &Address) -> Result<(), StateError> {
        self.check_remove(addr)?;
        self.members.remove(addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_bootstrap_once() {
        let mut council = CouncilRegistry::new([addr("priest")]);
        council.bootstrap(addr("m1")).unwrap();
        assert_eq!(council.len(), 2);
        assert!(council.bootstrap_consumed());
        assert_eq!(
            council.bootstrap(addr("m2")),
            Err(StateError::CouncilBootstrapConsumed)
        );
        assert!(!council.contains(&addr("m2")));
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut council = CouncilRegistry::new([addr("a")]);
        assert_eq!(council.add(addr("a")), Err(StateError::CouncilMemberExists));
        council.add(addr("b")).unwrap();
        assert_eq!(council.len(), 2);
    }

    #[test]
    fn test_remove_keeps_minimum() {
        let mut council = CouncilRegistry::new([addr("a"), addr("b")]);
        assert_eq!(
            council.remove(&addr("z")),
            Err(StateError::CouncilMemberMissing)
        );
        council.remove(&addr("a")).unwrap();
        assert_eq!(
            council.remove(&addr("b")),
            Err(StateError::CouncilMemberMinimum)
        );
        assert!(council.contains(&addr("b")));
    }
}
