//! Registry-side directory of identity components.
//!
//! An identity's reference inside the registry is assigned here, never taken from the
//! identity itself. Components are told apart by their allocation: every clone of one
//! `Arc` maps to the same reference, a separately constructed component gets its own.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::identity::EthIdentity;
use crate::registry::key::derive_identity_reference;
use crate::types::Address;

struct Enrolled {
    reference: Address,
    // Keeps the allocation alive so its address is never handed to another component.
    _component: Arc<dyn EthIdentity>,
}

#[derive(Default)]
pub struct IdentityDirectory {
    by_allocation: HashMap<usize, Enrolled>,
    assigned: HashSet<Address>,
    enrollments: u64,
}

fn allocation(identity: &Arc<dyn EthIdentity>) -> usize {
    Arc::as_ptr(identity) as *const () as usize
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference already assigned to `identity`, if any.
    pub fn lookup(&self, identity: &Arc<dyn EthIdentity>) -> Option<Address> {
        self.by_allocation
            .get(&allocation(identity))
            .map(|entry| entry.reference)
    }

    /// Reference `identity` has, or would receive from [`bind`](Self::bind). Read-only.
    pub fn resolve(&self, identity: &Arc<dyn EthIdentity>) -> Address {
        self.lookup(identity)
            .unwrap_or_else(|| self.next_reference().1)
    }

    /// Assigns a reference to `identity` unless it already has one.
    pub fn bind(&mut self, identity: &Arc<dyn EthIdentity>) -> Address {
        if let Some(reference) = self.lookup(identity) {
            return reference;
        }
        let (enrollment, reference) = self.next_reference();
        self.enrollments = enrollment;
        self.assigned.insert(reference);
        self.by_allocation.insert(
            allocation(identity),
            Enrolled {
                reference,
                _component: Arc::clone(identity),
            },
        );
        reference
    }

    pub fn len(&self) -> usize {
        self.by_allocation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_allocation.is_empty()
    }

    /// Skips any derived value already in use, so references stay unique.
    fn next_reference(&self) -> (u64, Address) {
        let mut enrollment = self.enrollments;
        loop {
            enrollment = enrollment.wrapping_add(1);
            let reference = derive_identity_reference(enrollment);
            if !self.assigned.contains(&reference) {
                return (enrollment, reference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SimpleIdentity;

    fn component(name: &str) -> Arc<dyn EthIdentity> {
        Arc::new(SimpleIdentity::new(name, Address([0x10; 20])))
    }

    #[test]
    fn clones_share_a_reference_and_new_components_do_not() {
        let mut directory = IdentityDirectory::new();
        let a = component("a");
        let a_again = Arc::clone(&a);
        let lookalike = component("a");

        let predicted = directory.resolve(&a);
        assert_eq!(directory.lookup(&a), None);
        assert_eq!(directory.bind(&a), predicted);
        assert_eq!(directory.bind(&a_again), predicted);
        assert_eq!(directory.lookup(&a_again), Some(predicted));

        let other = directory.bind(&lookalike);
        assert_ne!(other, predicted);
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn references_follow_enrollment_order() {
        let mut directory = IdentityDirectory::new();
        assert!(directory.is_empty());
        assert_eq!(directory.bind(&component("first")), derive_identity_reference(1));
        assert_eq!(directory.bind(&component("second")), derive_identity_reference(2));
    }
}
