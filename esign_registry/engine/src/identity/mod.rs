//! Identity capability consumed by the document registry.
//!
//! Any identity component can take part in the registry by implementing
//! [`EthIdentity`]. The registry only ever calls [`EthIdentity::check_owner`] and
//! [`EthIdentity::get_identity_name`], and always through the bounded call layer in
//! [`bounded`]; proof bookkeeping is part of the shared surface but stays the
//! identity's own business.

pub mod bounded;
pub mod simple;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IdentityError;
use crate::types::{Address, IdentityName};

pub use bounded::{CallBudget, CallOutcome};
pub use simple::SimpleIdentity;

/// Identifier of a proof attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofId(pub String);

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A claim the identity holds about itself (e.g. a linked account or attestation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub id: ProofId,
    pub claim: String,
    pub issued_at: DateTime<Utc>,
}

impl Proof {
    pub fn new(id: impl Into<String>, claim: impl Into<String>) -> Self {
        Proof {
            id: ProofId(id.into()),
            claim: claim.into(),
            issued_at: Utc::now(),
        }
    }
}

/// Computational budget granted to a single identity call.
///
/// Implementations charge units as they work; once the budget is spent every further
/// charge fails and the registry treats the call as unverified.
#[derive(Debug, Clone)]
pub struct Meter {
    budget: u64,
    used: u64,
}

impl Meter {
    pub fn new(budget: u64) -> Self {
        Meter { budget, used: 0 }
    }

    pub fn charge(&mut self, units: u64) -> Result<(), IdentityError> {
        let next = self.used.saturating_add(units);
        if next > self.budget {
            self.used = self.budget;
            return Err(IdentityError::OutOfFuel {
                budget: self.budget,
            });
        }
        self.used = next;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.budget - self.used
    }
}

/// Capability every participating identity must provide.
///
/// `check_owner` and `get_identity_name` must not mutate identity state. The registry
/// names a component by the reference it assigns on first use, so nothing here lets an
/// identity say who it is.
pub trait EthIdentity: Send + Sync {
    fn add_proof(&self, caller: &Address, proof: Proof) -> Result<(), IdentityError>;

    fn remove_proof(&self, caller: &Address, proof_id: &ProofId) -> Result<(), IdentityError>;

    /// Does `candidate` currently control this identity?
    fn check_owner(&self, candidate: &Address, meter: &mut Meter) -> Result<bool, IdentityError>;

    fn get_identity_name(&self, meter: &mut Meter) -> Result<IdentityName, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_refuses_charges_past_budget() {
        let mut meter = Meter::new(3);
        meter.charge(2).unwrap();
        assert_eq!(meter.remaining(), 1);
        assert_eq!(meter.charge(2), Err(IdentityError::OutOfFuel { budget: 3 }));
        assert_eq!(meter.remaining(), 0);
        assert!(meter.charge(1).is_err());
    }
}
