use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::error::IdentityError;
use crate::identity::{EthIdentity, Meter, Proof, ProofId};
use crate::types::{Address, IdentityName};

struct IdentityState {
    owners: HashSet<Address>,
    proofs: Vec<Proof>,
}

/// In-memory identity controlled by a set of owner addresses.
pub struct SimpleIdentity {
    name: IdentityName,
    state: Arc<RwLock<IdentityState>>,
}

impl SimpleIdentity {
    pub fn new(name: &str, owner: Address) -> Self {
        SimpleIdentity {
            name: IdentityName::from_str_padded(name),
            state: Arc::new(RwLock::new(IdentityState {
                owners: HashSet::from([owner]),
                proofs: Vec::new(),
            })),
        }
    }

    /// Grant control to another address. Only an existing owner may do this.
    pub fn add_owner(&self, caller: &Address, owner: Address) -> Result<(), IdentityError> {
        let mut state = self.write_state()?;
        if !state.owners.contains(caller) {
            return Err(IdentityError::NotOwner);
        }
        state.owners.insert(owner);
        Ok(())
    }

    /// Revoke control from an address. The last owner cannot be removed.
    pub fn remove_owner(&self, caller: &Address, owner: &Address) -> Result<(), IdentityError> {
        let mut state = self.write_state()?;
        if !state.owners.contains(caller) {
            return Err(IdentityError::NotOwner);
        }
        if state.owners.len() == 1 && state.owners.contains(owner) {
            return Err(IdentityError::Unavailable("cannot remove last owner".into()));
        }
        state.owners.remove(owner);
        Ok(())
    }

    pub fn proofs(&self) -> Result<Vec<Proof>, IdentityError> {
        Ok(self.read_state()?.proofs.clone())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, IdentityState>, IdentityError> {
        self.state
            .read()
            .map_err(|_| IdentityError::Unavailable("identity lock poisoned".into()))
    }

    fn write_state(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, IdentityState>, IdentityError> {
        self.state
            .write()
            .map_err(|_| IdentityError::Unavailable("identity lock poisoned".into()))
    }
}

impl EthIdentity for SimpleIdentity {
    fn add_proof(&self, caller: &Address, proof: Proof) -> Result<(), IdentityError> {
        let mut state = self.write_state()?;
        if !state.owners.contains(caller) {
            return Err(IdentityError::NotOwner);
        }
        if state.proofs.iter().any(|p| p.id == proof.id) {
            return Err(IdentityError::DuplicateProof(proof.id.0));
        }
        state.proofs.push(proof);
        Ok(())
    }

    fn remove_proof(&self, caller: &Address, proof_id: &ProofId) -> Result<(), IdentityError> {
        let mut state = self.write_state()?;
        if !state.owners.contains(caller) {
            return Err(IdentityError::NotOwner);
        }
        let before = state.proofs.len();
        state.proofs.retain(|p| &p.id != proof_id);
        if state.proofs.len() == before {
            return Err(IdentityError::ProofNotFound(proof_id.0.clone()));
        }
        Ok(())
    }

    fn check_owner(&self, candidate: &Address, meter: &mut Meter) -> Result<bool, IdentityError> {
        let state = self.read_state()?;
        // One unit per owner consulted.
        for owner in &state.owners {
            meter.charge(1)?;
            if owner == candidate {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_identity_name(&self, meter: &mut Meter) -> Result<IdentityName, IdentityError> {
        meter.charge(1)?;
        Ok(self.name)
    }
}
