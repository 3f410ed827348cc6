mod bounded_call_tests;
mod key_derivation_tests;

use std::sync::Arc;
use std::time::Duration;

use crate::error::IdentityError;
use crate::identity::{CallBudget, EthIdentity, Meter, Proof, ProofId, SimpleIdentity};
use crate::registry::DocumentRegistry;
use crate::types::{Address, DocumentHash, IdentityName};

pub(crate) fn addr(b: u8) -> Address {
    Address([b; 20])
}

pub(crate) fn doc_hash(b: u8) -> DocumentHash {
    DocumentHash([b; 32])
}

/// Identity named `name` controlled by address `owner`.
pub(crate) fn identity(name: &str, owner: u8) -> Arc<dyn EthIdentity> {
    Arc::new(SimpleIdentity::new(name, addr(owner)))
}

pub(crate) fn registry() -> DocumentRegistry {
    DocumentRegistry::new(
        CallBudget {
            timeout: Duration::from_millis(500),
            fuel: 100,
        },
        64,
    )
}

/// How a [`ScriptedIdentity`] misbehaves.
#[derive(Clone, Copy)]
pub(crate) enum Behavior {
    Slow(Duration),
    Panic,
    BurnFuel,
    Fail,
}

/// Owner check answers truthfully for `owner` unless `behavior` says otherwise;
/// the same behavior applies to name lookups.
pub(crate) struct ScriptedIdentity {
    pub owner: Address,
    pub behavior: Behavior,
}

impl ScriptedIdentity {
    pub fn shared(owner: u8, behavior: Behavior) -> Arc<dyn EthIdentity> {
        Arc::new(ScriptedIdentity {
            owner: addr(owner),
            behavior,
        })
    }

    fn misbehave(&self, meter: &mut Meter) -> Result<(), IdentityError> {
        match self.behavior {
            Behavior::Slow(delay) => {
                std::thread::sleep(delay);
                Ok(())
            }
            Behavior::Panic => panic!("identity exploded"),
            Behavior::BurnFuel => loop {
                meter.charge(7)?;
            },
            Behavior::Fail => Err(IdentityError::Unavailable("backend down".into())),
        }
    }
}

impl EthIdentity for ScriptedIdentity {
    fn add_proof(&self, _caller: &Address, _proof: Proof) -> Result<(), IdentityError> {
        Err(IdentityError::NotOwner)
    }

    fn remove_proof(&self, _caller: &Address, _proof_id: &ProofId) -> Result<(), IdentityError> {
        Err(IdentityError::NotOwner)
    }

    fn check_owner(&self, candidate: &Address, meter: &mut Meter) -> Result<bool, IdentityError> {
        self.misbehave(meter)?;
        Ok(*candidate == self.owner)
    }

    fn get_identity_name(&self, meter: &mut Meter) -> Result<IdentityName, IdentityError> {
        self.misbehave(meter)?;
        Ok(IdentityName::from_str_padded("scripted"))
    }
}
