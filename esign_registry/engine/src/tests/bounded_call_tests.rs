use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{Behavior, ScriptedIdentity, addr, doc_hash, identity, registry};
use crate::error::{IdentityError, RegistryError};
use crate::identity::bounded::{fetch_name, verify_owner};
use crate::identity::{CallBudget, CallOutcome, EthIdentity, Meter, Proof, ProofId};
use crate::registry::DocumentRegistry;
use crate::types::{Address, IdentityName, SignatoryName};

fn tight_budget() -> CallBudget {
    CallBudget {
        timeout: Duration::from_millis(100),
        fuel: 20,
    }
}

#[tokio::test]
async fn honest_identity_is_verified() {
    let id = identity("alice", 100);
    assert_eq!(
        verify_owner(&id, &addr(100), tight_budget()).await,
        CallOutcome::Completed(true)
    );
    let denied = verify_owner(&id, &addr(101), tight_budget()).await;
    assert_eq!(denied, CallOutcome::Completed(false));
    assert!(!denied.verified());
}

#[tokio::test]
async fn slow_identity_times_out() {
    let id = ScriptedIdentity::shared(100, Behavior::Slow(Duration::from_millis(400)));
    let outcome = verify_owner(&id, &addr(100), tight_budget()).await;
    assert_eq!(outcome, CallOutcome::TimedOut);
    assert!(!outcome.verified());
}

#[tokio::test]
async fn panicking_identity_is_contained() {
    let id = ScriptedIdentity::shared(100, Behavior::Panic);
    assert_eq!(
        verify_owner(&id, &addr(100), tight_budget()).await,
        CallOutcome::Panicked
    );
}

#[tokio::test]
async fn fuel_exhaustion_fails_the_call() {
    let id = ScriptedIdentity::shared(100, Behavior::BurnFuel);
    assert_eq!(
        verify_owner(&id, &addr(100), tight_budget()).await,
        CallOutcome::Failed(IdentityError::OutOfFuel { budget: 20 })
    );
}

#[tokio::test]
async fn failing_name_lookup_is_unavailable_not_empty() {
    let id = ScriptedIdentity::shared(100, Behavior::Fail);
    assert_eq!(fetch_name(&id, tight_budget()).await, SignatoryName::Unavailable);

    let blank = identity("", 100);
    assert_eq!(
        fetch_name(&blank, tight_budget()).await,
        SignatoryName::Named(String::new())
    );
}

#[tokio::test]
async fn misbehaving_identities_cannot_register_or_sign() {
    let registry = DocumentRegistry::new(tight_budget(), 16);
    let key = registry
        .new_doc(&addr(100), doc_hash(1), identity("issuer", 100))
        .await
        .unwrap();

    let hostile = [
        Behavior::Slow(Duration::from_millis(400)),
        Behavior::Panic,
        Behavior::BurnFuel,
        Behavior::Fail,
    ];
    for behavior in hostile {
        let id = ScriptedIdentity::shared(200, behavior);
        let err = registry
            .new_doc(&addr(200), doc_hash(2), Arc::clone(&id))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));

        let err = registry.sign_doc(&addr(200), &key, id).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
    }

    assert_eq!(registry.document_count().unwrap(), 1);
    assert_eq!(registry.get_document(&key).unwrap().unwrap().signatory_count, 0);
    assert_eq!(registry.events().total(), 1);
}

#[tokio::test]
async fn signatory_with_broken_name_still_resolves() {
    let registry = registry();
    let key = registry
        .new_doc(&addr(100), doc_hash(1), identity("issuer", 100))
        .await
        .unwrap();

    // Name lookup breaks only after the signature is accepted.
    let flaky = Arc::new(FlakyName::default());
    let flaky_identity: Arc<dyn EthIdentity> = flaky.clone();
    registry
        .sign_doc(&addr(200), &key, Arc::clone(&flaky_identity))
        .await
        .unwrap();
    flaky.break_name();

    let view = registry.get_signatory(&key, 0).await.unwrap();
    assert_eq!(Some(view.identity), registry.reference_of(&flaky_identity).unwrap());
    assert_eq!(view.name, SignatoryName::Unavailable);
    assert_eq!(registry.get_document(&key).unwrap().unwrap().signatory_count, 1);
}

/// Honest identity whose name lookup can be switched off.
#[derive(Default)]
struct FlakyName {
    broken: AtomicBool,
}

impl FlakyName {
    fn break_name(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl EthIdentity for FlakyName {
    fn add_proof(&self, _caller: &Address, _proof: Proof) -> Result<(), IdentityError> {
        Ok(())
    }

    fn remove_proof(&self, _caller: &Address, _proof_id: &ProofId) -> Result<(), IdentityError> {
        Ok(())
    }

    fn check_owner(&self, candidate: &Address, meter: &mut Meter) -> Result<bool, IdentityError> {
        meter.charge(1)?;
        Ok(*candidate == addr(200))
    }

    fn get_identity_name(&self, _meter: &mut Meter) -> Result<IdentityName, IdentityError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("name service offline".into()));
        }
        Ok(IdentityName::from_str_padded("flaky"))
    }
}
