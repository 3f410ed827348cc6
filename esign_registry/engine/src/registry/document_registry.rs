//! Document registry:
//!     registers content fingerprints under derived document keys
//!     authenticates issuers and signatories through their own identity component
//!     keeps an append-only, ordered signatory list per document

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::events::{EventJournal, RegistryEvent};
use crate::identity::bounded::{fetch_name, verify_owner};
use crate::identity::{CallBudget, EthIdentity};
use crate::registry::directory::IdentityDirectory;
use crate::registry::key::derive_document_key;
use crate::types::{Address, DocumentHash, DocumentKey, SignatoryName};

/// One registered content fingerprint.
///
/// A record only exists inside the ledger once it has an issuer; an absent map entry
/// is the "document does not exist" state. Identity references are the ones the
/// directory assigned, never values reported by the identities.
struct DocumentRecord {
    hash: DocumentHash,
    issuer: Arc<dyn EthIdentity>,
    issuer_reference: Address,
    signatories: Vec<(Address, Arc<dyn EthIdentity>)>, // acceptance order
    signatory_presence: HashSet<Address>,
    created_at: DateTime<Utc>,
}

impl DocumentRecord {
    fn new(hash: DocumentHash, issuer: Arc<dyn EthIdentity>, issuer_reference: Address) -> Self {
        DocumentRecord {
            hash,
            issuer,
            issuer_reference,
            signatories: Vec::new(),
            signatory_presence: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    fn signatory_count(&self) -> usize {
        self.signatories.len()
    }

    fn has_signed(&self, identity: &Address) -> bool {
        self.signatory_presence.contains(identity)
    }

    /// Appends the signatory unless already present. Sequence and set move together.
    fn endorse(&mut self, reference: Address, identity: Arc<dyn EthIdentity>) -> bool {
        if !self.signatory_presence.insert(reference) {
            return false;
        }
        self.signatories.push((reference, identity));
        true
    }

    fn view(&self, key: DocumentKey) -> DocumentView {
        DocumentView {
            key,
            hash: self.hash,
            issuer: self.issuer_reference,
            signatory_count: self.signatory_count(),
            created_at: self.created_at,
        }
    }
}

/// Read model returned by [`DocumentRegistry::get_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentView {
    pub key: DocumentKey,
    pub hash: DocumentHash,
    pub issuer: Address,
    pub signatory_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Read model returned by [`DocumentRegistry::get_signatory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatoryView {
    pub identity: Address,
    pub name: SignatoryName,
}

/// Result of a committed creation.
struct Created {
    sequence: u64,
    key: DocumentKey,
    issuer: Address,
}

struct Ledger {
    documents: HashMap<DocumentKey, DocumentRecord>,
    identities: IdentityDirectory,
    creation_counter: u64,
    // Set by the first detected key collision; blocks every later write.
    corrupted: Option<String>,
}

impl Ledger {
    fn ensure_intact(&self) -> RegistryResult<()> {
        match &self.corrupted {
            Some(cause) => Err(RegistryError::InternalInvariantViolation(format!(
                "registry halted: {cause}"
            ))),
            None => Ok(()),
        }
    }

    /// Key for the next creation by `issuer`. Does not advance the counter.
    fn next_key(&mut self, issuer: &Address) -> RegistryResult<(u64, DocumentKey)> {
        let sequence = self.creation_counter.checked_add(1).ok_or_else(|| {
            RegistryError::InternalInvariantViolation("creation counter exhausted".into())
        })?;
        let key = derive_document_key(issuer, sequence);

        if self.documents.contains_key(&key) {
            error!(key = %key, sequence, issuer = %issuer, "derived document key already in use");
            let cause = format!("document key collision at {key} (sequence {sequence})");
            self.corrupted = Some(cause.clone());
            return Err(RegistryError::InternalInvariantViolation(cause));
        }
        Ok((sequence, key))
    }

    /// Writes a new record issued by `issuer`, optionally with the issuer as first
    /// signatory. Nothing changes on error.
    fn create(
        &mut self,
        hash: DocumentHash,
        issuer: Arc<dyn EthIdentity>,
        self_signed: bool,
    ) -> RegistryResult<Created> {
        self.ensure_intact()?;
        let reference = self.identities.resolve(&issuer);
        let (sequence, key) = self.next_key(&reference)?;

        let mut record = DocumentRecord::new(hash, Arc::clone(&issuer), reference);
        if self_signed {
            record.endorse(reference, Arc::clone(&issuer));
        }
        self.identities.bind(&issuer);
        self.creation_counter = sequence;
        self.documents.insert(key, record);
        Ok(Created {
            sequence,
            key,
            issuer: reference,
        })
    }

    /// Appends `identity` to the signatories of `key`. Returns its reference and the
    /// new signatory count.
    fn sign(
        &mut self,
        key: &DocumentKey,
        identity: Arc<dyn EthIdentity>,
    ) -> RegistryResult<(Address, usize)> {
        self.ensure_intact()?;
        let reference = self.identities.resolve(&identity);
        let record = self
            .documents
            .get_mut(key)
            .ok_or(RegistryError::NotFound(*key))?;

        if !record.endorse(reference, Arc::clone(&identity)) {
            debug!(key = %key, identity = %reference, "duplicate signature rejected");
            return Err(RegistryError::DuplicateSignature {
                key: *key,
                identity: reference,
            });
        }
        let count = record.signatory_count();
        self.identities.bind(&identity);
        Ok((reference, count))
    }
}

/// Central document registry (thread-safe, append-only).
///
/// State-changing operations authenticate first, with no lock held, then validate and
/// commit under a single write-lock acquisition. An identity that re-enters the
/// registry from inside its own check therefore sees the state as it was before the
/// outer operation.
pub struct DocumentRegistry {
    ledger: RwLock<Ledger>,
    events: EventJournal,
    budget: CallBudget,
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl DocumentRegistry {
    /// Create a new empty registry
    pub fn new(budget: CallBudget, event_capacity: usize) -> Self {
        DocumentRegistry {
            ledger: RwLock::new(Ledger {
                documents: HashMap::new(),
                identities: IdentityDirectory::new(),
                creation_counter: 0,
                corrupted: None,
            }),
            events: EventJournal::new(event_capacity),
            budget,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.call_budget(), config.event_capacity)
    }

    pub fn budget(&self) -> CallBudget {
        self.budget
    }

    pub fn events(&self) -> &EventJournal {
        &self.events
    }

    /// Reference the registry uses for `identity`, assigning one if it has none yet.
    ///
    /// Enrolment grants nothing: every operation still checks ownership.
    pub fn enroll(&self, identity: &Arc<dyn EthIdentity>) -> RegistryResult<Address> {
        Ok(self.write_ledger()?.identities.bind(identity))
    }

    pub fn reference_of(&self, identity: &Arc<dyn EthIdentity>) -> RegistryResult<Option<Address>> {
        Ok(self.read_ledger()?.identities.lookup(identity))
    }

    /// Register `hash` issued by `issuer`. `caller` must control the issuer identity.
    pub async fn new_doc(
        &self,
        caller: &Address,
        hash: DocumentHash,
        issuer: Arc<dyn EthIdentity>,
    ) -> RegistryResult<DocumentKey> {
        self.authorize(caller, &issuer).await?;

        let mut ledger = self.write_ledger()?;
        let created = ledger.create(hash, issuer, false)?;

        self.events.record(RegistryEvent::DocumentCreated { key: created.key });
        info!(key = %created.key, issuer = %created.issuer, sequence = created.sequence, "document registered");
        Ok(created.key)
    }

    /// Register `hash` and record `identity` as its first signatory in one step.
    pub async fn new_signed_doc(
        &self,
        caller: &Address,
        hash: DocumentHash,
        identity: Arc<dyn EthIdentity>,
    ) -> RegistryResult<DocumentKey> {
        self.authorize(caller, &identity).await?;

        let mut ledger = self.write_ledger()?;
        let Created { sequence, key, issuer } = ledger.create(hash, identity, true)?;

        self.events.record(RegistryEvent::DocumentCreated { key });
        self.events.record(RegistryEvent::DocumentSigned { key, identity: issuer });
        info!(key = %key, issuer = %issuer, sequence, "document registered and signed");
        Ok(key)
    }

    /// Endorse the document at `key` with `identity`. Each identity signs at most once.
    pub async fn sign_doc(
        &self,
        caller: &Address,
        key: &DocumentKey,
        identity: Arc<dyn EthIdentity>,
    ) -> RegistryResult<()> {
        self.authorize(caller, &identity).await?;

        let mut ledger = self.write_ledger()?;
        let (reference, count) = ledger.sign(key, identity)?;

        self.events.record(RegistryEvent::DocumentSigned {
            key: *key,
            identity: reference,
        });
        info!(key = %key, identity = %reference, signatories = count, "document signed");
        Ok(())
    }

    /// Hash, issuer and signatory count, or `None` if nothing is registered at `key`.
    pub fn get_document(&self, key: &DocumentKey) -> RegistryResult<Option<DocumentView>> {
        let ledger = self.read_ledger()?;
        Ok(ledger.documents.get(key).map(|record| record.view(*key)))
    }

    /// Signatory at `index` with the name its identity reports right now.
    ///
    /// The name is fetched after the read lock is released; an identity that cannot
    /// answer yields [`SignatoryName::Unavailable`] instead of an error.
    pub async fn get_signatory(&self, key: &DocumentKey, index: usize) -> RegistryResult<SignatoryView> {
        let (address, identity) = {
            let ledger = self.read_ledger()?;
            let record = ledger.documents.get(key).ok_or(RegistryError::NotFound(*key))?;
            let (address, identity) =
                record
                    .signatories
                    .get(index)
                    .ok_or(RegistryError::IndexOutOfRange {
                        key: *key,
                        index,
                        count: record.signatory_count(),
                    })?;
            (*address, Arc::clone(identity))
        };

        let name = fetch_name(&identity, self.budget).await;
        if name == SignatoryName::Unavailable {
            debug!(key = %key, index, identity = %address, "signatory name unavailable");
        }
        Ok(SignatoryView {
            identity: address,
            name,
        })
    }

    pub fn exists(&self, key: &DocumentKey) -> RegistryResult<bool> {
        Ok(self.read_ledger()?.documents.contains_key(key))
    }

    /// Signatory references in acceptance order.
    pub fn signatories(&self, key: &DocumentKey) -> RegistryResult<Option<Vec<Address>>> {
        let ledger = self.read_ledger()?;
        Ok(ledger
            .documents
            .get(key)
            .map(|record| record.signatories.iter().map(|(address, _)| *address).collect()))
    }

    /// Whether the identity with reference `identity` endorsed `key`.
    pub fn has_signed(&self, key: &DocumentKey, identity: &Address) -> RegistryResult<bool> {
        let ledger = self.read_ledger()?;
        Ok(ledger
            .documents
            .get(key)
            .is_some_and(|record| record.has_signed(identity)))
    }

    /// The issuer identity component of a document, for callers that want to query it.
    pub fn issuer_of(&self, key: &DocumentKey) -> RegistryResult<Option<Arc<dyn EthIdentity>>> {
        let ledger = self.read_ledger()?;
        Ok(ledger.documents.get(key).map(|record| Arc::clone(&record.issuer)))
    }

    pub fn document_count(&self) -> RegistryResult<usize> {
        Ok(self.read_ledger()?.documents.len())
    }

    /// Whether a detected key collision has halted all writes.
    pub fn is_corrupted(&self) -> RegistryResult<bool> {
        Ok(self.read_ledger()?.corrupted.is_some())
    }

    async fn authorize(&self, caller: &Address, identity: &Arc<dyn EthIdentity>) -> RegistryResult<()> {
        if verify_owner(identity, caller, self.budget).await.verified() {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized { caller: *caller })
        }
    }

    fn read_ledger(&self) -> RegistryResult<RwLockReadGuard<'_, Ledger>> {
        self.ledger.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write_ledger(&self) -> RegistryResult<RwLockWriteGuard<'_, Ledger>> {
        self.ledger.write().map_err(|_| RegistryError::LockPoisoned)
    }

    #[cfg(test)]
    pub(crate) fn force_creation_counter(&self, value: u64) {
        if let Ok(mut ledger) = self.ledger.write() {
            ledger.creation_counter = value;
        }
    }

    #[cfg(test)]
    pub(crate) fn creation_counter(&self) -> u64 {
        self.ledger.read().map(|l| l.creation_counter).unwrap_or_default()
    }
}
