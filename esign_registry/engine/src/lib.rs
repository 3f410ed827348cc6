//! Document provenance registry core library.
//!
//! Records content fingerprints together with the identity that issued them, and the
//! ordered list of identities that endorse them afterwards. Identities are pluggable
//! components behind [`identity::EthIdentity`]; the registry re-verifies every claim
//! through a bounded call into the identity itself.

pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod logging;
pub mod registry;
pub mod types;
pub mod utils;

pub use config::RegistryConfig;
pub use error::{IdentityError, RegistryError, RegistryResult};
pub use events::{EventJournal, EventRecord, RegistryEvent};
pub use identity::{CallBudget, EthIdentity, Meter, SimpleIdentity};
pub use logging::init_logging;
pub use registry::{
    DocumentRegistry, DocumentView, SignatoryView, derive_document_key, derive_identity_reference,
};
pub use types::{Address, DocumentHash, DocumentKey, IdentityName, SignatoryName};

#[cfg(test)]
mod tests;
