pub mod directory;
pub mod document_registry;
pub mod key;

pub use directory::IdentityDirectory;
pub use document_registry::{DocumentRegistry, DocumentView, SignatoryView};
pub use key::{derive_document_key, derive_identity_reference};
