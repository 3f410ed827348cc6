//! Document key and identity reference derivation.

use crate::types::{Address, DocumentKey};

const KEY_DOMAIN: &[u8] = b"esign/document-key/v1";
const REFERENCE_DOMAIN: &[u8] = b"esign/identity-ref/v1";

/// `DocumentKey` for the `sequence`-th document created in the registry, issued by `issuer`.
///
/// First 20 bytes of `blake3(domain || issuer || sequence_be)`. Distinct sequences
/// never repeat inside one registry, so keys are unique per registry.
pub fn derive_document_key(issuer: &Address, sequence: u64) -> DocumentKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(KEY_DOMAIN);
    hasher.update(issuer.as_bytes());
    hasher.update(&sequence.to_be_bytes());
    let digest = hasher.finalize();

    let mut key = [0u8; DocumentKey::LEN];
    key.copy_from_slice(&digest.as_bytes()[..DocumentKey::LEN]);
    DocumentKey(key)
}

/// Reference the registry hands to the `enrollment`-th identity component it meets.
pub fn derive_identity_reference(enrollment: u64) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(REFERENCE_DOMAIN);
    hasher.update(&enrollment.to_be_bytes());
    let digest = hasher.finalize();

    let mut reference = [0u8; Address::LEN];
    reference.copy_from_slice(&digest.as_bytes()[..Address::LEN]);
    Address(reference)
}
