//! Centralized registry error types.

use thiserror::Error;

use crate::types::{Address, DocumentKey};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The presented identity did not confirm the caller within its call budget.
    #[error("Unauthorized: identity did not confirm caller {caller}")]
    Unauthorized { caller: Address },
    /// The identity already endorsed this document.
    #[error("Duplicate signature: {identity} already signed {key}")]
    DuplicateSignature { key: DocumentKey, identity: Address },
    /// No document is registered under the key.
    #[error("Document not found: {0}")]
    NotFound(DocumentKey),
    /// Signatory index at or past the current count.
    #[error("Signatory index {index} out of range for {key} ({count} signatories)")]
    IndexOutOfRange {
        key: DocumentKey,
        index: usize,
        count: usize,
    },
    /// Fatal: the ledger is in a state correct key derivation can never produce.
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
    #[error("Registry lock poisoned")]
    LockPoisoned,
}

/// Failures raised by an identity component while answering a registry call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Caller is not an owner of this identity")]
    NotOwner,
    /// The call exhausted the fuel granted to it.
    #[error("Call budget of {budget} units exhausted")]
    OutOfFuel { budget: u64 },
    #[error("Proof already recorded: {0}")]
    DuplicateProof(String),
    #[error("Proof not found: {0}")]
    ProofNotFound(String),
    #[error("Identity unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input validation errors for hex-encoded values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
