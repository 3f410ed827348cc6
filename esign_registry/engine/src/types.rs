//! Shared data types for the document registry: addresses, fingerprints, derived keys,
//! and identity name tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::utils::parse::parse_fixed_hex;

macro_rules! hex_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed_hex::<{ $len }>(s).map($name)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

hex_bytes!(
    /// Controlling address of a caller, or the reference of an identity component.
    Address,
    20
);

hex_bytes!(
    /// Caller-supplied content fingerprint. Opaque; never validated.
    DocumentHash,
    32
);

hex_bytes!(
    /// Registry key derived from issuer + creation sequence.
    DocumentKey,
    20
);

hex_bytes!(
    /// Fixed-size display-name token reported by an identity.
    IdentityName,
    32
);

impl IdentityName {
    /// Builds a token from a string, truncating anything past 32 bytes.
    pub fn from_str_padded(name: &str) -> Self {
        let mut token = [0u8; 32];
        let bytes = name.as_bytes();
        let len = bytes.len().min(token.len());
        token[..len].copy_from_slice(&bytes[..len]);
        IdentityName(token)
    }

    /// Readable form: every non-zero byte in order, zero bytes treated as padding.
    pub fn to_display_string(&self) -> String {
        let kept: Vec<u8> = self.0.iter().copied().filter(|b| *b != 0).collect();
        String::from_utf8_lossy(&kept).into_owned()
    }
}

/// Name of a signatory as reported by its identity at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "name", rename_all = "snake_case")]
pub enum SignatoryName {
    Named(String),
    /// The identity could not answer within its call budget.
    Unavailable,
}

impl fmt::Display for SignatoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatoryName::Named(name) => f.write_str(name),
            SignatoryName::Unavailable => f.write_str("<unavailable>"),
        }
    }
}
