use std::collections::HashSet;

use proptest::prelude::*;

use crate::registry::derive_document_key;
use crate::types::{Address, IdentityName};

#[test]
fn ten_thousand_sequential_creations_never_collide() {
    let mut seen = HashSet::with_capacity(10_000);
    for sequence in 1..=10_000u64 {
        // issuers rotate so neighbouring sequences come from different parties
        let mut issuer = [0u8; 20];
        issuer[..8].copy_from_slice(&(sequence % 97).to_be_bytes());
        let key = derive_document_key(&Address(issuer), sequence);
        assert!(seen.insert(key), "collision at sequence {sequence}");
    }
}

#[test]
fn derivation_is_deterministic_and_issuer_bound() {
    let a = Address([1; 20]);
    let b = Address([2; 20]);
    assert_eq!(derive_document_key(&a, 5), derive_document_key(&a, 5));
    assert_ne!(derive_document_key(&a, 5), derive_document_key(&b, 5));
    assert_ne!(derive_document_key(&a, 5), derive_document_key(&a, 6));
}

proptest! {
    /// Distinct sequences give distinct keys whatever the issuers are.
    #[test]
    fn distinct_sequences_give_distinct_keys(
        issuers in prop::collection::vec(any::<[u8; 20]>(), 1..200),
    ) {
        let mut seen = HashSet::new();
        for (i, issuer) in issuers.iter().enumerate() {
            let key = derive_document_key(&Address(*issuer), i as u64 + 1);
            prop_assert!(seen.insert(key));
        }
    }

    /// Display keeps every non-zero byte in order, wherever the zeros sit.
    #[test]
    fn name_display_keeps_non_zero_ascii_bytes(
        raw in prop::collection::vec(prop_oneof![Just(0u8), 0x20u8..0x7f], 32),
    ) {
        let mut token = [0u8; 32];
        token.copy_from_slice(&raw);
        let expected: String = raw.iter().filter(|b| **b != 0).map(|b| *b as char).collect();
        prop_assert_eq!(IdentityName(token).to_display_string(), expected);
    }
}

#[test]
fn name_token_padding_and_truncation() {
    let mut token = [0u8; 32];
    token[0] = b'a';
    token[5] = b'b';
    token[31] = b'c';
    assert_eq!(IdentityName(token).to_display_string(), "abc");
    assert_eq!(IdentityName([0; 32]).to_display_string(), "");

    let long = "x".repeat(40);
    assert_eq!(IdentityName::from_str_padded(&long).to_display_string().len(), 32);
}
