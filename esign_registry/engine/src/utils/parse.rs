use crate::error::ParseError;

/// Decodes a hex string into exactly `N` bytes.
///
/// Enforces:
/// - optional `0x` / `0X` prefix
/// - valid hex digits only
/// - decoded length is exactly `N`
pub fn parse_fixed_hex<const N: usize>(input: &str) -> Result<[u8; N], ParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes = hex::decode(digits).map_err(|e| ParseError::InvalidHex(e.to_string()))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| ParseError::WrongLength {
        expected: N,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_and_bare_hex() {
        let a: [u8; 2] = parse_fixed_hex("0xabcd").unwrap();
        let b: [u8; 2] = parse_fixed_hex("ABCD").unwrap();
        assert_eq!(a, [0xab, 0xcd]);
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = parse_fixed_hex::<4>("0xabcd").unwrap_err();
        assert_eq!(err, ParseError::WrongLength { expected: 4, actual: 2 });
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            parse_fixed_hex::<1>("zz"),
            Err(ParseError::InvalidHex(_))
        ));
    }
}
