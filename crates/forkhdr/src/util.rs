//! Hex helpers for fields displayed in reverse byte order.

/// Hex-encodes `bytes` back to front, the display order of hashes and nonces.
pub fn to_reversed_hex(bytes: &[u8]) -> String {
    hex::encode(bytes.iter().rev().copied().collect::<Vec<u8>>())
}

/// Decodes display-order hex into a wire-order array of exactly `N` bytes.
pub fn reversed_array_from_hex<const N: usize>(hex: &str) -> Result<[u8; N], hex::FromHexError> {
    let mut bytes = [0u8; N];
    hex::decode_to_slice(hex, &mut bytes)?;
    bytes.reverse();
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_hex_round_trip() {
        let wire = [0x01, 0x02, 0x03, 0xff];
        let display = to_reversed_hex(&wire);
        assert_eq!(display, "ff030201");
        assert_eq!(reversed_array_from_hex::<4>(&display).unwrap(), wire);
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            reversed_array_from_hex::<4>("0102"),
            Err(hex::FromHexError::InvalidStringLength)
        );
        assert_eq!(
            reversed_array_from_hex::<2>("010"),
            Err(hex::FromHexError::OddLength)
        );
    }

    #[test]
    fn test_invalid_hex() {
        assert!(reversed_array_from_hex::<2>("zz00").is_err());
    }
}
