//! Byte encodings shared by the password hasher and the token codec.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::{DecodeError, Engine};

/// Standard base64 with padding, the form stored password hashes use.
pub fn to_b64<T: AsRef<[u8]>>(bytes: T) -> String {
    STANDARD.encode(bytes)
}

pub fn from_b64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(encoded)
}

/// URL-safe base64 without padding, used for every token segment.
pub fn to_b64url<T: AsRef<[u8]>>(bytes: T) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn from_b64url(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD.decode(encoded)
}

/// Compares two byte slices without exiting early on the first mismatch.
///
/// The loop always walks the full length of the inputs, so the running time
/// depends only on the length and never on where the slices differ. Slices of
/// different length are unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"signature", b"signature"));
        assert!(!constant_time_eq(b"signature", b"signaturf"));
        assert!(!constant_time_eq(b"signature", b"sig"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_b64url_has_no_padding_or_unsafe_chars() {
        let encoded = to_b64url([0xfb, 0xff, 0xfe, 0x01]);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(from_b64url(&encoded).unwrap(), vec![0xfb, 0xff, 0xfe, 0x01]);
    }

    #[test]
    fn test_b64_keeps_padding() {
        assert_eq!(to_b64([1u8, 2]), "AQI=");
        assert!(from_b64("not base64!").is_err());
    }
}
