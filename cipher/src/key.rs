// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::KEY_LEN;
use crate::errors::CipherError;

/// The process-wide AES-256 master key.
///
/// The key bytes are never exposed through `Debug`, have no `Display`
/// implementation, and are zeroized when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Builds a key from raw bytes, which must be exactly [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CipherError::Key {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Keys are supplied as 32 character strings; the UTF-8 bytes are the key.
impl TryFrom<&str> for MasterKey {
    type Error = CipherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_bytes(value.as_bytes())
    }
}

// Custom Debug implementation to prevent accidental logging of key material
impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MasterKey").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_32_characters() {
        let key = MasterKey::try_from("12345678901234567890123456789012").unwrap();
        assert_eq!(key.as_bytes(), b"12345678901234567890123456789012");
    }

    #[test]
    fn test_rejects_short_key() {
        let err = MasterKey::try_from("too-short").unwrap_err();
        assert_eq!(
            err,
            CipherError::Key {
                expected: 32,
                actual: 9
            }
        );
    }

    #[test]
    fn test_rejects_long_key() {
        let err = MasterKey::from_bytes(&[7u8; 33]).unwrap_err();
        assert_eq!(
            err,
            CipherError::Key {
                expected: 32,
                actual: 33
            }
        );
    }

    #[test]
    fn test_key_error_does_not_echo_key() {
        let secret = "not-a-valid-key-but-still-secret";
        let err = MasterKey::try_from(&secret[..20]).unwrap_err();
        assert!(!err.to_string().contains(&secret[..20]));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = MasterKey::try_from("12345678901234567890123456789012").unwrap();
        let debug = format!("{key:?}");
        assert_eq!(debug, "MasterKey(\"[REDACTED]\")");
        assert!(!debug.contains("1234"));
    }
}
