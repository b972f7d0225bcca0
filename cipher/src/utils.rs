// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use data_encoding::BASE64;

use crate::errors::CipherError;

#[inline]
pub fn base64_decode(input: &str) -> Result<Vec<u8>, CipherError> {
    BASE64
        .decode(input.trim().as_bytes())
        .map_err(|_| CipherError::Decode)
}

#[inline]
pub fn base64_encode(input: &[u8]) -> String {
    BASE64.encode(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_decode() {
        let actual = base64_decode("SFBLRQARAAIAAg==").unwrap();
        assert_eq!(actual, &[72, 80, 75, 69, 0, 17, 0, 2, 0, 2]);
    }

    #[test]
    fn test_base64_decode_ignores_surrounding_whitespace() {
        let actual = base64_decode("  aGVsbG8=\n").unwrap();
        assert_eq!(actual, b"hello");
    }

    #[test]
    fn test_base64_decode_rejects_url_safe_alphabet() {
        assert_eq!(base64_decode("-_-_"), Err(CipherError::Decode));
    }

    #[test]
    fn test_base64_decode_rejects_missing_padding() {
        assert_eq!(base64_decode("aGVsbG8"), Err(CipherError::Decode));
    }

    #[test]
    fn test_base64_encode_is_standard_padded() {
        assert_eq!(base64_encode(b"hello"), "aGVsbG8=");
    }
}
