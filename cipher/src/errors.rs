// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Failures of the at-rest secret cipher.
///
/// None of the variants carry key material or plaintext, so they are safe to
/// log and to wrap into higher level errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("unable to base64 decode sealed value")]
    Decode,
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    Key { expected: usize, actual: usize },
    #[error("sealed value too short: {actual} bytes, need at least {required} for the nonce")]
    ShortCiphertext { actual: usize, required: usize },
    #[error("sealed value failed authentication")]
    Authentication,
    #[error("decrypted value is not valid UTF-8")]
    Utf8,
    #[error("unable to generate nonce")]
    Random,
}
