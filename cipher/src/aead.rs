// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! AES-256-GCM sealing of at-rest secrets.
//!
//! Service passwords are stored in the gateway configuration in sealed form and
//! are only opened when a fresh token has to be requested from an auth API.
//!
//! # Wire Format
//!
//! ```text
//! base64( nonce (12 bytes) || ciphertext (N bytes) || tag (16 bytes) )
//! ```
//!
//! Standard base64 alphabet with padding, empty additional authenticated data.
//! Existing sealed values depend on this framing, so it must not change.
//!
//! # Security
//!
//! - A fresh nonce is drawn from the system CSPRNG for every seal operation
//! - Opened plaintext is returned in a [`Zeroizing`] container
//! - Errors never include key material or plaintext

use aws_lc_rs::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::constants::{NONCE_LEN, TAG_LEN};
use crate::errors::CipherError;
use crate::key::MasterKey;
use crate::utils::{base64_decode, base64_encode};

fn aead_key(key: &MasterKey) -> Result<LessSafeKey, CipherError> {
    let bytes = key.as_bytes();
    let unbound = UnboundKey::new(&AES_256_GCM, bytes).map_err(|_| CipherError::Key {
        expected: AES_256_GCM.key_len(),
        actual: bytes.len(),
    })?;
    Ok(LessSafeKey::new(unbound))
}

/// Seals `plaintext` and returns the base64 encoded `nonce || ciphertext || tag`.
///
/// # Errors
///
/// Returns an error if:
/// - The key is rejected by the cipher
/// - The system CSPRNG fails to produce a nonce
pub fn encrypt(key: &MasterKey, plaintext: &str) -> Result<String, CipherError> {
    let key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| CipherError::Random)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    sealed.extend_from_slice(&nonce_bytes);

    let mut in_out = Zeroizing::new(plaintext.as_bytes().to_vec());
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut *in_out,
    )
    .map_err(|_| CipherError::Authentication)?;
    sealed.extend_from_slice(&in_out);

    Ok(base64_encode(&sealed))
}

/// Opens a value produced by [`encrypt`].
///
/// # Errors
///
/// Returns an error if:
/// - The input is not valid base64 ([`CipherError::Decode`])
/// - The key is rejected by the cipher ([`CipherError::Key`])
/// - The decoded bytes cannot hold a nonce ([`CipherError::ShortCiphertext`])
/// - Integrity verification fails, e.g. tampered data or a different key
///   ([`CipherError::Authentication`])
/// - The plaintext is not UTF-8 ([`CipherError::Utf8`])
pub fn decrypt(key: &MasterKey, ciphertext_b64: &str) -> Result<Zeroizing<String>, CipherError> {
    let raw = base64_decode(ciphertext_b64)?;
    let key = aead_key(key)?;

    if raw.len() < NONCE_LEN {
        return Err(CipherError::ShortCiphertext {
            actual: raw.len(),
            required: NONCE_LEN,
        });
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce).map_err(|_| CipherError::ShortCiphertext {
        actual: raw.len(),
        required: NONCE_LEN,
    })?;

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out[..])
        .map_err(|_| CipherError::Authentication)?;

    let plaintext = std::str::from_utf8(plaintext).map_err(|_| CipherError::Utf8)?;

    Ok(Zeroizing::new(plaintext.to_string()))
}
