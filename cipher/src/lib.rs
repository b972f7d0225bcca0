// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Gateway Cipher
//!
//! Sealing and opening of the service passwords that the authenticating
//! gateway keeps in its configuration file. See [`aead`] for the wire format.

pub mod aead;
pub mod constants;
pub mod errors;
pub mod key;
pub mod utils;

pub use aead::{decrypt, encrypt};
pub use errors::CipherError;
pub use key::MasterKey;
