// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes. Stored in front of every sealed value.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes, appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Environment variable holding the process-wide master key.
pub const MASTER_KEY_ENV: &str = "MASTER_KEY";
