// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "api";
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600); // 1 hour when the auth API omits expires_in
pub const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(60); // refresh 60s before expiry
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024; // 10 MB
pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const UPSTREAM_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Body of the 403 returned when the allowlist rejects a request.
pub const ACCESS_DENIED_MESSAGE: &str = "Forbidden: endpoint or method not allowed";

/// Headers that only describe a single transport hop and are never forwarded.
/// https://www.rfc-editor.org/rfc/rfc9110#section-7.6.1
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

// Validation constants for endpoint configuration
pub const MAX_ENDPOINT_NAME_LENGTH: u64 = 128;
pub const MAX_USERNAME_LENGTH: u64 = 256;
pub const MAX_SEALED_PASSWORD_LENGTH: u64 = 8192;

/// Upper bound on an auth API provided lifetime.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60); // 30 days
/// Auth API error bodies are kept for diagnostics up to this many bytes.
pub const MAX_AUTH_ERROR_BODY: usize = 1024;
