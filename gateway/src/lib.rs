// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Auth Gateway
//!
//! An authenticating reverse proxy for internal APIs.
//!
//! Each configured endpoint maps `/api/<name>/...` onto an upstream base URL.
//! Requests are checked against the endpoint's allowlist, then forwarded with
//! an `Authorization` header obtained by exchanging the endpoint's service
//! account credentials with its auth API. Passwords are stored AES-256-GCM
//! encrypted under a master key from the `MASTER_KEY` environment variable.
//!
//! ## Architecture
//!
//! ```text
//! Client -> HTTP API -> allowlist -> token cache -> Upstream (this crate)
//!                                        |
//!                                        +-> Auth API (username + decrypted password)
//! ```
//!
//! ## Modules
//!
//! - [`access`]: Path-prefix and method allowlist checks
//! - [`application`]: HTTP server setup with Axum, body limits, and timeouts
//! - [`clock`]: Injectable monotonic clock for token expiry
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`errors`]: Error types with HTTP response mapping
//! - [`forward`]: Upstream URL construction and request forwarding
//! - [`models`]: Endpoint configuration and auth API types with validation
//! - [`router`]: Per-request orchestration of the proxied routes
//! - [`routes`]: Operational route handlers (health, endpoints)
//! - [`store`]: Endpoint configuration loading
//! - [`token_cache`]: Per-endpoint access token cache
//!
//! ## Usage
//!
//! ```bash
//! MASTER_KEY=... auth-gateway --port 8080 --config config.yaml
//! ```
//!
//! ## Security Considerations
//!
//! - Denied requests never trigger a token exchange or reach the upstream
//! - Any failure to obtain a credential fails the request closed
//! - Decrypted passwords and cached tokens are zeroized on drop
//! - Tokens are refreshed 60 seconds before they expire

pub mod access;
pub mod application;
pub mod clock;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod forward;
pub mod models;
pub mod router;
pub mod routes;
pub mod store;
pub mod token_cache;
