// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};
use zeroize::ZeroizeOnDrop;

use crate::constants::{MAX_ENDPOINT_NAME_LENGTH, MAX_SEALED_PASSWORD_LENGTH, MAX_USERNAME_LENGTH};

/// How the gateway authenticates to an upstream service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Requests are forwarded without a gateway credential.
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Token <token>`
    Token,
}

impl AuthMode {
    /// The `Authorization` scheme for this mode, or `None` if no credential is attached.
    pub fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Bearer => Some("Bearer"),
            Self::Token => Some("Token"),
        }
    }

    pub fn requires_credential(&self) -> bool {
        self.scheme().is_some()
    }
}

/// A path prefix and the HTTP methods permitted below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedPath {
    pub path: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl AllowedPath {
    pub fn new(path: &str, methods: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// An upstream service fronted by the gateway.
///
/// Serde names follow the configuration file keys (`target_url`, `auth_type`,
/// `auth_api`, `password_enc`, `allowed`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_endpoint"))]
pub struct Endpoint {
    #[validate(length(min = 1, max = MAX_ENDPOINT_NAME_LENGTH))]
    #[validate(custom(function = "validate_endpoint_name"))]
    pub name: String,

    #[validate(url)]
    pub target_url: String,

    #[serde(rename = "auth_type", default)]
    pub auth_mode: AuthMode,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(url)]
    pub auth_api: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 1, max = MAX_USERNAME_LENGTH))]
    pub username: Option<String>,

    #[serde(rename = "password_enc", default, deserialize_with = "empty_as_none")]
    #[validate(length(min = 1, max = MAX_SEALED_PASSWORD_LENGTH))]
    pub encrypted_password: Option<String>,

    #[serde(rename = "allowed", default)]
    pub allowlist: Vec<AllowedPath>,
}

/// Configuration files use `""` for unset values; treat those as absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// Endpoint names are a single path segment: `/<api-root>/<name>/...`
fn validate_endpoint_name(name: &str) -> Result<(), ValidationError> {
    if name.trim() != name || name.contains('/') || name.contains('?') || name.contains('#') {
        return Err(ValidationError::new("invalid_endpoint_name"));
    }
    Ok(())
}

fn validate_endpoint(endpoint: &Endpoint) -> Result<(), ValidationError> {
    let target = Url::parse(&endpoint.target_url)
        .map_err(|_| ValidationError::new("invalid_target_url"))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(ValidationError::new("unsupported_target_scheme"));
    }

    if endpoint.auth_mode.requires_credential() {
        if endpoint.auth_api.is_none() {
            return Err(ValidationError::new("missing_auth_api"));
        }
        if endpoint.username.is_none() {
            return Err(ValidationError::new("missing_username"));
        }
        if endpoint.encrypted_password.is_none() {
            return Err(ValidationError::new("missing_password_enc"));
        }
    }
    Ok(())
}

/// Top level of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Public view of an endpoint for `GET /endpoints`. Never includes credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub name: String,
    pub target_url: String,
    pub auth_type: AuthMode,
    pub allowed: Vec<AllowedPath>,
}

impl From<&Endpoint> for EndpointSummary {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            name: endpoint.name.clone(),
            target_url: endpoint.target_url.clone(),
            auth_type: endpoint.auth_mode,
            allowed: endpoint.allowlist.clone(),
        }
    }
}

/// Body POSTed to an endpoint's auth API.
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for AuthRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Expected success body of an auth API.
///
/// The token is read from `token`, falling back to `access_token`. Other keys
/// are ignored.
#[derive(Deserialize, ZeroizeOnDrop)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,

    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl AuthResponse {
    /// Moves out the first non-empty of `token` and `access_token`.
    pub fn take_token(&mut self) -> Option<String> {
        [&mut self.token, &mut self.access_token]
            .into_iter()
            .find_map(|field| field.take().filter(|token| !token.is_empty()))
    }
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
