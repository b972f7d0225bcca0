// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Per-endpoint access token cache.
//!
//! Tokens are obtained by POSTing the endpoint's username and decrypted
//! password to its auth API and are reused until
//! `issued_at + expires_in - 60s`. The cache lives for the process only.
//!
//! # Locking
//!
//! Every lookup and store goes through one async mutex. The lock is not held
//! while the auth API is called, so two requests for the same expired endpoint
//! may both refresh; the last stored token wins and both tokens are valid.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_cipher::{MasterKey, decrypt};
use tokio::sync::Mutex;
use zeroize::ZeroizeOnDrop;

use crate::clock::{Clock, SystemClock};
use crate::constants::{
    DEFAULT_TOKEN_TTL, MAX_AUTH_ERROR_BODY, MAX_TOKEN_TTL, TOKEN_REFRESH_BUFFER,
};
use crate::errors::TokenError;
use crate::models::{AuthRequest, AuthResponse, Endpoint};

#[derive(ZeroizeOnDrop)]
struct CachedCredential {
    token: String,
    #[zeroize(skip)]
    expires_at: Instant,
}

pub struct TokenCache {
    key: MasterKey,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
    cached: Mutex<HashMap<String, CachedCredential>>,
}

impl TokenCache {
    pub fn new(key: MasterKey, client: reqwest::Client) -> Self {
        Self::with_clock(key, client, Arc::new(SystemClock))
    }

    pub fn with_clock(key: MasterKey, client: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            key,
            client,
            clock,
            cached: Mutex::new(HashMap::new()),
        }
    }

    /// HTTP client for auth API calls. `timeout` bounds each whole exchange.
    pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(timeout).build()
    }

    /// Returns a cached token if it has not expired, otherwise fetches a fresh one.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Credential`] - the stored password could not be decrypted;
    ///   the auth API is not contacted
    /// - [`TokenError::AuthTransport`] - the auth API could not be reached
    /// - [`TokenError::AuthRejected`] - the auth API answered with a non-2xx status
    /// - [`TokenError::InvalidResponse`] - the success body did not carry a token
    #[tracing::instrument(skip(self, endpoint), fields(endpoint = %endpoint.name))]
    pub async fn get_token(&self, endpoint: &Endpoint) -> Result<String, TokenError> {
        // Fast path: cached token still valid
        {
            let cache = self.cached.lock().await;
            if let Some(cached) = cache.get(&endpoint.name) {
                if self.clock.now() < cached.expires_at {
                    return Ok(cached.token.clone());
                }
            }
        }

        // Slow path: exchange credentials with the auth API
        self.refresh(endpoint).await
    }

    async fn refresh(&self, endpoint: &Endpoint) -> Result<String, TokenError> {
        let (token, ttl) = self.exchange(endpoint).await?;

        let issued_at = self.clock.now();
        let expires_at = issued_at + ttl.min(MAX_TOKEN_TTL).saturating_sub(TOKEN_REFRESH_BUFFER);

        tracing::debug!(
            "[gateway] refreshed token for {}, expires in {:?}",
            endpoint.name,
            expires_at - issued_at
        );

        let mut cache = self.cached.lock().await;
        cache.insert(
            endpoint.name.clone(),
            CachedCredential {
                token: token.clone(),
                expires_at,
            },
        );

        Ok(token)
    }

    async fn exchange(&self, endpoint: &Endpoint) -> Result<(String, Duration), TokenError> {
        let not_configured = |field: &'static str| TokenError::NotConfigured {
            endpoint: endpoint.name.clone(),
            field,
        };
        let auth_api = endpoint
            .auth_api
            .as_deref()
            .ok_or_else(|| not_configured("auth_api"))?;
        let username = endpoint
            .username
            .as_deref()
            .ok_or_else(|| not_configured("username"))?;
        let sealed = endpoint
            .encrypted_password
            .as_deref()
            .ok_or_else(|| not_configured("password_enc"))?;

        let password = decrypt(&self.key, sealed).map_err(|source| TokenError::Credential {
            endpoint: endpoint.name.clone(),
            source,
        })?;

        let transport_error = |source: reqwest::Error| TokenError::AuthTransport {
            endpoint: endpoint.name.clone(),
            source,
        };

        let request = AuthRequest {
            username,
            password: password.as_str(),
        };
        let response = self
            .client
            .post(auth_api)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let shown = &body[..body.len().min(MAX_AUTH_ERROR_BODY)];
            return Err(TokenError::AuthRejected {
                endpoint: endpoint.name.clone(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(shown).into_owned(),
            });
        }

        let invalid_response = |reason: String| TokenError::InvalidResponse {
            endpoint: endpoint.name.clone(),
            reason,
        };

        let mut parsed: AuthResponse =
            serde_json::from_slice(&body).map_err(|e| invalid_response(e.to_string()))?;
        let Some(token) = parsed.take_token() else {
            return Err(invalid_response("missing or empty token".to_string()));
        };
        if axum::http::HeaderValue::from_str(&token).is_err() {
            return Err(invalid_response("token is not a valid header value".to_string()));
        }

        let ttl = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        Ok((token, ttl))
    }

    /// Drops the cached token for `name` so the next request exchanges again.
    pub async fn invalidate(&self, name: &str) -> bool {
        self.cached.lock().await.remove(name).is_some()
    }

    /// Number of endpoints with a cached token, expired or not.
    pub async fn len(&self) -> usize {
        self.cached.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cached.lock().await.is_empty()
    }
}
