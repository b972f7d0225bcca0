// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Per-request orchestration for proxied routes.
//!
//! # Request Flow
//!
//! 1. Resolve the endpoint from `/<api-root>/<name>` and strip that prefix
//! 2. Check the relative path and method against the endpoint allowlist;
//!    denied requests, including any path with dot segments, end here with a
//!    403 and nothing is sent upstream
//! 3. For `bearer` and `token` endpoints, get a token from the [`TokenCache`];
//!    any failure ends the request with a 5xx and nothing is sent upstream
//! 4. Attach the `Authorization` header and forward to the upstream

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::response::Response;

use crate::access::is_allowed;
use crate::application::AppState;
use crate::errors::AppError;
use crate::models::Endpoint;
use crate::token_cache::TokenCache;

/// Splits `/<api_root>/<name>[/<rest>]` into `(name, "/<rest>")`.
///
/// The relative path is empty when the request targets the endpoint root
/// without a trailing slash.
pub fn split_route<'a>(path: &'a str, api_root: &str) -> Option<(&'a str, &'a str)> {
    let mut rest = path.strip_prefix('/')?;
    if !api_root.is_empty() {
        rest = rest.strip_prefix(api_root)?.strip_prefix('/')?;
    }

    let (name, relative_path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };

    if name.is_empty() {
        return None;
    }
    Some((name, relative_path))
}

/// The `Authorization` value for `endpoint`, or `None` for `auth_type: none`.
pub async fn authorization_header(
    tokens: &TokenCache,
    endpoint: &Endpoint,
) -> Result<Option<HeaderValue>, AppError> {
    let Some(scheme) = endpoint.auth_mode.scheme() else {
        return Ok(None);
    };

    let token = tokens.get_token(endpoint).await.map_err(|e| {
        tracing::error!("[gateway] auth error for {}: {}", endpoint.name, e);
        e
    })?;

    let mut value = HeaderValue::try_from(format!("{scheme} {token}")).map_err(|_| {
        tracing::error!("[gateway] token for {} is not a valid header value", endpoint.name);
        AppError::InternalServerError
    })?;
    value.set_sensitive(true);

    Ok(Some(value))
}

/// Handler for every route below `/<api-root>/`.
///
/// # Errors
///
/// - [`AppError::EndpointNotFound`] - no endpoint with that name
/// - [`AppError::AccessDenied`] - the allowlist rejected the path/method
/// - [`AppError::Token`] - no credential could be obtained (fail closed)
/// - [`AppError::Upstream`] - the upstream could not be reached
#[tracing::instrument(skip(state, request), fields(method = %request.method(), path = %request.uri().path()))]
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    // 1. Resolve the endpoint and strip the routing prefix
    let (name, relative_path) = split_route(&path, state.options.api_root())
        .ok_or_else(|| AppError::EndpointNotFound(path.clone()))?;
    let endpoint = state
        .store
        .get(name)
        .ok_or_else(|| AppError::EndpointNotFound(name.to_string()))?;

    // 2. Admission
    if !is_allowed(&endpoint, relative_path, parts.method.as_str()) {
        tracing::info!(
            "[gateway] denied {} {} for {}",
            parts.method,
            relative_path,
            endpoint.name
        );
        return Err(AppError::AccessDenied);
    }

    // 3. Credential
    let credential = authorization_header(&state.tokens, &endpoint).await?;

    // 4. Forward
    state
        .forwarder
        .forward(&endpoint, relative_path, parts, body, credential)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_route() {
        assert_eq!(split_route("/api/svc1/data", "api"), Some(("svc1", "/data")));
        assert_eq!(
            split_route("/api/svc1/users/1/orders", "api"),
            Some(("svc1", "/users/1/orders"))
        );
        assert_eq!(split_route("/api/svc1/", "api"), Some(("svc1", "/")));
        assert_eq!(split_route("/api/svc1", "api"), Some(("svc1", "")));
    }

    #[test]
    fn test_split_route_rejects_other_roots() {
        assert_eq!(split_route("/health", "api"), None);
        assert_eq!(split_route("/apix/svc1/data", "api"), None);
        assert_eq!(split_route("/api/", "api"), None);
        assert_eq!(split_route("/api//data", "api"), None);
    }

    #[test]
    fn test_split_route_empty_root() {
        assert_eq!(split_route("/svc1/data", ""), Some(("svc1", "/data")));
        assert_eq!(split_route("/", ""), None);
    }

    #[test]
    fn test_split_route_nested_root() {
        assert_eq!(
            split_route("/proxy/v1/svc1/data", "proxy/v1"),
            Some(("svc1", "/data"))
        );
    }
}
