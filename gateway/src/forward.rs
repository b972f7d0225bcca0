// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Upstream forwarding.
//!
//! Relays an admitted request to the endpoint's `target_url` and streams the
//! upstream response back. Hop-by-hop headers are dropped in both directions,
//! redirects are relayed to the client rather than followed, and the outgoing
//! `Authorization` header is replaced when the gateway supplies a credential.

use axum::body::{Body, HttpBody};
use axum::http::header::{AUTHORIZATION, CONNECTION, HOST};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;
use reqwest::Url;
use reqwest::redirect::Policy;

use crate::constants::{HOP_BY_HOP_HEADERS, UPSTREAM_CONNECT_TIMEOUT, UPSTREAM_POOL_IDLE_TIMEOUT};
use crate::errors::AppError;
use crate::models::Endpoint;

/// Joins two path fragments with exactly one slash between them.
fn join_paths(base: &str, relative: &str) -> String {
    match (base.ends_with('/'), relative.starts_with('/')) {
        (true, true) => format!("{base}{}", relative.strip_prefix('/').unwrap_or(relative)),
        (false, false) => format!("{base}/{relative}"),
        _ => format!("{base}{relative}"),
    }
}

/// Builds the upstream URL: the target path joined with the relative path, and
/// the target query followed by the request query.
pub fn upstream_url(target: &Url, relative_path: &str, query: Option<&str>) -> Url {
    let mut url = target.clone();
    url.set_path(&join_paths(target.path(), relative_path));

    let query = match (target.query().filter(|q| !q.is_empty()), query.filter(|q| !q.is_empty())) {
        (Some(target_query), Some(query)) => Some(format!("{target_query}&{query}")),
        (Some(target_query), None) => Some(target_query.to_string()),
        (None, Some(query)) => Some(query.to_string()),
        (None, None) => None,
    };
    url.set_query(query.as_deref());
    url
}

/// Removes hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Pooled upstream client. Redirects are handed back to the caller.
    pub fn build_client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(UPSTREAM_CONNECT_TIMEOUT)
            .pool_idle_timeout(UPSTREAM_POOL_IDLE_TIMEOUT)
            .build()
    }

    /// Sends the request to `endpoint` and relays the response.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUpstreamRequest`] - the target URL cannot be parsed
    /// - [`AppError::Upstream`] - the upstream could not be reached or timed out
    #[tracing::instrument(skip(self, endpoint, parts, body, credential), fields(endpoint = %endpoint.name))]
    pub async fn forward(
        &self,
        endpoint: &Endpoint,
        relative_path: &str,
        parts: Parts,
        body: Body,
        credential: Option<HeaderValue>,
    ) -> Result<Response, AppError> {
        let target = Url::parse(&endpoint.target_url)
            .map_err(|e| AppError::InvalidUpstreamRequest(e.to_string()))?;
        let url = upstream_url(&target, relative_path, parts.uri.query());

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);
        if let Some(credential) = credential {
            headers.insert(AUTHORIZATION, credential);
        }

        tracing::debug!("[gateway] forwarding {} to {}", parts.method, url);

        let mut request = self.client.request(parts.method, url).headers(headers);
        if !body.is_end_stream() {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = request.send().await.map_err(|e| {
            tracing::error!("[gateway] upstream request for {} failed: {:?}", endpoint.name, e);
            AppError::Upstream(e)
        })?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        tracing::debug!("[gateway] upstream for {} returned {}", endpoint.name, status);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}
