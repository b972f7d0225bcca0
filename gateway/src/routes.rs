// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the gateway's own endpoints.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | GET | `/endpoints` | [`get_endpoints`] | List configured endpoints |
//! | ANY | `/<api-root>/<name>/*` | [`crate::router::proxy`] | Authenticated proxy |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::AppState;
use crate::models::EndpointSummary;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Lists configured endpoints in file order.
///
/// Only names, targets, auth modes and allowlists are returned. Usernames,
/// auth APIs and sealed passwords never leave the process.
#[tracing::instrument(skip(state))]
pub async fn get_endpoints(State(state): State<Arc<AppState>>) -> Json<Vec<EndpointSummary>> {
    Json(state.store.summaries())
}
