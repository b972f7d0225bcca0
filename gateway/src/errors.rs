// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gateway_cipher::CipherError;
use serde_json::json;

use crate::constants::ACCESS_DENIED_MESSAGE;

/// Failures while obtaining a credential for an endpoint.
///
/// Messages carry the endpoint name and the cause, never the password or a token.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("unable to decrypt password for {endpoint}: {source}")]
    Credential {
        endpoint: String,
        #[source]
        source: CipherError,
    },
    #[error("auth API request failed for {endpoint}: {source}")]
    AuthTransport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("auth API failed for {endpoint} with status {status}: {body}")]
    AuthRejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("invalid auth API response for {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
    #[error("endpoint {endpoint} is missing {field}")]
    NotConfigured {
        endpoint: String,
        field: &'static str,
    },
}

impl TokenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Credential { .. } | Self::NotConfigured { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::AuthTransport { source, .. } if source.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::AuthTransport { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::AuthRejected { .. } | Self::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Credential { .. } | Self::NotConfigured { .. } => {
                "Unable to load endpoint credentials"
            }
            Self::AuthTransport { .. } => "Auth API unavailable",
            Self::AuthRejected { .. } => "Auth API rejected the credential exchange",
            Self::InvalidResponse { .. } => "Auth API returned an invalid response",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("endpoint or method not allowed")]
    AccessDenied,
    #[error("endpoint not found: {0}")]
    EndpointNotFound(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
    #[error("invalid upstream target: {0}")]
    InvalidUpstreamRequest(String),
    #[error("internal server error")]
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // denials are plain text, everything else uses the JSON envelope
            Self::AccessDenied => {
                return (StatusCode::FORBIDDEN, ACCESS_DENIED_MESSAGE).into_response();
            }
            Self::EndpointNotFound(_) => (StatusCode::NOT_FOUND, "Endpoint not found"),
            Self::Token(err) => (err.status_code(), err.public_message()),
            Self::Upstream(err) if err.is_timeout() => {
                (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out")
            }
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "Bad Gateway"),
            Self::InvalidUpstreamRequest(_) | Self::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}
