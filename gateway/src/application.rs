// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use axum::serve::Serve;
use gateway_cipher::MasterKey;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::configuration::GatewayOptions;
use crate::forward::Forwarder;
use crate::store::CredentialStore;
use crate::token_cache::TokenCache;
use crate::{router, routes};

pub struct AppState {
    pub options: GatewayOptions,
    pub store: Arc<CredentialStore>,
    pub tokens: Arc<TokenCache>,
    pub forwarder: Forwarder,
}

impl AppState {
    /// Builds the auth and upstream HTTP clients from `options`.
    pub fn new(
        options: GatewayOptions,
        store: Arc<CredentialStore>,
        key: MasterKey,
    ) -> Result<Self, reqwest::Error> {
        let client = TokenCache::build_client(options.auth_timeout())?;
        let tokens = Arc::new(TokenCache::new(key, client));
        Self::with_token_cache(options, store, tokens)
    }

    pub fn with_token_cache(
        options: GatewayOptions,
        store: Arc<CredentialStore>,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, reqwest::Error> {
        let forwarder = Forwarder::new(Forwarder::build_client()?);
        Ok(Self {
            options,
            store,
            tokens,
            forwarder,
        })
    }
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(state: AppState) -> Result<Self, std::io::Error> {
        let host = state.options.host.clone();
        let address = format!("{}:{}", host, state.options.port);
        let listener = TcpListener::bind(address).await?;
        let server = run(listener, state)?;
        let port = server.local_addr()?.port();

        tracing::info!("[gateway] listening at http://{}:{}", host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until ctrl-c, then lets in-flight requests finish.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.with_graceful_shutdown(shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[gateway] failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("[gateway] shutting down");
}

/// Builds the router with the same middleware used in production.
pub fn create_router(state: Arc<AppState>) -> Router {
    let proxy_route = match state.options.api_root() {
        "" => "/{*path}".to_string(),
        root => format!("/{root}/{{*path}}"),
    };
    let request_timeout = state.options.request_timeout();
    let max_body_bytes = state.options.max_body_bytes;

    Router::new()
        .route("/health", get(routes::health))
        .route("/endpoints", get(routes::get_endpoints))
        .route(&proxy_route, any(router::proxy))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

#[tracing::instrument(skip(listener, state))]
pub fn run(
    listener: TcpListener,
    state: AppState,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(Arc::new(state));
    Ok(axum::serve(listener, app))
}
