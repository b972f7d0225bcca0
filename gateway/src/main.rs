// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use auth_gateway::application::{AppState, Application};
use auth_gateway::configuration::GatewayOptions;
use auth_gateway::store::CredentialStore;
use clap::Parser;
use gateway_cipher::MasterKey;
use gateway_cipher::constants::MASTER_KEY_ENV;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("[gateway] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    // get configuration options from arguments and environment variables
    let options = GatewayOptions::parse();

    tracing::info!("[gateway] {:?}", &options);

    let raw_key = Zeroizing::new(
        std::env::var(MASTER_KEY_ENV).with_context(|| format!("{MASTER_KEY_ENV} is not set"))?,
    );
    let key = MasterKey::try_from(raw_key.as_str())
        .with_context(|| format!("{MASTER_KEY_ENV} is not usable"))?;

    let store = CredentialStore::load(&options.config)
        .with_context(|| format!("failed to load {}", options.config.display()))?;

    for endpoint in store.endpoints() {
        let allowed: Vec<&str> = endpoint
            .allowlist
            .iter()
            .map(|rule| rule.path.as_str())
            .collect();
        tracing::info!(
            "[gateway] mapped /{}/{} -> {} (auth={:?}, allowed paths={:?})",
            options.api_root(),
            endpoint.name,
            endpoint.target_url,
            endpoint.auth_mode,
            allowed
        );
    }

    let state = AppState::new(options, Arc::new(store), key)?;
    let application = Application::build(state).await?;

    application.run_until_stopped().await?;
    Ok(())
}
