// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::{
    DEFAULT_API_ROOT, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Gateway process options. The master key is not one of them: it is only read
/// from the `MASTER_KEY` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct GatewayOptions {
    #[arg(long, default_value = "0.0.0.0", env("GATEWAY_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("GATEWAY_HTTP_PORT"))]
    pub port: u16,
    /// Endpoint configuration file (YAML, or JSON when the name ends in `.json`)
    #[arg(long, default_value = "config.yaml", env("GATEWAY_CONFIG"))]
    pub config: PathBuf,
    /// First path segment of proxied routes: `/<api-root>/<endpoint>/...`
    #[arg(long, default_value = DEFAULT_API_ROOT, env("GATEWAY_API_ROOT"))]
    pub api_root: String,
    #[arg(long, default_value_t = DEFAULT_AUTH_TIMEOUT_SECS, env("GATEWAY_AUTH_TIMEOUT_SECS"))]
    pub auth_timeout_secs: u64,
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env("GATEWAY_REQUEST_TIMEOUT_SECS"))]
    pub request_timeout_secs: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env("GATEWAY_MAX_BODY_BYTES"))]
    pub max_body_bytes: usize,
}

impl GatewayOptions {
    /// The api root without surrounding slashes.
    pub fn api_root(&self) -> &str {
        self.api_root.trim_matches('/')
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GatewayOptions {
    fn default() -> Self {
        GatewayOptions {
            host: "127.0.0.1".to_string(),
            port: 0,
            config: PathBuf::from("config.yaml"),
            api_root: DEFAULT_API_ROOT.to_string(),
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
