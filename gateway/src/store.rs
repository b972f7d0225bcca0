// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Endpoint configuration loaded once at startup.
//!
//! The [`CredentialStore`] owns every [`Endpoint`] and hands out shared,
//! read-only views. It never changes after construction, so request handlers
//! read it without any locking.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use validator::Validate;

use crate::models::{Endpoint, EndpointSummary, GatewayConfig};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint at index {index}: {reason}")]
    InvalidEndpoint { index: usize, reason: String },
    #[error("duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),
}

/// Parses a config document. JSON when `is_json`, YAML otherwise.
pub fn parse_config(contents: &str, is_json: bool) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = if is_json {
        serde_json::from_str(contents)?
    } else {
        serde_yaml::from_str(contents)?
    };
    Ok(config)
}

/// Reads a config file; files ending in `.json` are parsed as JSON, anything
/// else as YAML.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    parse_config(&contents, is_json)
}

/// Validated, immutable set of endpoints keyed by name.
#[derive(Debug, Default)]
pub struct CredentialStore {
    endpoints: HashMap<String, Arc<Endpoint>>,
    order: Vec<String>,
}

impl CredentialStore {
    /// Validates every endpoint and indexes them by name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An endpoint fails validation (empty name, bad URL, missing auth fields)
    /// - Two endpoints share a name
    pub fn from_config(config: GatewayConfig) -> Result<Self, ConfigError> {
        let mut endpoints = HashMap::with_capacity(config.endpoints.len());
        let mut order = Vec::with_capacity(config.endpoints.len());

        for (index, endpoint) in config.endpoints.into_iter().enumerate() {
            endpoint
                .validate()
                .map_err(|e| ConfigError::InvalidEndpoint {
                    index,
                    reason: e.to_string(),
                })?;

            if endpoints.contains_key(&endpoint.name) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name));
            }

            order.push(endpoint.name.clone());
            endpoints.insert(endpoint.name.clone(), Arc::new(endpoint));
        }

        Ok(Self { endpoints, order })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(load_config(path)?)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(name).cloned()
    }

    /// Endpoints in configuration file order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.order.iter().filter_map(|name| self.endpoints.get(name))
    }

    pub fn summaries(&self) -> Vec<EndpointSummary> {
        self.endpoints()
            .map(|endpoint| EndpointSummary::from(endpoint.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
