// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file, then
//! `KARHEBTI_*` environment variables.

use crate::slots::DEFAULT_BOOKING_WINDOW_DAYS;
use crate::types::{DEFAULT_CLOSING, DEFAULT_OPENING};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "KARHEBTI";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the Karhebti REST API
    pub api_base_url: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// Connect and request timeout, in seconds
    pub request_timeout_secs: u64,
    /// How many days ahead a reservation may be booked
    pub booking_window_days: u32,
    /// Opening hour for garages with none on record
    pub default_opening: String,
    /// Closing hour for garages with none on record
    pub default_closing: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://10.0.2.2:3000/".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
            default_opening: DEFAULT_OPENING.to_string(),
            default_closing: DEFAULT_CLOSING.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Look up one key, rendered as plain text
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let table = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        Ok(table.get(key).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    /// Render the whole configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Per-user configuration file location
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "karhebti", "karhebti-slots")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from `path`, or from the per-user file if it exists
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = config::Config::builder();

    builder = match path {
        Some(p) => builder.add_source(config::File::from(p).format(config::FileFormat::Toml).required(true)),
        None => match default_config_path() {
            Some(p) => builder.add_source(config::File::from(p).format(config::FileFormat::Toml).required(false)),
            None => builder,
        },
    };

    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

    let settings = builder.build().context("Failed to read configuration")?;
    let config: Config = settings
        .try_deserialize()
        .context("Invalid configuration")?;

    tracing::debug!(api = %config.api_base_url, "configuration loaded");
    Ok(config)
}
