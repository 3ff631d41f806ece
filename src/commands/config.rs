// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the effective configuration

use super::Output;
use crate::config::Config;
use anyhow::Result;

/// Run the config command
pub fn run(out: Output, config: &Config, key: Option<&str>) -> Result<()> {
    match key {
        Some(key) => {
            let value = config
                .get(key)?
                .ok_or_else(|| anyhow::anyhow!("Unknown or unset configuration key: {}", key))?;
            if out.json {
                out.print_json(&serde_json::json!({ key: value }))
            } else {
                println!("{value}");
                Ok(())
            }
        }
        None if out.json => out.print_json(config),
        None => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
