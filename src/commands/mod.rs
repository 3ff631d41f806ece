// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod availability;
pub mod bays;
pub mod book;
pub mod check;
pub mod completions;
pub mod config;
pub mod dates;
pub mod slots;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

/// How command results are rendered on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    /// Emit JSON instead of text
    pub json: bool,
    /// Colour status marks
    pub color: bool,
}

impl Output {
    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{text}");
        Ok(())
    }

    /// Positive status mark
    #[must_use]
    pub fn ok(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    /// Negative status mark
    #[must_use]
    pub fn fail(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Advisory status mark
    #[must_use]
    pub fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Join slots or other displayable values with commas
pub(crate) fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
