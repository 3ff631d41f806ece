// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for booking validation and the backend client

use thiserror::Error;

/// A user-facing validation state that blocks submission
///
/// None of these are fatal: callers disable the submit action and show the
/// message next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No reservation date picked
    #[error("a reservation date is required")]
    MissingDate,
    /// No start slot picked
    #[error("a start time is required")]
    MissingStartTime,
    /// No end slot picked
    #[error("an end time is required")]
    MissingEndTime,
    /// End slot is not strictly after the start slot
    #[error("the end time must be after the start time")]
    InvalidRange,
    /// Empty service selection
    #[error("at least one service must be selected")]
    NoServicesSelected,
    /// The availability query answered with zero free bays
    #[error("no repair bay is free for this time window")]
    NoBaysAvailable,
    /// The availability query for the current window has not answered yet
    #[error("repair bay availability is still being checked")]
    AvailabilityPending,
    /// Lowering the bay count would strand active future reservations
    #[error("cannot reduce the number of bays: {0} active reservation(s) use the bays that would be removed")]
    BayReductionBlocked(usize),
    /// Requested bay count outside `1..=10`
    #[error("a garage must have between 1 and 10 repair bays, got {0}")]
    BayCountOutOfRange(u32),
    /// Backend failure message, passed through unchanged
    #[error("{0}")]
    Backend(String),
}

/// Failure talking to the Karhebti backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL cannot be used
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as configured or joined
        url: String,
        /// Parser message
        reason: String,
    },
    /// Connection, TLS or timeout failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx answer; `message` is the backend's own message when present
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code
        status: u16,
        /// Backend message or canonical reason
        message: String,
    },
    /// Body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Message suitable for showing to the user as-is
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
