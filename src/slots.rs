// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Hourly time-slot generation from garage opening hours
//!
//! A slot is an hour boundary (`"HH:00"`) usable as a reservation start or
//! end. Slots are local wall-clock values: no time zones, no sub-hour
//! granularity.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// First slot of the fallback sequence
pub const DEFAULT_OPENING_HOUR: u8 = 8;
/// Last slot of the fallback sequence
pub const DEFAULT_CLOSING_HOUR: u8 = 18;
/// Default length of the booking date window
pub const DEFAULT_BOOKING_WINDOW_DAYS: u32 = 30;

/// An hour boundary, `00:00` through `23:00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Slot at the given hour, if it is a valid hour of the day
    #[must_use]
    pub fn new(hour: u8) -> Option<Self> {
        (hour < 24).then_some(Self(hour))
    }

    /// Hour of this slot
    #[must_use]
    pub fn hour(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

/// Failure to read a wall-clock time string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockParseError {
    /// Empty string or a non-numeric component
    #[error("malformed time '{0}', expected HH:MM")]
    Malformed(String),
    /// Hour or minute outside the day
    #[error("time '{0}' is out of range")]
    OutOfRange(String),
}

/// Reads a wall-clock `HH:MM` string and returns its hour
fn parse_clock(s: &str) -> Result<u8, ClockParseError> {
    let malformed = || ClockParseError::Malformed(s.to_string());
    let mut parts = s.trim().split(':');

    let hour: u8 = parts
        .next()
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|p| p.parse().ok())
        .ok_or_else(malformed)?;

    let minute: u8 = match parts.next() {
        None => 0,
        Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => {
            p.parse().map_err(|_| malformed())?
        }
        Some(_) => return Err(malformed()),
    };

    // Seconds, if any, must still be numeric
    if parts.any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return Err(malformed());
    }

    if hour > 23 || minute > 59 {
        return Err(ClockParseError::OutOfRange(s.to_string()));
    }

    Ok(hour)
}

impl FromStr for TimeSlot {
    type Err = ClockParseError;

    /// Reads `HH:MM` and keeps the hour
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock(s).map(Self)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The fixed fallback sequence `08:00..=18:00`
#[must_use]
pub fn default_slots() -> Vec<TimeSlot> {
    (DEFAULT_OPENING_HOUR..=DEFAULT_CLOSING_HOUR).map(TimeSlot).collect()
}

/// Bookable slots from the opening hour through the closing hour inclusive
///
/// Minutes are ignored. Unreadable bounds, or a closing hour before the
/// opening hour, yield [`default_slots`].
#[must_use]
pub fn generate_time_slots(opening: &str, closing: &str) -> Vec<TimeSlot> {
    match (parse_clock(opening), parse_clock(closing)) {
        (Ok(open), Ok(close)) if open <= close => (open..=close).map(TimeSlot).collect(),
        (Ok(_), Ok(_)) => {
            debug!(opening, closing, "closing before opening, using default slots");
            default_slots()
        }
        (Err(e), _) | (_, Err(e)) => {
            debug!(opening, closing, error = %e, "unreadable garage hours, using default slots");
            default_slots()
        }
    }
}

/// Position of `slot` in the generated list
#[must_use]
pub fn slot_index(slots: &[TimeSlot], slot: TimeSlot) -> Option<usize> {
    slots.iter().position(|s| *s == slot)
}

/// Valid end choices for a chosen start: every slot strictly after it
///
/// Empty when `start` is not one of `slots`.
#[must_use]
pub fn end_slots_after(slots: &[TimeSlot], start: TimeSlot) -> &[TimeSlot] {
    match slot_index(slots, start) {
        Some(i) => &slots[i + 1..],
        None => &[],
    }
}

/// The dates a customer may pick: `days` consecutive days starting `today`
#[must_use]
pub fn bookable_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..u64::from(days))
        .map_while(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}
