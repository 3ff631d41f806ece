// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check command - validates a booking form without contacting the backend

use super::Output;
use crate::error::ValidationError;
use crate::slots::{generate_time_slots, TimeSlot};
use crate::validate::{duration_minutes, ReservationDraft};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Arguments for the check command
pub struct CheckArgs {
    /// Garage opening time
    pub opening: String,
    /// Garage closing time
    pub closing: String,
    /// Reservation day
    pub date: Option<NaiveDate>,
    /// Start slot
    pub start: Option<TimeSlot>,
    /// End slot
    pub end: Option<TimeSlot>,
    /// Selected service types
    pub services: Vec<String>,
}

#[derive(Serialize)]
struct CheckReport {
    valid: bool,
    duration_minutes: u32,
    errors: Vec<String>,
}

/// Run the check command
pub fn run(out: Output, args: CheckArgs) -> Result<()> {
    let slots = generate_time_slots(&args.opening, &args.closing);
    let draft = ReservationDraft {
        garage_id: String::new(),
        date: args.date,
        start: args.start,
        end: args.end,
        services: args.services,
        comment: None,
    };

    let errors = draft.form_errors(&slots);
    let report = CheckReport {
        valid: errors.is_empty(),
        duration_minutes: duration_minutes(&slots, draft.start, draft.end),
        errors: errors.iter().map(ToString::to_string).collect(),
    };

    if out.json {
        out.print_json(&report)?;
    } else if report.valid {
        println!("{} form is complete ({} min)", out.ok("ok"), report.duration_minutes);
    } else {
        for error in &report.errors {
            println!("{} {}", out.fail("x"), error);
        }
    }

    match errors.into_iter().next() {
        None => Ok(()),
        Some(first) => Err(invalid_form(first)),
    }
}

fn invalid_form(first: ValidationError) -> anyhow::Error {
    anyhow::Error::new(first).context("booking form is incomplete")
}
