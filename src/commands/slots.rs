// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Slots command - lists bookable hours and checks a start/end pick

use super::{join, Output};
use crate::slots::{end_slots_after, generate_time_slots, TimeSlot};
use crate::validate::{validate_range, SlotRange};
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct SlotsReport<'a> {
    slots: &'a [TimeSlot],
    #[serde(skip_serializing_if = "Option::is_none")]
    end_choices: Option<&'a [TimeSlot]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<SlotRange>,
}

/// Run the slots command
pub fn run(
    out: Output,
    opening: &str,
    closing: &str,
    start: Option<TimeSlot>,
    end: Option<TimeSlot>,
) -> Result<()> {
    let slots = generate_time_slots(opening, closing);
    debug!(opening, closing, count = slots.len(), "generated slots");

    let end_choices = start.map(|s| end_slots_after(&slots, s));
    let range = match (start, end) {
        (_, None) => None,
        (start, end) => Some(validate_range(&slots, start, end)?),
    };

    if out.json {
        return out.print_json(&SlotsReport {
            slots: &slots,
            end_choices,
            range,
        });
    }

    println!("Slots ({}): {}", slots.len(), join(&slots));
    if let (Some(start), Some(choices)) = (start, end_choices) {
        if choices.is_empty() {
            println!("No end time available after {start}");
        } else {
            println!("End times after {start}: {}", join(choices));
        }
    }
    if let Some(range) = range {
        println!(
            "{} {} -> {}: {} min",
            out.ok("ok"),
            range.start,
            range.end,
            range.duration_minutes
        );
    }

    Ok(())
}
