// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Availability command - asks the backend which bays are free for a window

use super::Output;
use crate::availability::{AvailabilityCoordinator, AvailabilityKey, AvailabilityState};
use crate::client::BackendApi;
use crate::reconcile::check_capacity;
use crate::slots::TimeSlot;
use crate::types::RepairBay;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct AvailabilityReport<'a> {
    window: &'a AvailabilityKey,
    free_bays: &'a [RepairBay],
}

/// Run the availability command
pub async fn run(
    out: Output,
    api: Arc<dyn BackendApi>,
    garage_id: String,
    date: NaiveDate,
    start: TimeSlot,
    end: TimeSlot,
) -> Result<()> {
    info!("Checking availability for {} on {} {}-{}", garage_id, date, start, end);

    let key = AvailabilityKey { garage_id, date, start, end };
    let coordinator = AvailabilityCoordinator::new(api);
    coordinator.request(key.clone());
    let state = coordinator.settled().await;

    // Zero free bays and backend failures both end here
    check_capacity(&state)?;

    let bays = match &state {
        AvailabilityState::Ready { bays, .. } => bays.as_slice(),
        _ => &[],
    };

    if out.json {
        return out.print_json(&AvailabilityReport { window: &key, free_bays: bays });
    }

    println!("Free bays on {} {}-{} ({}):", key.date, key.start, key.end, bays.len());
    for bay in bays {
        println!("  {} #{} {}", out.ok("+"), bay.bay_number, bay.name);
    }
    Ok(())
}
