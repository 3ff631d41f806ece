// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Book command - validates a reservation against the backend and submits it

use super::{join, Output};
use crate::availability::{AvailabilityCoordinator, AvailabilityKey};
use crate::client::BackendApi;
use crate::config::Config;
use crate::error::ValidationError;
use crate::reconcile::check_capacity;
use crate::slots::{generate_time_slots, TimeSlot};
use crate::validate::{duration_minutes, quote_services, ReservationDraft};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for the book command
pub struct BookArgs {
    /// Garage to book
    pub garage_id: String,
    /// Reservation day
    pub date: NaiveDate,
    /// Start slot
    pub start: TimeSlot,
    /// End slot
    pub end: TimeSlot,
    /// Selected service types
    pub services: Vec<String>,
    /// Comment for the garage
    pub comment: Option<String>,
    /// Validate only, do not create the reservation
    pub dry_run: bool,
}

#[derive(Serialize)]
struct BookReport {
    garage_id: String,
    date: NaiveDate,
    start: TimeSlot,
    end: TimeSlot,
    duration_minutes: u32,
    estimated_minutes: u32,
    estimated_cost: f64,
    free_bays: usize,
    reservation_id: Option<String>,
}

/// Run the book command
pub async fn run(out: Output, api: Arc<dyn BackendApi>, config: &Config, args: BookArgs) -> Result<()> {
    info!("Booking garage {} on {} {}-{}", args.garage_id, args.date, args.start, args.end);

    let garage = api
        .get_garage(&args.garage_id)
        .await
        .with_context(|| format!("Failed to load garage {}", args.garage_id))?;
    let services = api
        .get_services_by_garage(&args.garage_id)
        .await
        .with_context(|| format!("Failed to load services of garage {}", args.garage_id))?;

    let opening = garage.opening.as_deref().unwrap_or(&config.default_opening);
    let closing = garage.closing.as_deref().unwrap_or(&config.default_closing);
    let slots = generate_time_slots(opening, closing);

    let draft = ReservationDraft {
        garage_id: args.garage_id.clone(),
        date: Some(args.date),
        start: Some(args.start),
        end: Some(args.end),
        services: args.services,
        comment: args.comment,
    };

    // No point asking for bays when the form itself is wrong
    if let Some(first) = draft.form_errors(&slots).into_iter().next() {
        return Err(anyhow::Error::new(first).context(format!(
            "Garage '{}' takes reservations at {}",
            garage.name,
            join(&slots)
        )));
    }

    let coordinator = AvailabilityCoordinator::new(Arc::clone(&api));
    coordinator.request(AvailabilityKey {
        garage_id: args.garage_id.clone(),
        date: args.date,
        start: args.start,
        end: args.end,
    });
    let availability = coordinator.settled().await;

    let request = draft.validate(&slots, &availability).map_err(|errors| {
        let first = errors.into_iter().next().unwrap_or(ValidationError::AvailabilityPending);
        anyhow::Error::new(first).context("Reservation cannot be submitted")
    })?;

    let quote = quote_services(&request.services, &services);
    let reserved = duration_minutes(&slots, Some(request.start), Some(request.end));
    if !quote.is_covered_by(reserved) {
        warn!(reserved, needed = quote.total_minutes, "reserved time is shorter than the estimated work");
    }
    if !quote.unlisted.is_empty() {
        warn!(unlisted = ?quote.unlisted, "services not offered by this garage");
    }

    let free_bays = check_capacity(&availability)?;
    let reservation_id = if args.dry_run {
        None
    } else {
        let created = api
            .create_reservation(&request)
            .await
            .context("Failed to create reservation")?;
        Some(created.id)
    };

    let report = BookReport {
        garage_id: request.garage_id,
        date: request.date,
        start: request.start,
        end: request.end,
        duration_minutes: reserved,
        estimated_minutes: quote.total_minutes,
        estimated_cost: quote.total_cost,
        free_bays,
        reservation_id,
    };

    if out.json {
        return out.print_json(&report);
    }

    println!("Garage: {}", garage.name);
    println!("  date: {}", report.date);
    println!("  time: {} -> {} ({} min)", report.start, report.end, report.duration_minutes);
    let coverage = if quote.is_covered_by(reserved) {
        out.ok("fits")
    } else {
        out.warn("exceeds the reserved time")
    };
    println!("  estimated work: {} min ({})", report.estimated_minutes, coverage);
    println!("  estimated cost: {:.2} DH", report.estimated_cost);
    println!("  free bays: {}", report.free_bays);
    match &report.reservation_id {
        Some(id) => println!("{} reservation created: {}", out.ok("ok"), id),
        None => println!("{} dry run, nothing submitted", out.warn("~")),
    }

    Ok(())
}
