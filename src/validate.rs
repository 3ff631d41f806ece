// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Reservation range and form validation

use crate::availability::{AvailabilityKey, AvailabilityState};
use crate::error::ValidationError;
use crate::reconcile;
use crate::slots::{slot_index, TimeSlot};
use crate::types::{CreateReservationRequest, ReservationStatus, ServiceOffer};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Minutes covered by one slot step
pub const SLOT_MINUTES: u32 = 60;

/// A validated start/end pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRange {
    /// First hour of the reservation
    pub start: TimeSlot,
    /// Hour the reservation ends
    pub end: TimeSlot,
    /// Reserved minutes
    pub duration_minutes: u32,
}

/// Check a start/end selection against the generated slot list
///
/// Both slots must come from `slots` and `end` must sit strictly after
/// `start`. The duration is the slot distance times sixty minutes.
pub fn validate_range(
    slots: &[TimeSlot],
    start: Option<TimeSlot>,
    end: Option<TimeSlot>,
) -> Result<SlotRange, ValidationError> {
    let start = start.ok_or(ValidationError::MissingStartTime)?;
    let end = end.ok_or(ValidationError::MissingEndTime)?;

    let (Some(start_idx), Some(end_idx)) = (slot_index(slots, start), slot_index(slots, end)) else {
        return Err(ValidationError::InvalidRange);
    };
    if end_idx <= start_idx {
        return Err(ValidationError::InvalidRange);
    }

    let steps = u32::try_from(end_idx - start_idx).map_err(|_| ValidationError::InvalidRange)?;
    Ok(SlotRange {
        start,
        end,
        duration_minutes: steps * SLOT_MINUTES,
    })
}

/// Reserved minutes for a selection, zero when it is not a valid range
#[must_use]
pub fn duration_minutes(slots: &[TimeSlot], start: Option<TimeSlot>, end: Option<TimeSlot>) -> u32 {
    validate_range(slots, start, end).map_or(0, |r| r.duration_minutes)
}

/// Price and workload of a service selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceQuote {
    /// Sum of average costs
    pub total_cost: f64,
    /// Sum of estimated durations, in minutes
    pub total_minutes: u32,
    /// Selected types the garage does not list; they count as free and instant
    pub unlisted: Vec<String>,
}

impl ServiceQuote {
    /// Whether a reservation of `duration_minutes` leaves enough time for the work
    #[must_use]
    pub fn is_covered_by(&self, duration_minutes: u32) -> bool {
        duration_minutes >= self.total_minutes
    }
}

/// Total cost and duration of the selected service types
#[must_use]
pub fn quote_services(selected: &[String], catalogue: &[ServiceOffer]) -> ServiceQuote {
    selected.iter().fold(ServiceQuote::default(), |mut quote, service_type| {
        match catalogue.iter().find(|o| o.service_type == *service_type) {
            Some(offer) => {
                quote.total_cost += offer.average_cost;
                quote.total_minutes = quote.total_minutes.saturating_add(offer.estimated_minutes);
            }
            None => quote.unlisted.push(service_type.clone()),
        }
        quote
    })
}

/// Snapshot of the booking form
///
/// The caller owns the mutable form state and hands a fresh snapshot in on
/// every change; validation never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    /// Garage being booked
    pub garage_id: String,
    /// Chosen day
    pub date: Option<NaiveDate>,
    /// Chosen start slot
    pub start: Option<TimeSlot>,
    /// Chosen end slot
    pub end: Option<TimeSlot>,
    /// Chosen service types
    pub services: Vec<String>,
    /// Optional comment for the garage
    pub comment: Option<String>,
}

impl ReservationDraft {
    /// Every form-level problem, in field order
    #[must_use]
    pub fn form_errors(&self, slots: &[TimeSlot]) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.date.is_none() {
            errors.push(ValidationError::MissingDate);
        }
        if let Err(e) = validate_range(slots, self.start, self.end) {
            errors.push(e);
        }
        if self.services.is_empty() {
            errors.push(ValidationError::NoServicesSelected);
        }

        errors
    }

    /// Availability window this draft needs an answer for
    #[must_use]
    pub fn availability_key(&self) -> Option<AvailabilityKey> {
        Some(AvailabilityKey {
            garage_id: self.garage_id.clone(),
            date: self.date?,
            start: self.start?,
            end: self.end?,
        })
    }

    /// Full validation, including the capacity verdict for the current window
    ///
    /// A window with no free bay blocks submission even when the form is
    /// otherwise complete. An answer for any other window counts as pending.
    pub fn validate(
        &self,
        slots: &[TimeSlot],
        availability: &AvailabilityState,
    ) -> Result<CreateReservationRequest, Vec<ValidationError>> {
        let mut errors = self.form_errors(slots);
        let wanted = self.availability_key();
        if wanted.is_none() || availability.key() != wanted.as_ref() {
            debug!(garage = %self.garage_id, "availability answer is for another window");
            errors.push(ValidationError::AvailabilityPending);
        } else if let Err(e) = reconcile::check_capacity(availability) {
            errors.push(e);
        }

        debug!(garage = %self.garage_id, errors = errors.len(), "validated reservation draft");

        match (self.date, validate_range(slots, self.start, self.end)) {
            (Some(date), Ok(range)) if errors.is_empty() => Ok(CreateReservationRequest {
                garage_id: self.garage_id.clone(),
                date,
                start: range.start,
                end: range.end,
                services: self.services.clone(),
                status: ReservationStatus::Pending,
                comment: self.comment.clone().filter(|c| !c.trim().is_empty()),
            }),
            _ => Err(errors),
        }
    }
}
