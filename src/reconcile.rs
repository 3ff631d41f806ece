// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Availability reconciliation and repair-bay count changes
//!
//! Everything here is advisory: the backend performs the authoritative
//! capacity check when a reservation is created. These functions mirror it
//! so the client can block hopeless submissions and unsafe bay reductions.

use crate::availability::AvailabilityState;
use crate::error::ValidationError;
use crate::slots::TimeSlot;
use crate::types::{BayCount, NewRepairBay, RepairBay, Reservation};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Free bay count for the current window, or the reason submission is blocked
pub fn check_capacity(state: &AvailabilityState) -> Result<usize, ValidationError> {
    match state {
        AvailabilityState::Ready { bays, .. } if bays.is_empty() => Err(ValidationError::NoBaysAvailable),
        AvailabilityState::Ready { bays, .. } => Ok(bays.len()),
        AvailabilityState::Failed { message, .. } => Err(ValidationError::Backend(message.clone())),
        AvailabilityState::Idle | AvailabilityState::Loading(_) => Err(ValidationError::AvailabilityPending),
    }
}

/// Outcome of a proposed bay-count decrease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BayReduction {
    /// No active future reservation would lose its bay
    Allowed,
    /// This many active future reservations sit on bays that would go
    Rejected {
        /// Number of blocking reservations
        conflicts: usize,
    },
}

impl BayReduction {
    /// Convert to the validation error the form shows
    pub fn ensure_allowed(self) -> Result<(), ValidationError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Rejected { conflicts } => Err(ValidationError::BayReductionBlocked(conflicts)),
        }
    }
}

/// Reservations that would be stranded if only bays `1..=candidate` remained
///
/// A reservation blocks when it references a bay numbered above
/// `candidate`, is dated strictly after `now`, and is neither cancelled nor
/// completed.
#[must_use]
pub fn conflicting_reservations<'a>(
    candidate: u32,
    current_bays: &[RepairBay],
    reservations: &'a [Reservation],
    now: DateTime<Utc>,
) -> Vec<&'a Reservation> {
    let removed: HashSet<&str> = current_bays
        .iter()
        .filter(|bay| bay.bay_number > candidate)
        .map(|bay| bay.id.as_str())
        .collect();

    if removed.is_empty() {
        return Vec::new();
    }

    reservations
        .iter()
        .filter(|r| r.repair_bay_id().is_some_and(|id| removed.contains(id)))
        .filter(|r| r.date > now)
        .filter(|r| !r.status.is_closed())
        .collect()
}

/// Decide whether the bay count may drop to `candidate`
#[must_use]
pub fn check_bay_reduction(
    candidate: u32,
    current_bays: &[RepairBay],
    reservations: &[Reservation],
    now: DateTime<Utc>,
) -> BayReduction {
    let conflicts = conflicting_reservations(candidate, current_bays, reservations, now).len();
    if conflicts == 0 {
        debug!(candidate, "bay reduction allowed");
        BayReduction::Allowed
    } else {
        warn!(candidate, conflicts, "bay reduction blocked by active reservations");
        BayReduction::Rejected { conflicts }
    }
}

/// Bays to create or retire to move a garage from one bay count to another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BayChangePlan {
    /// New bays, numbered after the existing ones
    pub create: Vec<NewRepairBay>,
    /// IDs of bays numbered above the target
    pub retire: Vec<String>,
}

impl BayChangePlan {
    /// Nothing to do
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.retire.is_empty()
    }
}

/// Name the backend gives bay `n`
#[must_use]
pub fn bay_name(bay_number: u32) -> String {
    format!("Créneau {bay_number}")
}

/// Work needed to go from `original` to `target` bays
///
/// Growth creates bays `original + 1 ..= target` with the garage's hours.
/// Shrinking retires the existing bays numbered above `target`; run
/// [`check_bay_reduction`] first.
#[must_use]
pub fn plan_bay_change(
    garage_id: &str,
    original: u32,
    target: BayCount,
    current_bays: &[RepairBay],
    opening: &str,
    closing: &str,
) -> BayChangePlan {
    let target = target.get();
    let create = (original.saturating_add(1)..=target)
        .map(|bay_number| NewRepairBay {
            garage_id: garage_id.to_string(),
            bay_number,
            name: bay_name(bay_number),
            opening: opening.to_string(),
            closing: closing.to_string(),
            is_active: true,
        })
        .collect();

    let mut retire: Vec<&RepairBay> = current_bays.iter().filter(|b| b.bay_number > target).collect();
    retire.sort_by_key(|b| b.bay_number);

    BayChangePlan {
        create,
        retire: retire.into_iter().map(|b| b.id.clone()).collect(),
    }
}

/// Whether two `[start, end)` hour windows overlap
#[must_use]
pub fn windows_overlap(a: (TimeSlot, TimeSlot), b: (TimeSlot, TimeSlot)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Bays the backend would report as free for a window
///
/// Active bays are free unless a confirmed, in-progress or completed
/// reservation on the same calendar day overlaps the window. Reservations
/// with unreadable times are treated as overlapping.
#[must_use]
pub fn free_bays<'a>(
    bays: &'a [RepairBay],
    reservations: &[Reservation],
    date: NaiveDate,
    start: TimeSlot,
    end: TimeSlot,
) -> Vec<&'a RepairBay> {
    let held: HashSet<&str> = reservations
        .iter()
        .filter(|r| r.status.holds_bay())
        .filter(|r| r.date.date_naive() == date)
        .filter(|r| match (r.start_time.parse::<TimeSlot>(), r.end_time.parse::<TimeSlot>()) {
            (Ok(s), Ok(e)) => windows_overlap((s, e), (start, end)),
            _ => true,
        })
        .filter_map(Reservation::repair_bay_id)
        .collect();

    bays.iter()
        .filter(|bay| bay.is_active && !held.contains(bay.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityRef, ReservationStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn bays(n: u32) -> Vec<RepairBay> {
        (1..=n)
            .map(|i| RepairBay {
                id: format!("bay-{i}"),
                garage_id: "g1".into(),
                bay_number: i,
                name: bay_name(i),
                opening: "08:00".into(),
                closing: "18:00".into(),
                is_active: true,
            })
            .collect()
    }

    fn reservation(bay: Option<&str>, date: DateTime<Utc>, status: ReservationStatus) -> Reservation {
        Reservation {
            id: "r1".into(),
            garage: Some(EntityRef::Id("g1".into())),
            repair_bay: bay.map(|b| EntityRef::Id(b.into())),
            date,
            start_time: "09:00".into(),
            end_time: "11:00".into(),
            services: vec!["vidange".into()],
            status,
            comment: None,
        }
    }

    #[test]
    fn test_capacity_verdicts() {
        assert_eq!(check_capacity(&AvailabilityState::Idle), Err(ValidationError::AvailabilityPending));
        let key = crate::availability::AvailabilityKey {
            garage_id: "g1".into(),
            date: now().date_naive(),
            start: TimeSlot::new(9).unwrap(),
            end: TimeSlot::new(10).unwrap(),
        };
        let failed = AvailabilityState::Failed { key: key.clone(), message: "Service indisponible".into() };
        assert_eq!(check_capacity(&failed), Err(ValidationError::Backend("Service indisponible".into())));
        let empty = AvailabilityState::Ready { key: key.clone(), bays: vec![] };
        assert_eq!(check_capacity(&empty), Err(ValidationError::NoBaysAvailable));
        let two = AvailabilityState::Ready { key, bays: bays(2) };
        assert_eq!(check_capacity(&two), Ok(2));
    }

    #[test]
    fn test_reduction_blocked_by_confirmed_tomorrow() {
        let tomorrow = now() + Duration::days(1);
        let reservations = vec![reservation(Some("bay-3"), tomorrow, ReservationStatus::Confirmed)];

        let verdict = check_bay_reduction(2, &bays(3), &reservations, now());

        assert_eq!(verdict, BayReduction::Rejected { conflicts: 1 });
        assert_eq!(verdict.ensure_allowed(), Err(ValidationError::BayReductionBlocked(1)));
    }

    #[test]
    fn test_reduction_ignores_closed_past_and_kept_bays() {
        let tomorrow = now() + Duration::days(1);
        let yesterday = now() - Duration::days(1);
        let reservations = vec![
            reservation(Some("bay-3"), tomorrow, ReservationStatus::Cancelled),
            reservation(Some("bay-3"), tomorrow, ReservationStatus::Completed),
            reservation(Some("bay-3"), yesterday, ReservationStatus::Confirmed),
            reservation(Some("bay-2"), tomorrow, ReservationStatus::Confirmed),
            reservation(None, tomorrow, ReservationStatus::Pending),
        ];

        assert_eq!(check_bay_reduction(2, &bays(3), &reservations, now()), BayReduction::Allowed);
    }

    #[test]
    fn test_reduction_counts_pending_and_in_progress() {
        let later = now() + Duration::hours(2);
        let reservations = vec![
            reservation(Some("bay-2"), later, ReservationStatus::Pending),
            reservation(Some("bay-3"), later, ReservationStatus::InProgress),
        ];

        assert_eq!(
            check_bay_reduction(1, &bays(3), &reservations, now()),
            BayReduction::Rejected { conflicts: 2 }
        );
    }

    #[test]
    fn test_growth_is_always_allowed() {
        let reservations = vec![reservation(Some("bay-3"), now() + Duration::days(1), ReservationStatus::Confirmed)];
        assert_eq!(check_bay_reduction(5, &bays(3), &reservations, now()), BayReduction::Allowed);
    }

    #[test]
    fn test_plan_growth() {
        let plan = plan_bay_change("g1", 2, BayCount::new(4).unwrap(), &bays(2), "08:00", "17:00");

        let numbers: Vec<u32> = plan.create.iter().map(|b| b.bay_number).collect();
        assert_eq!(numbers, [3, 4]);
        assert_eq!(plan.create[0].name, "Créneau 3");
        assert_eq!(plan.create[1].closing, "17:00");
        assert!(plan.retire.is_empty());
    }

    #[test]
    fn test_plan_shrink() {
        let plan = plan_bay_change("g1", 4, BayCount::new(2).unwrap(), &bays(4), "08:00", "18:00");
        assert!(plan.create.is_empty());
        assert_eq!(plan.retire, ["bay-3", "bay-4"]);

        let same = plan_bay_change("g1", 3, BayCount::new(3).unwrap(), &bays(3), "08:00", "18:00");
        assert!(same.is_empty());
    }

    #[test]
    fn test_free_bays_mirror() {
        let day = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let mut all = bays(3);
        all[2].is_active = false;
        let reservations = vec![
            reservation(Some("bay-1"), day, ReservationStatus::Confirmed),
            reservation(Some("bay-2"), day, ReservationStatus::Pending),
        ];
        let slot = |h| TimeSlot::new(h).unwrap();

        let free: Vec<&str> = free_bays(&all, &reservations, day.date_naive(), slot(10), slot(12))
            .into_iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(free, ["bay-2"]);

        // Back-to-back windows do not overlap
        let free_after = free_bays(&all, &reservations, day.date_naive(), slot(11), slot(13));
        assert_eq!(free_after.len(), 2);
    }
}
