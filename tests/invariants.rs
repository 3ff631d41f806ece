// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for slot generation, range validation and bay reduction
//!
//! These tests verify critical invariants:
//! 1. Slot lists are strictly increasing hour boundaries
//! 2. Reserved duration is the slot distance times sixty minutes
//! 3. Bay reductions never strand an active future reservation

use chrono::{DateTime, Duration, TimeZone, Utc};
use karhebti_slots::error::ValidationError;
use karhebti_slots::reconcile::{check_bay_reduction, BayReduction};
use karhebti_slots::slots::{default_slots, end_slots_after, generate_time_slots, TimeSlot};
use karhebti_slots::types::{EntityRef, RepairBay, Reservation, ReservationStatus};
use karhebti_slots::validate::{duration_minutes, validate_range};
use proptest::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn slot(hour: u8) -> TimeSlot {
    TimeSlot::new(hour).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

fn make_bays(n: u32) -> Vec<RepairBay> {
    (1..=n)
        .map(|i| RepairBay {
            id: format!("bay-{i}"),
            garage_id: "g1".into(),
            bay_number: i,
            name: format!("Créneau {i}"),
            opening: "08:00".into(),
            closing: "18:00".into(),
            is_active: true,
        })
        .collect()
}

fn make_reservation(bay_number: u32, offset_hours: i64, status: ReservationStatus) -> Reservation {
    Reservation {
        id: format!("r-{bay_number}-{offset_hours}"),
        garage: Some(EntityRef::Id("g1".into())),
        repair_bay: Some(EntityRef::Id(format!("bay-{bay_number}"))),
        date: now() + Duration::hours(offset_hours),
        start_time: "09:00".into(),
        end_time: "10:00".into(),
        services: vec!["vidange".into()],
        status,
        comment: None,
    }
}

fn status_strategy() -> impl Strategy<Value = ReservationStatus> {
    prop_oneof![
        Just(ReservationStatus::Pending),
        Just(ReservationStatus::Confirmed),
        Just(ReservationStatus::InProgress),
        Just(ReservationStatus::Completed),
        Just(ReservationStatus::Cancelled),
    ]
}

// =============================================================================
// Slot Generation
// =============================================================================

proptest! {
    #[test]
    fn prop_slots_cover_opening_to_closing(open in 0u8..24, close in 0u8..24, om in 0u8..60, cm in 0u8..60) {
        let slots = generate_time_slots(&format!("{open:02}:{om:02}"), &format!("{close:02}:{cm:02}"));

        if open <= close {
            prop_assert_eq!(slots.len(), usize::from(close - open) + 1);
            prop_assert_eq!(slots.first().copied(), Some(slot(open)));
            prop_assert_eq!(slots.last().copied(), Some(slot(close)));
        } else {
            prop_assert_eq!(slots, default_slots());
        }
    }

    #[test]
    fn prop_slots_strictly_increasing(open in 0u8..24, close in 0u8..24) {
        let slots = generate_time_slots(&format!("{open:02}:00"), &format!("{close:02}:00"));
        prop_assert!(!slots.is_empty());
        prop_assert!(slots.windows(2).all(|w| w[1].hour() == w[0].hour() + 1));
        prop_assert!(slots.iter().all(|s| s.to_string().ends_with(":00")));
    }

    #[test]
    fn prop_malformed_hours_fall_back(garbage in "[a-zA-Z ]{0,8}") {
        prop_assert_eq!(generate_time_slots(&garbage, "18:00"), default_slots());
        prop_assert_eq!(generate_time_slots("08:00", &garbage), default_slots());
    }

    #[test]
    fn prop_end_choices_after_start(open in 0u8..12, span in 0u8..12, pick in 0usize..12) {
        let slots = generate_time_slots(&format!("{open:02}:00"), &format!("{:02}:00", open + span));
        let start = slots[pick % slots.len()];
        let choices = end_slots_after(&slots, start);

        prop_assert!(choices.iter().all(|end| *end > start));
        prop_assert_eq!(choices.len(), slots.len() - 1 - (pick % slots.len()));
    }
}

// =============================================================================
// Range Validation
// =============================================================================

proptest! {
    #[test]
    fn prop_duration_is_slot_distance(i in 0usize..11, j in 0usize..11) {
        let slots = default_slots();
        let (start, end) = (slots[i], slots[j]);
        let result = validate_range(&slots, Some(start), Some(end));

        if j > i {
            let range = result.unwrap();
            prop_assert_eq!(range.duration_minutes, u32::try_from(j - i).unwrap() * 60);
            prop_assert!(range.duration_minutes > 0);
        } else {
            prop_assert_eq!(result, Err(ValidationError::InvalidRange));
            prop_assert_eq!(duration_minutes(&slots, Some(start), Some(end)), 0);
        }
    }
}

#[test]
fn test_morning_example() {
    let slots = generate_time_slots("08:00", "12:00");
    let labels: Vec<String> = slots.iter().map(ToString::to_string).collect();
    assert_eq!(labels, ["08:00", "09:00", "10:00", "11:00", "12:00"]);

    let range = validate_range(&slots, Some(slot(9)), Some(slot(11))).unwrap();
    assert_eq!(range.duration_minutes, 120);
}

#[test]
fn test_missing_selection_errors() {
    let slots = default_slots();
    assert_eq!(validate_range(&slots, None, None), Err(ValidationError::MissingStartTime));
    assert_eq!(validate_range(&slots, Some(slot(9)), None), Err(ValidationError::MissingEndTime));
}

// =============================================================================
// Bay Reduction
// =============================================================================

proptest! {
    #[test]
    fn prop_growth_never_rejected(
        current in 1u32..=10,
        extra in 0u32..=5,
        booked in prop::collection::vec((1u32..=10, -48i64..48, status_strategy()), 0..20),
    ) {
        let bays = make_bays(current);
        let reservations: Vec<Reservation> = booked
            .into_iter()
            .map(|(bay, offset, status)| make_reservation(bay.min(current), offset, status))
            .collect();

        prop_assert_eq!(
            check_bay_reduction(current + extra, &bays, &reservations, now()),
            BayReduction::Allowed
        );
    }

    #[test]
    fn prop_rejected_iff_active_future_on_removed_bay(
        current in 1u32..=10,
        candidate in 1u32..=10,
        booked in prop::collection::vec((1u32..=10, -48i64..48, status_strategy()), 0..20),
    ) {
        let bays = make_bays(current);
        let reservations: Vec<Reservation> = booked
            .iter()
            .map(|&(bay, offset, status)| make_reservation(bay.min(current), offset, status))
            .collect();

        let expected = booked
            .iter()
            .filter(|&&(bay, offset, status)| bay.min(current) > candidate && offset > 0 && !status.is_closed())
            .count();

        let verdict = check_bay_reduction(candidate, &bays, &reservations, now());
        if expected == 0 {
            prop_assert_eq!(verdict, BayReduction::Allowed);
        } else {
            prop_assert_eq!(verdict, BayReduction::Rejected { conflicts: expected });
        }
    }
}

#[test]
fn test_confirmed_tomorrow_blocks_reduction() {
    let reservations = vec![make_reservation(3, 24, "confirmée".parse().unwrap())];
    assert_eq!(
        check_bay_reduction(2, &make_bays(3), &reservations, now()),
        BayReduction::Rejected { conflicts: 1 }
    );
}

#[test]
fn test_reservation_exactly_now_does_not_block() {
    let reservations = vec![make_reservation(3, 0, ReservationStatus::Confirmed)];
    assert_eq!(check_bay_reduction(2, &make_bays(3), &reservations, now()), BayReduction::Allowed);
}

// =============================================================================
// Status Decoding
// =============================================================================

#[test]
fn test_status_synonyms() {
    let cases = [
        ("en_attente", ReservationStatus::Pending),
        ("PENDING", ReservationStatus::Pending),
        ("Confirmé", ReservationStatus::Confirmed),
        ("confirmée", ReservationStatus::Confirmed),
        ("Confirmed", ReservationStatus::Confirmed),
        ("en_cours", ReservationStatus::InProgress),
        ("in_progress", ReservationStatus::InProgress),
        ("TERMINÉE", ReservationStatus::Completed),
        ("completed", ReservationStatus::Completed),
        ("annulé", ReservationStatus::Cancelled),
        ("Annulée", ReservationStatus::Cancelled),
        ("cancelled", ReservationStatus::Cancelled),
    ];

    for (raw, expected) in cases {
        assert_eq!(raw.parse::<ReservationStatus>().unwrap(), expected, "{raw}");
    }
}

#[test]
fn test_unknown_status_rejected() {
    assert!("refusé".parse::<ReservationStatus>().is_err());
    assert!("".parse::<ReservationStatus>().is_err());
    assert!(serde_json::from_str::<ReservationStatus>("\"archived\"").is_err());
}

#[test]
fn test_status_serializes_canonical() {
    let status: ReservationStatus = serde_json::from_str("\"Confirmed\"").unwrap();
    assert_eq!(serde_json::to_string(&status).unwrap(), "\"confirmé\"");
}
