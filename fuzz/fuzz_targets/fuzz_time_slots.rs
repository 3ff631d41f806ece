// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use arbitrary::Arbitrary;
use karhebti_slots::slots::{end_slots_after, generate_time_slots};
use karhebti_slots::validate::validate_range;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Hours {
    opening: String,
    closing: String,
    start: u8,
    end: u8,
}

fuzz_target!(|input: Hours| {
    let slots = generate_time_slots(&input.opening, &input.closing);
    assert!(!slots.is_empty());
    assert!(slots.windows(2).all(|w| w[0] < w[1]));

    let start = slots[usize::from(input.start) % slots.len()];
    let end = slots[usize::from(input.end) % slots.len()];
    assert!(end_slots_after(&slots, start).iter().all(|s| *s > start));

    if let Ok(range) = validate_range(&slots, Some(start), Some(end)) {
        assert!(range.duration_minutes > 0);
        assert_eq!(range.duration_minutes % 60, 0);
    }
});
