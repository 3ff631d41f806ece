// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use karhebti_slots::types::{Reservation, ReservationPage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(reservation) = serde_json::from_slice::<Reservation>(data) {
        let _ = reservation.repair_bay_id();
        let _ = serde_json::to_vec(&reservation);
    }
    let _ = serde_json::from_slice::<ReservationPage>(data);
});
