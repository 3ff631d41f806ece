// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dates command - lists the days a reservation may be booked on

use super::Output;
use crate::slots::bookable_dates;
use anyhow::Result;
use chrono::NaiveDate;

/// Run the dates command
pub fn run(out: Output, today: NaiveDate, days: u32) -> Result<()> {
    let dates = bookable_dates(today, days);

    if out.json {
        return out.print_json(&dates);
    }

    for (i, date) in dates.iter().enumerate() {
        let marker = if i == 0 { " (today)" } else { "" };
        println!("{}{}", date.format("%a %Y-%m-%d"), marker);
    }
    Ok(())
}
