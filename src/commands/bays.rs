// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bays command - changes a garage's repair-bay count safely

use super::Output;
use crate::client::BackendApi;
use crate::config::Config;
use crate::reconcile::{check_bay_reduction, conflicting_reservations, plan_bay_change, BayChangePlan, BayReduction};
use crate::types::BayCount;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct BaysReport<'a> {
    garage_id: &'a str,
    current: u32,
    target: u32,
    verdict: BayReduction,
    plan: &'a BayChangePlan,
    applied: bool,
}

/// Run the bays command
pub async fn run(
    out: Output,
    api: Arc<dyn BackendApi>,
    config: &Config,
    garage_id: &str,
    target: u32,
    apply: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let target = BayCount::new(target)?;
    info!("Changing bay count of garage {} to {}", garage_id, target.get());

    let garage = api
        .get_garage(garage_id)
        .await
        .with_context(|| format!("Failed to load garage {garage_id}"))?;
    let bays = api
        .get_repair_bays_by_garage(garage_id)
        .await
        .with_context(|| format!("Failed to load repair bays of garage {garage_id}"))?;
    let reservations = api
        .get_reservations(Some(garage_id))
        .await
        .context("Failed to load reservations")?;

    let current = garage.bay_count();
    let verdict = check_bay_reduction(target.get(), &bays, &reservations, now);

    if let BayReduction::Rejected { .. } = verdict {
        if out.json {
            out.print_json(&BaysReport {
                garage_id,
                current,
                target: target.get(),
                verdict,
                plan: &BayChangePlan::default(),
                applied: false,
            })?;
        } else {
            println!("{} reservations on bays above {}:", out.fail("x"), target.get());
            for r in conflicting_reservations(target.get(), &bays, &reservations, now) {
                println!(
                    "  {} {} {}-{} [{}]",
                    r.id,
                    r.date.format("%Y-%m-%d"),
                    r.start_time,
                    r.end_time,
                    r.status
                );
            }
        }
        verdict.ensure_allowed()?;
    }

    let opening = garage.opening.as_deref().unwrap_or(&config.default_opening);
    let closing = garage.closing.as_deref().unwrap_or(&config.default_closing);
    let plan = plan_bay_change(garage_id, current, target, &bays, opening, closing);

    let applied = apply && (current != target.get() || !plan.is_empty());
    if applied {
        api.update_garage_bays(garage_id, target)
            .await
            .context("Failed to update garage")?;
        for bay in &plan.create {
            api.create_repair_bay(bay)
                .await
                .with_context(|| format!("Failed to create bay {}", bay.bay_number))?;
        }
    }

    if out.json {
        return out.print_json(&BaysReport {
            garage_id,
            current,
            target: target.get(),
            verdict,
            plan: &plan,
            applied,
        });
    }

    println!("Garage: {} ({} -> {} bays)", garage.name, current, target.get());
    for bay in &plan.create {
        println!("  {} create #{} {}", out.ok("+"), bay.bay_number, bay.name);
    }
    for id in &plan.retire {
        println!("  {} retire {}", out.warn("-"), id);
    }
    if plan.is_empty() {
        println!("  nothing to change");
    }
    if applied {
        println!("{} applied", out.ok("ok"));
    } else if apply {
        println!("{} already up to date", out.ok("ok"));
    } else {
        println!("{} dry run, use --apply to save", out.warn("~"));
    }

    Ok(())
}
