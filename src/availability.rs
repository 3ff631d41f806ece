// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repair-bay availability queries with a single request in flight
//!
//! Every new selection of date or times supersedes the previous query. The
//! tracker stamps each query with a generation number and only the answer
//! to the latest generation may reach the observable state, so a slow early
//! response can never overwrite a later one.

use crate::client::BackendApi;
use crate::slots::TimeSlot;
use crate::types::RepairBay;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The window an availability query is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AvailabilityKey {
    /// Garage being booked
    pub garage_id: String,
    /// Reservation day
    pub date: NaiveDate,
    /// Window start
    pub start: TimeSlot,
    /// Window end
    pub end: TimeSlot,
}

/// Observable result of the latest availability query
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AvailabilityState {
    /// Nothing asked yet, or the selection is incomplete
    #[default]
    Idle,
    /// Waiting for the backend
    Loading(AvailabilityKey),
    /// Free bays for the window
    Ready {
        /// Window asked about
        key: AvailabilityKey,
        /// Bays the backend reports as free
        bays: Vec<RepairBay>,
    },
    /// The backend call failed
    Failed {
        /// Window asked about
        key: AvailabilityKey,
        /// Error message, unchanged
        message: String,
    },
}

impl AvailabilityState {
    /// Window this state refers to
    #[must_use]
    pub fn key(&self) -> Option<&AvailabilityKey> {
        match self {
            Self::Idle => None,
            Self::Loading(key) | Self::Ready { key, .. } | Self::Failed { key, .. } => Some(key),
        }
    }

    /// Whether an answer (or failure) has arrived
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading(_))
    }
}

/// Proof that a query was started; needed to publish its answer
#[derive(Debug)]
#[must_use]
pub struct Ticket {
    generation: u64,
    key: AvailabilityKey,
}

impl Ticket {
    /// Generation this ticket was issued for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Window this ticket was issued for
    pub fn key(&self) -> &AvailabilityKey {
        &self.key
    }
}

/// Generation bookkeeping, independent of any runtime
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    generation: u64,
    state: AvailabilityState,
}

impl AvailabilityTracker {
    /// New tracker in the idle state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query for `key`, superseding any query still outstanding
    pub fn begin(&mut self, key: AvailabilityKey) -> Ticket {
        self.generation += 1;
        self.state = AvailabilityState::Loading(key.clone());
        Ticket {
            generation: self.generation,
            key,
        }
    }

    /// Record an answer; returns `false` and changes nothing if it is stale
    pub fn complete(&mut self, ticket: Ticket, result: Result<Vec<RepairBay>, String>) -> bool {
        if !self.is_current(&ticket) {
            return false;
        }
        self.state = match result {
            Ok(bays) => AvailabilityState::Ready { key: ticket.key, bays },
            Err(message) => AvailabilityState::Failed { key: ticket.key, message },
        };
        true
    }

    /// Drop any outstanding query and go back to idle
    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = AvailabilityState::Idle;
    }

    /// Whether `ticket` belongs to the latest query
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &AvailabilityState {
        &self.state
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs availability queries against the backend, one at a time
///
/// Must be used from within a tokio runtime.
pub struct AvailabilityCoordinator {
    api: Arc<dyn BackendApi>,
    tracker: Arc<Mutex<AvailabilityTracker>>,
    state: Arc<watch::Sender<AvailabilityState>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl AvailabilityCoordinator {
    /// Coordinator over the given backend
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        let (tx, _rx) = watch::channel(AvailabilityState::Idle);
        Self {
            api,
            tracker: Arc::new(Mutex::new(AvailabilityTracker::new())),
            state: Arc::new(tx),
            in_flight: Mutex::new(None),
        }
    }

    /// Observe state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AvailabilityState> {
        self.state.subscribe()
    }

    /// Latest published state
    #[must_use]
    pub fn current(&self) -> AvailabilityState {
        self.state.borrow().clone()
    }

    /// Ask for the free bays of `key`, cancelling the previous query
    pub fn request(&self, key: AvailabilityKey) {
        let ticket = {
            let mut tracker = lock(&self.tracker);
            let ticket = tracker.begin(key.clone());
            self.state.send_replace(tracker.state().clone());
            ticket
        };
        debug!(generation = ticket.generation(), ?key, "availability requested");

        let api = Arc::clone(&self.api);
        let tracker = Arc::clone(&self.tracker);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            let result = api
                .get_available_repair_bays(&key.garage_id, key.date, key.start, key.end)
                .await
                .map_err(|e| e.user_message());

            let mut tracker = lock(&tracker);
            let generation = ticket.generation();
            if tracker.complete(ticket, result) {
                info!(generation, "availability updated");
                state.send_replace(tracker.state().clone());
            } else {
                debug!(generation, "discarding stale availability answer");
            }
        });

        if let Some(previous) = lock(&self.in_flight).replace(handle) {
            previous.abort();
        }
    }

    /// Cancel any outstanding query and reset to idle
    pub fn clear(&self) {
        if let Some(previous) = lock(&self.in_flight).take() {
            previous.abort();
        }
        let mut tracker = lock(&self.tracker);
        tracker.clear();
        self.state.send_replace(AvailabilityState::Idle);
    }

    /// Wait until the latest query has answered
    pub async fn settled(&self) -> AvailabilityState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(AvailabilityState::is_settled).await {
            Ok(state) => state.clone(),
            // The sender lives as long as `self`
            Err(_) => self.current(),
        };
        settled
    }
}

impl Drop for AvailabilityCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.in_flight).take() {
            handle.abort();
        }
    }
}
