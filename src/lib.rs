// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Karhebti slots library - reservation slot calculator for garage bookings
//!
//! This crate provides the booking core of the Karhebti garage service:
//! hourly slot generation from garage opening hours, reservation range
//! validation, repair-bay availability reconciliation and the conflict
//! check that guards lowering a garage's bay count. All of it runs as pure
//! functions over immutable snapshots fetched from the backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod availability;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod slots;
pub mod validate;

/// Core data types matching the Karhebti backend's JSON documents
pub mod types {
    use crate::error::ValidationError;
    use crate::slots::TimeSlot;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::str::FromStr;

    // =========================================================================
    // Reservation Status
    // =========================================================================

    /// Lifecycle state of a reservation
    ///
    /// The backend speaks French status names; older records and some
    /// endpoints use feminine or English forms. Decoding accepts all of them
    /// case-insensitively and rejects anything else.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ReservationStatus {
        /// Waiting for the garage owner to confirm (`en_attente`)
        Pending,
        /// Confirmed by the garage (`confirmé`)
        Confirmed,
        /// Work has started (`en_cours`)
        InProgress,
        /// Work finished (`terminé`)
        Completed,
        /// Cancelled by either party (`annulé`)
        Cancelled,
    }

    impl ReservationStatus {
        /// Canonical backend name
        #[must_use]
        pub fn wire_name(self) -> &'static str {
            match self {
                Self::Pending => "en_attente",
                Self::Confirmed => "confirmé",
                Self::InProgress => "en_cours",
                Self::Completed => "terminé",
                Self::Cancelled => "annulé",
            }
        }

        /// Cancelled and completed reservations no longer occupy anything
        #[must_use]
        pub fn is_closed(self) -> bool {
            matches!(self, Self::Cancelled | Self::Completed)
        }

        /// Whether the backend counts this reservation as holding its bay
        ///
        /// Pending reservations do not hold a bay until the owner confirms.
        #[must_use]
        pub fn holds_bay(self) -> bool {
            matches!(self, Self::Confirmed | Self::InProgress | Self::Completed)
        }
    }

    /// Unrecognised reservation status string
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("unknown reservation status: {0}")]
    pub struct UnknownStatus(pub String);

    impl FromStr for ReservationStatus {
        type Err = UnknownStatus;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_lowercase().as_str() {
                "en_attente" | "en attente" | "pending" => Ok(Self::Pending),
                "confirmé" | "confirmée" | "confirmed" => Ok(Self::Confirmed),
                "en_cours" | "en cours" | "in_progress" => Ok(Self::InProgress),
                "terminé" | "terminée" | "completed" => Ok(Self::Completed),
                "annulé" | "annulée" | "cancelled" => Ok(Self::Cancelled),
                _ => Err(UnknownStatus(s.to_string())),
            }
        }
    }

    impl fmt::Display for ReservationStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.wire_name())
        }
    }

    impl Serialize for ReservationStatus {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.wire_name())
        }
    }

    impl<'de> Deserialize<'de> for ReservationStatus {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(serde::de::Error::custom)
        }
    }

    // =========================================================================
    // Entity References
    // =========================================================================

    /// Populated form of a referenced document
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PopulatedRef {
        /// Referenced document ID
        #[serde(rename = "_id", alias = "id")]
        pub id: String,
        /// Bay number, when the reference is a repair bay
        #[serde(rename = "bayNumber", default, skip_serializing_if = "Option::is_none")]
        pub bay_number: Option<u32>,
        /// Display name, when populated
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
    }

    /// Reference to another document: either a bare ID or the populated object
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum EntityRef {
        /// Bare document ID
        Id(String),
        /// Populated document
        Populated(PopulatedRef),
    }

    impl EntityRef {
        /// The referenced document's ID, whichever form was sent
        #[must_use]
        pub fn id(&self) -> &str {
            match self {
                Self::Id(id) => id,
                Self::Populated(p) => &p.id,
            }
        }
    }

    // =========================================================================
    // Garage
    // =========================================================================

    /// Opening hour used when a garage has none on record
    pub const DEFAULT_OPENING: &str = "08:00";
    /// Closing hour used when a garage has none on record
    pub const DEFAULT_CLOSING: &str = "18:00";

    /// A garage as returned by `GET garages/{id}`
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Garage {
        /// Garage ID
        #[serde(rename = "_id")]
        pub id: String,
        /// Display name
        #[serde(rename = "nom", default)]
        pub name: String,
        /// Opening time, `HH:MM`
        #[serde(rename = "heureOuverture", default)]
        pub opening: Option<String>,
        /// Closing time, `HH:MM`
        #[serde(rename = "heureFermeture", default)]
        pub closing: Option<String>,
        /// Number of repair bays
        #[serde(rename = "numberOfBays", default)]
        pub number_of_bays: Option<u32>,
    }

    impl Garage {
        /// Opening time, falling back to the default when absent
        #[must_use]
        pub fn opening_or_default(&self) -> &str {
            self.opening.as_deref().unwrap_or(DEFAULT_OPENING)
        }

        /// Closing time, falling back to the default when absent
        #[must_use]
        pub fn closing_or_default(&self) -> &str {
            self.closing.as_deref().unwrap_or(DEFAULT_CLOSING)
        }

        /// Bay count on record; garages created before bays existed have one
        #[must_use]
        pub fn bay_count(&self) -> u32 {
            self.number_of_bays.unwrap_or(1)
        }
    }

    /// Validated number of repair bays for a garage
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(transparent)]
    pub struct BayCount(u32);

    impl BayCount {
        /// Smallest allowed bay count
        pub const MIN: u32 = 1;
        /// Largest allowed bay count
        pub const MAX: u32 = 10;

        /// Validate a bay count
        pub fn new(count: u32) -> Result<Self, ValidationError> {
            if (Self::MIN..=Self::MAX).contains(&count) {
                Ok(Self(count))
            } else {
                Err(ValidationError::BayCountOutOfRange(count))
            }
        }

        /// The count as a plain number
        #[must_use]
        pub fn get(self) -> u32 {
            self.0
        }
    }

    // =========================================================================
    // Repair Bay
    // =========================================================================

    /// A repair bay as returned by the `repair-bays` endpoints
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RepairBay {
        /// Bay ID
        #[serde(rename = "_id")]
        pub id: String,
        /// Owning garage ID
        #[serde(rename = "garageId")]
        pub garage_id: String,
        /// Bay number, `1..=numberOfBays`
        #[serde(rename = "bayNumber")]
        pub bay_number: u32,
        /// Display name
        #[serde(default)]
        pub name: String,
        /// Opening time, `HH:MM`
        #[serde(rename = "heureOuverture", default)]
        pub opening: String,
        /// Closing time, `HH:MM`
        #[serde(rename = "heureFermeture", default)]
        pub closing: String,
        /// Inactive bays never take reservations
        #[serde(rename = "isActive", default = "default_true")]
        pub is_active: bool,
    }

    fn default_true() -> bool {
        true
    }

    /// Body of `POST repair-bays`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct NewRepairBay {
        /// Owning garage ID
        #[serde(rename = "garageId")]
        pub garage_id: String,
        /// Bay number
        #[serde(rename = "bayNumber")]
        pub bay_number: u32,
        /// Display name
        pub name: String,
        /// Opening time, `HH:MM`
        #[serde(rename = "heureOuverture")]
        pub opening: String,
        /// Closing time, `HH:MM`
        #[serde(rename = "heureFermeture")]
        pub closing: String,
        /// New bays start active
        #[serde(rename = "isActive")]
        pub is_active: bool,
    }

    // =========================================================================
    // Reservation
    // =========================================================================

    /// A reservation as returned by the `reservations` endpoints
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Reservation {
        /// Reservation ID
        #[serde(rename = "_id")]
        pub id: String,
        /// Garage reference
        #[serde(rename = "garageId", default)]
        pub garage: Option<EntityRef>,
        /// Assigned repair bay, if any
        #[serde(rename = "repairBayId", default)]
        pub repair_bay: Option<EntityRef>,
        /// Reservation day
        pub date: DateTime<Utc>,
        /// Start time, `HH:MM`
        #[serde(rename = "heureDebut")]
        pub start_time: String,
        /// End time, `HH:MM`
        #[serde(rename = "heureFin")]
        pub end_time: String,
        /// Requested service types
        #[serde(default, deserialize_with = "null_as_empty")]
        pub services: Vec<String>,
        /// Lifecycle state
        pub status: ReservationStatus,
        /// Free-form customer comment
        #[serde(rename = "commentaires", default)]
        pub comment: Option<String>,
    }

    impl Reservation {
        /// ID of the assigned repair bay, if any
        #[must_use]
        pub fn repair_bay_id(&self) -> Option<&str> {
            self.repair_bay.as_ref().map(EntityRef::id)
        }

        /// ID of the garage, if any
        #[must_use]
        pub fn garage_id(&self) -> Option<&str> {
            self.garage.as_ref().map(EntityRef::id)
        }
    }

    fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Decode a page's reservations one by one so a bad record is named
    ///
    /// The page still fails as a whole: an unreadable status must never be
    /// guessed at.
    fn reservations_by_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Reservation>, D::Error> {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|value| {
                let id = value
                    .get("_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("?")
                    .to_string();
                Reservation::deserialize(value).map_err(|e| {
                    tracing::warn!(reservation = %id, error = %e, "unreadable reservation");
                    serde::de::Error::custom(format!("reservation {id}: {e}"))
                })
            })
            .collect()
    }

    /// One page of `GET reservations`
    #[derive(Debug, Clone, Deserialize)]
    pub struct ReservationPage {
        /// Reservations on this page
        #[serde(deserialize_with = "reservations_by_id")]
        pub reservations: Vec<Reservation>,
        /// Total matching reservations
        #[serde(default)]
        pub total: Option<u32>,
        /// Page number, starting at 1
        #[serde(default)]
        pub page: Option<u32>,
        /// Page size
        #[serde(default)]
        pub limit: Option<u32>,
        /// Number of pages
        #[serde(rename = "totalPages", default)]
        pub total_pages: Option<u32>,
    }

    /// Body of `POST reservations`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct CreateReservationRequest {
        /// Garage ID
        #[serde(rename = "garageId")]
        pub garage_id: String,
        /// Reservation day, `YYYY-MM-DD`
        pub date: NaiveDate,
        /// Start slot
        #[serde(rename = "heureDebut")]
        pub start: TimeSlot,
        /// End slot
        #[serde(rename = "heureFin")]
        pub end: TimeSlot,
        /// Requested service types
        pub services: Vec<String>,
        /// Always pending on creation
        pub status: ReservationStatus,
        /// Free-form customer comment
        #[serde(rename = "commentaires", skip_serializing_if = "Option::is_none")]
        pub comment: Option<String>,
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// A service a garage offers, with its price and expected duration
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ServiceOffer {
        /// Service ID
        #[serde(rename = "_id")]
        pub id: String,
        /// Service type, e.g. `vidange`
        #[serde(rename = "type")]
        pub service_type: String,
        /// Average cost
        #[serde(rename = "coutMoyen", default)]
        pub average_cost: f64,
        /// Estimated duration in minutes
        #[serde(rename = "dureeEstimee", default)]
        pub estimated_minutes: u32,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{ClientError, ValidationError};
    pub use crate::slots::TimeSlot;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
