// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Karhebti backend client
//!
//! [`BackendApi`] is the seam the booking logic talks to; [`HttpBackend`]
//! implements it over the REST API.

use crate::config::Config;
use crate::error::ClientError;
use crate::slots::TimeSlot;
use crate::types::{
    BayCount, CreateReservationRequest, Garage, NewRepairBay, RepairBay, Reservation, ReservationPage,
    ServiceOffer,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Page size used when walking the reservation list
pub const RESERVATION_PAGE_SIZE: u32 = 100;

/// Remote operations the booking logic needs
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Bays of `garage_id` free for the whole `[start, end)` window on `date`
    async fn get_available_repair_bays(
        &self,
        garage_id: &str,
        date: NaiveDate,
        start: TimeSlot,
        end: TimeSlot,
    ) -> Result<Vec<RepairBay>, ClientError>;

    /// All bays of a garage, ordered by bay number
    async fn get_repair_bays_by_garage(&self, garage_id: &str) -> Result<Vec<RepairBay>, ClientError>;

    /// Every reservation visible to the caller, optionally limited to one garage
    async fn get_reservations(&self, garage_id: Option<&str>) -> Result<Vec<Reservation>, ClientError>;

    /// Submit a new reservation
    async fn create_reservation(&self, request: &CreateReservationRequest) -> Result<Reservation, ClientError>;

    /// Fetch one garage
    async fn get_garage(&self, garage_id: &str) -> Result<Garage, ClientError>;

    /// Services a garage offers
    async fn get_services_by_garage(&self, garage_id: &str) -> Result<Vec<ServiceOffer>, ClientError>;

    /// Store a new bay count on the garage
    async fn update_garage_bays(&self, garage_id: &str, count: BayCount) -> Result<Garage, ClientError>;

    /// Create one repair bay
    async fn create_repair_bay(&self, bay: &NewRepairBay) -> Result<RepairBay, ClientError>;
}

/// NestJS error body; `message` is a string or a list of strings
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: serde_json::Value,
}

impl ErrorBody {
    fn text(&self) -> Option<String> {
        match &self.message {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(serde_json::Value::as_str).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        }
    }
}

/// [`BackendApi`] over HTTP with JSON bodies
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpBackend {
    /// Client for the API rooted at `base_url`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base, token })
    }

    /// Client built from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Base URL every path is resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })?;
        debug!(%method, %url, "backend request");

        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.text())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn get_available_repair_bays(
        &self,
        garage_id: &str,
        date: NaiveDate,
        start: TimeSlot,
        end: TimeSlot,
    ) -> Result<Vec<RepairBay>, ClientError> {
        let builder = self
            .request(Method::GET, &format!("repair-bays/garage/{garage_id}/available"))?
            .query(&[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("heureDebut", start.to_string()),
                ("heureFin", end.to_string()),
            ]);
        let bays: Vec<RepairBay> = self.send(builder).await?;
        info!(garage_id, %date, %start, %end, free = bays.len(), "fetched available repair bays");
        Ok(bays)
    }

    async fn get_repair_bays_by_garage(&self, garage_id: &str) -> Result<Vec<RepairBay>, ClientError> {
        let builder = self.request(Method::GET, &format!("repair-bays/garage/{garage_id}"))?;
        let mut bays: Vec<RepairBay> = self.send(builder).await?;
        bays.sort_by_key(|b| b.bay_number);
        Ok(bays)
    }

    async fn get_reservations(&self, garage_id: Option<&str>) -> Result<Vec<Reservation>, ClientError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let mut builder = self
                .request(Method::GET, "reservations")?
                .query(&[("page", page), ("limit", RESERVATION_PAGE_SIZE)]);
            if let Some(id) = garage_id {
                builder = builder.query(&[("garageId", id)]);
            }

            let batch: ReservationPage = self.send(builder).await?;
            let received = batch.reservations.len();
            all.extend(batch.reservations);

            let last_page = batch.total_pages.unwrap_or(page);
            if received == 0 || page >= last_page {
                break;
            }
            page += 1;
        }

        info!(garage_id = garage_id.unwrap_or("*"), count = all.len(), "fetched reservations");
        Ok(all)
    }

    async fn create_reservation(&self, request: &CreateReservationRequest) -> Result<Reservation, ClientError> {
        let builder = self.request(Method::POST, "reservations")?.json(request);
        let created: Reservation = self.send(builder).await?;
        info!(id = %created.id, garage_id = %request.garage_id, "reservation created");
        Ok(created)
    }

    async fn get_garage(&self, garage_id: &str) -> Result<Garage, ClientError> {
        let builder = self.request(Method::GET, &format!("garages/{garage_id}"))?;
        self.send(builder).await
    }

    async fn get_services_by_garage(&self, garage_id: &str) -> Result<Vec<ServiceOffer>, ClientError> {
        let builder = self.request(Method::GET, &format!("services/garage/{garage_id}"))?;
        self.send(builder).await
    }

    async fn update_garage_bays(&self, garage_id: &str, count: BayCount) -> Result<Garage, ClientError> {
        let builder = self
            .request(Method::PATCH, &format!("garages/{garage_id}"))?
            .json(&json!({ "numberOfBays": count }));
        let garage: Garage = self.send(builder).await?;
        info!(garage_id, bays = count.get(), "garage bay count updated");
        Ok(garage)
    }

    async fn create_repair_bay(&self, bay: &NewRepairBay) -> Result<RepairBay, ClientError> {
        let builder = self.request(Method::POST, "repair-bays")?.json(bay);
        let created: RepairBay = self.send(builder).await?;
        info!(garage_id = %bay.garage_id, bay_number = bay.bay_number, "repair bay created");
        Ok(created)
    }
}
