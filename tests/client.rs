// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Backend client and availability coordinator tests against a mock server

use chrono::NaiveDate;
use karhebti_slots::availability::{AvailabilityCoordinator, AvailabilityKey, AvailabilityState};
use karhebti_slots::client::{BackendApi, HttpBackend};
use karhebti_slots::error::ClientError;
use karhebti_slots::slots::TimeSlot;
use karhebti_slots::types::{BayCount, CreateReservationRequest, ReservationStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn slot(hour: u8) -> TimeSlot {
    TimeSlot::new(hour).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), Some("secret".into()), Duration::from_secs(5)).unwrap()
}

fn bay_json(id: &str, number: u32) -> serde_json::Value {
    json!({
        "_id": id,
        "garageId": "g1",
        "bayNumber": number,
        "name": format!("Créneau {number}"),
        "heureOuverture": "08:00",
        "heureFermeture": "18:00",
        "isActive": true
    })
}

fn reservation_json(id: &str, bay: serde_json::Value) -> serde_json::Value {
    json!({
        "_id": id,
        "garageId": "g1",
        "repairBayId": bay,
        "date": "2025-06-02T00:00:00.000Z",
        "heureDebut": "09:00",
        "heureFin": "11:00",
        "services": ["vidange"],
        "status": "en_attente"
    })
}

// =============================================================================
// Client
// =============================================================================

#[tokio::test]
async fn test_available_bays_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repair-bays/garage/g1/available"))
        .and(query_param("date", "2025-06-02"))
        .and(query_param("heureDebut", "09:00"))
        .and(query_param("heureFin", "11:00"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bay_json("b1", 1), bay_json("b2", 2)])))
        .expect(1)
        .mount(&server)
        .await;

    let bays = backend(&server)
        .get_available_repair_bays("g1", monday(), slot(9), slot(11))
        .await
        .unwrap();

    assert_eq!(bays.len(), 2);
    assert_eq!(bays[1].bay_number, 2);
}

#[tokio::test]
async fn test_reservations_walk_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reservations"))
        .and(query_param("garageId", "g1"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reservations": [reservation_json("r1", json!({ "_id": "b3", "bayNumber": 3 }))],
            "total": 2,
            "page": 1,
            "limit": 100,
            "totalPages": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reservations"))
        .and(query_param("garageId", "g1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reservations": [reservation_json("r2", json!("b1"))],
            "total": 2,
            "page": 2,
            "limit": 100,
            "totalPages": 2
        })))
        .mount(&server)
        .await;

    let reservations = backend(&server).get_reservations(Some("g1")).await.unwrap();

    let bays: Vec<Option<&str>> = reservations.iter().map(|r| r.repair_bay_id()).collect();
    assert_eq!(bays, [Some("b3"), Some("b1")]);
}

#[tokio::test]
async fn test_backend_message_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garages/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "statusCode": 404,
            "message": "Garage introuvable",
            "error": "Not Found"
        })))
        .mount(&server)
        .await;

    let err = backend(&server).get_garage("missing").await.unwrap_err();

    match &err {
        ClientError::Status { status, message } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "Garage introuvable");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.user_message(), "Garage introuvable");
}

#[tokio::test]
async fn test_create_reservation_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reservations"))
        .and(body_json(json!({
            "garageId": "g1",
            "date": "2025-06-02",
            "heureDebut": "09:00",
            "heureFin": "11:00",
            "services": ["vidange"],
            "status": "en_attente"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(reservation_json("r9", json!("b2"))))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateReservationRequest {
        garage_id: "g1".into(),
        date: monday(),
        start: slot(9),
        end: slot(11),
        services: vec!["vidange".into()],
        status: ReservationStatus::Pending,
        comment: None,
    };
    let created = backend(&server).create_reservation(&request).await.unwrap();

    assert_eq!(created.id, "r9");
    assert_eq!(created.repair_bay_id(), Some("b2"));
}

#[tokio::test]
async fn test_update_bay_count() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/garages/g1"))
        .and(body_json(json!({ "numberOfBays": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "g1",
            "nom": "Garage du Lac",
            "numberOfBays": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let garage = backend(&server)
        .update_garage_bays("g1", BayCount::new(4).unwrap())
        .await
        .unwrap();

    assert_eq!(garage.bay_count(), 4);
}

// =============================================================================
// Availability Coordinator
// =============================================================================

fn key(end: u8) -> AvailabilityKey {
    AvailabilityKey {
        garage_id: "g1".into(),
        date: monday(),
        start: slot(9),
        end: slot(end),
    }
}

#[tokio::test]
async fn test_slow_stale_answer_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repair-bays/garage/g1/available"))
        .and(query_param("heureFin", "11:00"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([bay_json("b1", 1)]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repair-bays/garage/g1/available"))
        .and(query_param("heureFin", "12:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let coordinator = AvailabilityCoordinator::new(Arc::new(backend(&server)));
    coordinator.request(key(11));
    coordinator.request(key(12));

    let settled = coordinator.settled().await;
    assert_eq!(settled, AvailabilityState::Ready { key: key(12), bays: vec![] });

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(coordinator.current(), AvailabilityState::Ready { key: key(12), bays: vec![] });
}

#[tokio::test]
async fn test_failure_is_published() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repair-bays/garage/g1/available"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": 400,
            "message": ["heureFin must be after heureDebut"]
        })))
        .mount(&server)
        .await;

    let coordinator = AvailabilityCoordinator::new(Arc::new(backend(&server)));
    coordinator.request(key(11));

    assert_eq!(
        coordinator.settled().await,
        AvailabilityState::Failed {
            key: key(11),
            message: "heureFin must be after heureDebut".into()
        }
    );

    coordinator.clear();
    assert_eq!(coordinator.current(), AvailabilityState::Idle);
}
