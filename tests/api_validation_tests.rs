// SPDX-License-Identifier: MIT

//! API input validation tests.
//!
//! All of these run against the offline mock store: validation must reject
//! bad requests before any database work happens, with the
//! `{ success: false, error, message }` envelope.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Duration;
use kaddad_backend::time_utils::today_utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn create_trip_body(date: chrono::NaiveDate, seats: u32) -> Value {
    json!({
        "from": "Amman",
        "from_lat": 31.9539,
        "from_lng": 35.9106,
        "to": "Irbid",
        "date": date.to_string(),
        "departure_time": "09:00",
        "distance_km": 85,
        "estimated_duration_minutes": 75,
        "cost": 3.5,
        "available_seats": seats,
        "car_model": "Toyota Corolla",
        "car_color": "White",
        "car_license_plate": "12-34567",
    })
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    token: &str,
    body: Value,
) -> axum::http::Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_trip_rejects_zero_seats() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), false, &state.config.jwt_signing_key);

    let future = today_utc() + Duration::days(7);
    let response = post_json(app, "/trips", &token, create_trip_body(future, 0)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AvailableSeats must be between 1 and 10");
}

#[tokio::test]
async fn test_create_trip_rejects_past_date() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), false, &state.config.jwt_signing_key);

    let yesterday = today_utc() - Duration::days(1);
    let response = post_json(app, "/trips", &token, create_trip_body(yesterday, 3)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Trip date cannot be in the past");
}

#[tokio::test]
async fn test_book_rejects_malformed_trip_id() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), false, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/trips/not-a-uuid/book")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid Trip ID");
}

#[tokio::test]
async fn test_rate_rejects_out_of_range_value() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), false, &state.config.jwt_signing_key);

    let uri = format!("/trips/{}/rate", Uuid::new_v4());
    let response = post_json(app, &uri, &token, json!({ "rating": 0 })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Rating must be between 1 and 5");
}

#[tokio::test]
async fn test_listing_rejects_unknown_status() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/trips?status=departed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid status value");
}

#[tokio::test]
async fn test_listing_rejects_bad_min_seats() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/trips?min_seats=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_rejects_malformed_user_id() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4(), true, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/admin/users/123/ban")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid User ID format");
}
