// SPDX-License-Identifier: MIT

//! Trip routes: public search plus the authenticated booking lifecycle.

use crate::db::TripListFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Trip, TripStatus};
use crate::routes::ApiResponse;
use crate::services::CreateTripRequest;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

const MAX_PAGE_SIZE: u32 = 100;

/// Routes that need no authentication (trip search and detail).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", get(list_trips))
        .route("/trips/{id}", get(get_trip))
}

/// Routes requiring a verified principal.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip))
        .route("/trips/my-trips", get(my_trips))
        .route("/trips/my-bookings", get(my_bookings))
        .route("/trips/{id}/book", post(book_seat))
        .route("/trips/{id}/cancel-booking", patch(cancel_booking))
        .route("/trips/{id}/cancel", patch(cancel_trip))
        .route("/trips/{id}/complete", patch(complete_trip))
        .route("/trips/{id}/rate", post(rate_trip))
        .route("/trips/{id}/passengers", get(trip_passengers))
}

fn parse_trip_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid Trip ID".to_string()))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListTripsQuery {
    status: Option<String>,
    /// Origin substring filter (min 2 chars, case-insensitive)
    from: Option<String>,
    /// Destination substring filter
    to: Option<String>,
    min_seats: Option<u32>,
    date: Option<NaiveDate>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    20
}

/// Listing entry: passenger list and car image are deliberately excluded
/// from search payloads.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TripSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub trip_id: Uuid,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub driver_id: Uuid,
    pub from: String,
    pub from_lat: f64,
    pub from_lng: f64,
    pub to: String,
    pub date: String,
    pub departure_time: String,
    pub distance_km: u32,
    pub estimated_duration_minutes: u32,
    pub cost: f64,
    pub total_seats: u32,
    pub available_seats: u32,
    pub car_model: String,
    pub car_color: String,
    pub driver_preference: String,
    pub passenger_bag_limit: u32,
    pub status: String,
    pub rating: Option<u8>,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            trip_id: trip.trip_id,
            driver_id: trip.driver_id,
            from: trip.from.clone(),
            from_lat: trip.from_lat,
            from_lng: trip.from_lng,
            to: trip.to.clone(),
            date: trip.date.to_string(),
            departure_time: trip.departure_time.clone(),
            distance_km: trip.distance_km,
            estimated_duration_minutes: trip.estimated_duration_minutes,
            cost: trip.cost,
            total_seats: trip.total_seats,
            available_seats: trip.available_seats,
            car_model: trip.car_model.clone(),
            car_color: trip.car_color.clone(),
            driver_preference: trip.driver_preference.clone(),
            passenger_bag_limit: trip.passenger_bag_limit,
            status: trip.status.to_string(),
            rating: trip.rating,
        }
    }
}

#[derive(Serialize)]
pub struct ListTripsResponse {
    pub success: bool,
    pub count: usize,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<TripSummary>,
}

fn parse_status(raw: &str) -> Result<TripStatus> {
    match raw {
        "active" => Ok(TripStatus::Active),
        "full" => Ok(TripStatus::Full),
        "completed" => Ok(TripStatus::Completed),
        "cancelled" => Ok(TripStatus::Cancelled),
        _ => Err(AppError::InvalidInput("Invalid status value".to_string())),
    }
}

/// Search published trips.
///
/// Defaults to active trips dated today or later. Structured filters run in
/// the store; the short origin/destination substring match runs on the
/// fetched page.
async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTripsQuery>,
) -> Result<Json<ListTripsResponse>> {
    if params.page < 1 {
        return Err(AppError::InvalidInput(
            "Page must be greater than 0".to_string(),
        ));
    }
    if let Some(n) = params.min_seats {
        if !(1..=10).contains(&n) {
            return Err(AppError::InvalidInput(
                "MinSeats must be an integer between 1 and 10".to_string(),
            ));
        }
    }

    let status = params.status.as_deref().map(parse_status).transpose()?;
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

    // Hide already-departed trips from the default active listing, matching
    // the booking-time date guard.
    let effective_status = status.unwrap_or(TripStatus::Active);
    let date_from = if effective_status == TripStatus::Active && params.date.is_none() {
        Some(today_utc())
    } else {
        None
    };

    let offset = (params.page - 1).checked_mul(limit).ok_or_else(|| {
        AppError::InvalidInput("Page number causes overflow".to_string())
    })?;

    let filter = TripListFilter {
        status: Some(effective_status),
        date: params.date,
        date_from,
        min_seats: params.min_seats,
        limit,
        offset,
    };

    tracing::debug!(
        status = %effective_status,
        date = ?params.date,
        min_seats = ?params.min_seats,
        page = params.page,
        "Listing trips"
    );

    let trips = state.db.list_trips(&filter).await?;

    let from_needle = params.from.as_deref().map(str::trim).filter(|s| s.len() >= 2);
    let to_needle = params.to.as_deref().map(str::trim).filter(|s| s.len() >= 2);

    let data: Vec<TripSummary> = trips
        .iter()
        .filter(|t| {
            from_needle.is_none_or(|needle| {
                t.from.to_lowercase().contains(&needle.to_lowercase())
            })
        })
        .filter(|t| {
            to_needle.is_none_or(|needle| t.to.to_lowercase().contains(&needle.to_lowercase()))
        })
        .map(TripSummary::from)
        .collect();

    Ok(Json(ListTripsResponse {
        success: true,
        count: data.len(),
        page: params.page,
        limit,
        data,
    }))
}

/// Get full trip details.
async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;

    let trip = state
        .db
        .get_trip(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    Ok(ApiResponse::ok(trip))
}

// ─── Creation ────────────────────────────────────────────────

/// Publish a new trip (caller becomes the driver).
async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTripRequest>,
) -> Result<impl IntoResponse> {
    let trip = state.booking.create_trip(user.user_id, req).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(trip)))
}

// ─── Booking Lifecycle ───────────────────────────────────────

/// Book one seat on a trip.
async fn book_seat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;
    let trip = state.booking.book_seat(trip_id, user.user_id).await?;
    Ok(ApiResponse::ok_with_message(trip, "Trip booked successfully"))
}

/// Give up a booked seat.
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;
    let trip = state.booking.cancel_booking(trip_id, user.user_id).await?;
    Ok(ApiResponse::ok_with_message(
        trip,
        "Your booking has been cancelled",
    ))
}

#[derive(Deserialize, Default)]
struct CancelTripRequest {
    reason: Option<String>,
}

/// Driver cancels the whole trip. The `{ reason }` body is optional.
async fn cancel_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;
    let reason = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<CancelTripRequest>(&body)
            .map_err(|_| AppError::InvalidInput("Invalid request body".to_string()))?
            .reason
    };

    let trip = state
        .booking
        .driver_cancel_trip(trip_id, user.user_id, reason)
        .await?;
    Ok(ApiResponse::ok_with_message(
        trip,
        "Trip cancelled successfully",
    ))
}

/// Driver marks the trip as completed.
async fn complete_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;
    let trip = state.booking.complete_trip(trip_id, user.user_id).await?;
    Ok(ApiResponse::ok_with_message(trip, "Trip marked as completed"))
}

#[derive(Deserialize)]
struct RateTripRequest {
    rating: u8,
}

/// Passenger rates a completed trip.
async fn rate_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<RateTripRequest>,
) -> Result<Json<ApiResponse<Trip>>> {
    let trip_id = parse_trip_id(&id)?;
    let trip = state
        .booking
        .submit_rating(trip_id, user.user_id, req.rating)
        .await?;
    Ok(ApiResponse::ok_with_message(
        trip,
        "Rating submitted successfully",
    ))
}

// ─── Caller-Scoped Listings ──────────────────────────────────

/// Trips the caller drives, newest first.
async fn my_trips(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<Trip>>>> {
    let trips = state.db.trips_for_driver(user.user_id).await?;
    Ok(ApiResponse::ok(trips))
}

/// Trips the caller has booked, newest first.
async fn my_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<Trip>>>> {
    let trips = state.db.trips_for_passenger(user.user_id).await?;
    Ok(ApiResponse::ok(trips))
}

// ─── Passenger Roster ────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PassengerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct PassengersResponse {
    pub success: bool,
    pub passengers: Vec<PassengerInfo>,
}

/// Driver-only view of who booked the trip, in booking order.
async fn trip_passengers(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<PassengersResponse>> {
    let trip_id = parse_trip_id(&id)?;

    let trip = state
        .db
        .get_trip(trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    if !trip.is_driver(user.user_id) {
        return Err(AppError::Forbidden(
            "Only the driver can view passengers".to_string(),
        ));
    }

    let mut passengers = Vec::with_capacity(trip.passengers.len());
    for passenger_id in &trip.passengers {
        if let Some(profile) = state.db.get_user(*passenger_id).await? {
            passengers.push(PassengerInfo {
                first_name: profile.first_name,
                last_name: profile.last_name,
                email: profile.email,
            });
        }
    }

    Ok(Json(PassengersResponse {
        success: true,
        passengers,
    }))
}
