// SPDX-License-Identifier: MIT

//! Booking orchestration: trip creation and every lifecycle transition.
//!
//! Each operation loads the trip, applies the transition method from
//! [`Trip`], and persists the result through the atomic
//! [`FirestoreDb::update_trip`] cycle. Failures surface synchronously with
//! the exact guard that rejected them; nothing above the transaction layer
//! retries.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Trip, TripStatus};
use crate::time_utils::{is_valid_departure_time, now_rfc3339, today_utc};

/// Car images ride along inside the trip document, so keep them small.
const MAX_CAR_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Payload for publishing a new trip.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTripRequest {
    #[validate(length(min = 1, message = "From is required"))]
    pub from: String,
    pub from_lat: f64,
    pub from_lng: f64,
    #[validate(length(min = 1, message = "To is required"))]
    pub to: String,
    pub date: NaiveDate,
    #[validate(custom(function = validate_departure_time))]
    pub departure_time: String,
    #[validate(range(min = 1, max = 5000, message = "DistanceKm must be between 1 and 5000"))]
    pub distance_km: u32,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "EstimatedDurationMinutes must be between 1 and 1440"
    ))]
    pub estimated_duration_minutes: u32,
    #[validate(range(
        min = 0.01,
        max = 1000.0,
        message = "Cost must be a positive number up to 1000"
    ))]
    pub cost: f64,
    #[validate(range(min = 1, max = 10, message = "AvailableSeats must be between 1 and 10"))]
    pub available_seats: u32,
    #[validate(length(min = 1, message = "CarModel is required"))]
    pub car_model: String,
    #[validate(length(min = 1, message = "CarColor is required"))]
    pub car_color: String,
    #[validate(length(min = 1, message = "CarLicensePlate is required"))]
    pub car_license_plate: String,
    #[validate(custom(function = validate_driver_preference))]
    #[serde(default = "default_driver_preference")]
    pub driver_preference: String,
    #[validate(range(max = 5, message = "PassengerBagLimit must be between 0 and 5"))]
    #[serde(default)]
    pub passenger_bag_limit: u32,
    /// Base64-encoded car photo
    pub car_image: Option<String>,
    /// MIME type of `car_image`
    pub car_image_type: Option<String>,
}

fn default_driver_preference() -> String {
    "Any".to_string()
}

fn validate_departure_time(value: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_departure_time(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("departure_time");
        err.message = Some("Invalid departure time format (HH:MM)".into());
        Err(err)
    }
}

fn validate_driver_preference(value: &str) -> std::result::Result<(), ValidationError> {
    match value {
        "Any" | "Males Only" | "Females Only" => Ok(()),
        _ => {
            let mut err = ValidationError::new("driver_preference");
            err.message = Some("Invalid driver preference".into());
            Err(err)
        }
    }
}

/// Pull one human-readable message out of a validation failure.
fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Orchestrates all trip lifecycle operations.
#[derive(Clone)]
pub struct BookingService {
    db: FirestoreDb,
}

impl BookingService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Publish a new trip for `driver_id`.
    ///
    /// The trip starts `active` with the full seat count free and an empty
    /// passenger list.
    pub async fn create_trip(&self, driver_id: Uuid, req: CreateTripRequest) -> Result<Trip> {
        req.validate()
            .map_err(|e| AppError::InvalidInput(first_validation_message(&e)))?;

        if req.date < today_utc() {
            return Err(AppError::InvalidInput(
                "Trip date cannot be in the past".to_string(),
            ));
        }

        if let Some(image) = &req.car_image {
            let decoded = STANDARD.decode(image).map_err(|_| {
                AppError::InvalidInput("CarImage must be base64-encoded".to_string())
            })?;
            if decoded.len() > MAX_CAR_IMAGE_BYTES {
                return Err(AppError::InvalidInput(
                    "CarImage exceeds the 2 MiB limit".to_string(),
                ));
            }
            match req.car_image_type.as_deref() {
                Some(mime) if mime.starts_with("image/") => {}
                _ => {
                    return Err(AppError::InvalidInput(
                        "CarImageType must be an image MIME type".to_string(),
                    ))
                }
            }
        }

        let now = now_rfc3339();
        let trip = Trip {
            trip_id: Uuid::new_v4(),
            driver_id,
            from: req.from,
            from_lat: req.from_lat,
            from_lng: req.from_lng,
            to: req.to,
            date: req.date,
            departure_time: req.departure_time,
            distance_km: req.distance_km,
            estimated_duration_minutes: req.estimated_duration_minutes,
            cost: req.cost,
            total_seats: req.available_seats,
            available_seats: req.available_seats,
            car_model: req.car_model,
            car_color: req.car_color,
            car_license_plate: req.car_license_plate,
            driver_preference: req.driver_preference,
            passenger_bag_limit: req.passenger_bag_limit,
            car_image: req.car_image,
            car_image_type: req.car_image_type,
            passengers: vec![],
            status: TripStatus::Active,
            rating: None,
            cancellation_reason: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.insert_trip(&trip).await?;

        tracing::info!(
            trip_id = %trip.trip_id,
            driver_id = %driver_id,
            seats = trip.total_seats,
            date = %trip.date,
            "Trip published"
        );

        Ok(trip)
    }

    /// Book one seat on a trip for `user_id`.
    pub async fn book_seat(&self, trip_id: Uuid, user_id: Uuid) -> Result<Trip> {
        let today = today_utc();
        let trip = self
            .db
            .update_trip(trip_id, |t| t.book(user_id, today))
            .await?;

        tracing::info!(
            trip_id = %trip_id,
            user_id = %user_id,
            available_seats = trip.available_seats,
            status = %trip.status,
            "Seat booked"
        );
        Ok(trip)
    }

    /// Release the caller's booked seat.
    pub async fn cancel_booking(&self, trip_id: Uuid, user_id: Uuid) -> Result<Trip> {
        let trip = self
            .db
            .update_trip(trip_id, |t| t.cancel_booking(user_id))
            .await?;

        tracing::info!(
            trip_id = %trip_id,
            user_id = %user_id,
            available_seats = trip.available_seats,
            "Booking cancelled"
        );
        Ok(trip)
    }

    /// Driver cancels the whole trip.
    pub async fn driver_cancel_trip(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        reason: Option<String>,
    ) -> Result<Trip> {
        let trip = self
            .db
            .update_trip(trip_id, |t| t.cancel(user_id, reason.clone()))
            .await?;

        tracing::info!(
            trip_id = %trip_id,
            driver_id = %user_id,
            reason = ?trip.cancellation_reason,
            "Trip cancelled by driver"
        );
        Ok(trip)
    }

    /// Driver marks the trip as completed.
    pub async fn complete_trip(&self, trip_id: Uuid, user_id: Uuid) -> Result<Trip> {
        let trip = self.db.update_trip(trip_id, |t| t.complete(user_id)).await?;

        tracing::info!(trip_id = %trip_id, driver_id = %user_id, "Trip completed");
        Ok(trip)
    }

    /// Passenger rates a completed trip.
    pub async fn submit_rating(&self, trip_id: Uuid, user_id: Uuid, value: u8) -> Result<Trip> {
        // Range-check before touching the store so malformed input never
        // costs a transaction.
        if !(1..=5).contains(&value) {
            return Err(AppError::InvalidInput(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let trip = self
            .db
            .update_trip(trip_id, |t| t.rate(user_id, value))
            .await?;

        tracing::info!(trip_id = %trip_id, user_id = %user_id, rating = value, "Trip rated");
        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateTripRequest {
        CreateTripRequest {
            from: "Amman".to_string(),
            from_lat: 31.9539,
            from_lng: 35.9106,
            to: "Aqaba".to_string(),
            date: today_utc(),
            departure_time: "07:15".to_string(),
            distance_km: 330,
            estimated_duration_minutes: 240,
            cost: 8.0,
            available_seats: 3,
            car_model: "Kia Rio".to_string(),
            car_color: "Silver".to_string(),
            car_license_plate: "22-11223".to_string(),
            driver_preference: "Any".to_string(),
            passenger_bag_limit: 2,
            car_image: None,
            car_image_type: None,
        }
    }

    fn offline_service() -> BookingService {
        BookingService::new(FirestoreDb::new_mock())
    }

    #[tokio::test]
    async fn test_create_trip_rejects_zero_seats() {
        let mut req = valid_request();
        req.available_seats = 0;

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.to_string(), "AvailableSeats must be between 1 and 10");
    }

    #[tokio::test]
    async fn test_create_trip_rejects_past_date() {
        let mut req = valid_request();
        req.date = today_utc().pred_opt().unwrap();

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Trip date cannot be in the past");
    }

    #[tokio::test]
    async fn test_create_trip_rejects_bad_departure_time() {
        let mut req = valid_request();
        req.departure_time = "7am".to_string();

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid departure time format (HH:MM)");
    }

    #[tokio::test]
    async fn test_create_trip_rejects_unknown_preference() {
        let mut req = valid_request();
        req.driver_preference = "VIP Only".to_string();

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid driver preference");
    }

    #[tokio::test]
    async fn test_create_trip_rejects_undecodable_image() {
        let mut req = valid_request();
        req.car_image = Some("not base64 at all!!!".to_string());
        req.car_image_type = Some("image/jpeg".to_string());

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "CarImage must be base64-encoded");
    }

    #[tokio::test]
    async fn test_create_trip_requires_image_mime_type() {
        let mut req = valid_request();
        req.car_image = Some(STANDARD.encode([0u8; 16]));
        req.car_image_type = Some("text/plain".to_string());

        let err = offline_service()
            .create_trip(Uuid::new_v4(), req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "CarImageType must be an image MIME type");
    }

    #[tokio::test]
    async fn test_valid_request_passes_validation() {
        // Offline mock: a valid request must get past validation and fail
        // only at the (disconnected) store.
        let err = offline_service()
            .create_trip(Uuid::new_v4(), valid_request())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_submit_rating_range_checked_before_store() {
        let err = offline_service()
            .submit_rating(Uuid::new_v4(), Uuid::new_v4(), 0)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Rating must be between 1 and 5");

        let err = offline_service()
            .submit_rating(Uuid::new_v4(), Uuid::new_v4(), 6)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
