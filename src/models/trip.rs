// SPDX-License-Identifier: MIT

//! Trip model and the seat/status lifecycle rules.
//!
//! All booking-related mutations go through the transition methods on
//! [`Trip`]. Each method checks its guards against the current state and
//! either applies the full effect or returns a [`TransitionError`] without
//! touching the document. The database layer runs these methods inside a
//! transaction, so a transition is never applied to stale state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a trip.
///
/// `Active` and `Full` are bookable-adjacent; `Completed` and `Cancelled`
/// are terminal and freeze the passenger list and seat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Active,
    Full,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TripStatus::Active => "active",
            TripStatus::Full => "full",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A rejected transition. Every variant carries the exact guard that failed;
/// the frontend shows these messages verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot book a trip in the past")]
    TripInPast,

    #[error("Trip not bookable (status: {0})")]
    NotBookable(TripStatus),

    #[error("Driver cannot book own trip")]
    DriverOwnTrip,

    #[error("Already booked")]
    AlreadyBooked,

    #[error("No seats left")]
    NoSeatsLeft,

    #[error("Cannot cancel booking for a trip that is {0}")]
    BookingNotCancellable(TripStatus),

    #[error("You are not booked on this trip")]
    NotBooked,

    #[error("Only the driver can cancel this trip")]
    CancelByNonDriver,

    #[error("Trip already {0}")]
    AlreadyTerminal(TripStatus),

    #[error("Only the driver can complete this trip")]
    CompleteByNonDriver,

    #[error("Cannot complete a trip that is already {0}")]
    CompleteTerminal(TripStatus),

    #[error("You can only rate a completed trip")]
    RateBeforeCompletion,

    #[error("You can only rate trips you booked")]
    RateByNonPassenger,

    #[error("Trip already rated")]
    AlreadyRated,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
}

/// Stored trip record in Firestore.
///
/// Invariants held by the transition methods:
/// - `passengers.len() + available_seats == total_seats`
/// - `available_seats == 0` exactly when `status` is `full` (non-terminal)
/// - the driver never appears in `passengers`, and no id appears twice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Trip ID (also used as document ID)
    pub trip_id: Uuid,
    /// User who published the trip; immutable
    pub driver_id: Uuid,
    /// Origin label
    pub from: String,
    /// Origin coordinates
    pub from_lat: f64,
    pub from_lng: f64,
    /// Destination label
    pub to: String,
    /// Calendar date of departure
    pub date: NaiveDate,
    /// Local departure time, "HH:MM"
    pub departure_time: String,
    /// Driver-supplied route length
    pub distance_km: u32,
    /// Driver-supplied duration estimate
    pub estimated_duration_minutes: u32,
    /// Price per seat
    pub cost: f64,
    /// Seat capacity at creation; immutable
    pub total_seats: u32,
    /// Remaining unbooked seats
    pub available_seats: u32,
    /// Vehicle metadata (descriptive only)
    pub car_model: String,
    pub car_color: String,
    pub car_license_plate: String,
    /// Driver preference: "Any", "Males Only", or "Females Only"
    pub driver_preference: String,
    /// Bags allowed per passenger
    pub passenger_bag_limit: u32,
    /// Car photo, base64-encoded
    pub car_image: Option<String>,
    /// MIME type of `car_image`
    pub car_image_type: Option<String>,
    /// Booked passengers in booking order
    pub passengers: Vec<Uuid>,
    pub status: TripStatus,
    /// Post-trip rating (1-5), set once by a passenger
    pub rating: Option<u8>,
    /// Reason given by the driver when cancelling
    pub cancellation_reason: Option<String>,
    /// Creation timestamp (RFC3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC3339)
    pub updated_at: String,
}

impl Trip {
    pub fn is_driver(&self, user_id: Uuid) -> bool {
        self.driver_id == user_id
    }

    pub fn has_passenger(&self, user_id: Uuid) -> bool {
        self.passengers.contains(&user_id)
    }

    /// Book a seat for `user_id`.
    ///
    /// The date guard is at calendar-day granularity: a trip is bookable on
    /// its own date, only strictly past dates are rejected. The listing layer
    /// filters past trips too, but the guard re-checks here so a stale client
    /// cannot book through it.
    pub fn book(&mut self, user_id: Uuid, today: NaiveDate) -> Result<(), TransitionError> {
        if self.date < today {
            return Err(TransitionError::TripInPast);
        }
        if self.status != TripStatus::Active {
            return Err(TransitionError::NotBookable(self.status));
        }
        if self.is_driver(user_id) {
            return Err(TransitionError::DriverOwnTrip);
        }
        if self.has_passenger(user_id) {
            return Err(TransitionError::AlreadyBooked);
        }
        if self.available_seats < 1 {
            // Unreachable while the seats/status invariant holds; kept as a
            // second line of defense so overbooking stays impossible.
            return Err(TransitionError::NoSeatsLeft);
        }

        self.passengers.push(user_id);
        self.available_seats -= 1;
        if self.available_seats == 0 {
            self.status = TripStatus::Full;
        }
        Ok(())
    }

    /// Give up a booked seat.
    ///
    /// A freed seat always reopens booking: a `full` trip drops back to
    /// `active` no matter how many seats it had.
    pub fn cancel_booking(&mut self, user_id: Uuid) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::BookingNotCancellable(self.status));
        }
        let Some(index) = self.passengers.iter().position(|p| *p == user_id) else {
            return Err(TransitionError::NotBooked);
        };

        self.passengers.remove(index);
        self.available_seats += 1;
        self.status = TripStatus::Active;
        Ok(())
    }

    /// Driver cancels the whole trip. Seats and passengers are left as they
    /// are; the terminal status is what blocks further changes.
    pub fn cancel(&mut self, user_id: Uuid, reason: Option<String>) -> Result<(), TransitionError> {
        if !self.is_driver(user_id) {
            return Err(TransitionError::CancelByNonDriver);
        }
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal(self.status));
        }

        self.status = TripStatus::Cancelled;
        self.cancellation_reason = reason;
        Ok(())
    }

    /// Driver marks the trip as ridden.
    pub fn complete(&mut self, user_id: Uuid) -> Result<(), TransitionError> {
        if !self.is_driver(user_id) {
            return Err(TransitionError::CompleteByNonDriver);
        }
        if self.status.is_terminal() {
            return Err(TransitionError::CompleteTerminal(self.status));
        }

        self.status = TripStatus::Completed;
        Ok(())
    }

    /// Rate a completed trip. Only passengers who rode it may rate, and only
    /// once.
    pub fn rate(&mut self, user_id: Uuid, value: u8) -> Result<(), TransitionError> {
        if !(1..=5).contains(&value) {
            return Err(TransitionError::RatingOutOfRange);
        }
        if self.status != TripStatus::Completed {
            return Err(TransitionError::RateBeforeCompletion);
        }
        if !self.has_passenger(user_id) {
            return Err(TransitionError::RateByNonPassenger);
        }
        if self.rating.is_some() {
            return Err(TransitionError::AlreadyRated);
        }

        self.rating = Some(value);
        Ok(())
    }
}
