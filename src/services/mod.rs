// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod booking;

pub use booking::{BookingService, CreateTripRequest};
