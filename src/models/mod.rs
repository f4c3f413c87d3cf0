// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod trip;
pub mod user;

pub use trip::{TransitionError, Trip, TripStatus};
pub use user::User;
