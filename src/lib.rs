// SPDX-License-Identifier: MIT

//! KADDAD+ ride-sharing marketplace backend.
//!
//! Drivers publish trips, passengers book and cancel seats, and admins
//! moderate users and trips. Trip state lives in Firestore; every booking
//! transition runs as an atomic read-modify-write on the trip document.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::BookingService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub booking: BookingService,
}
