//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, TripListFilter};

/// Collection names as constants.
pub mod collections {
    pub const TRIPS: &str = "trips";
    pub const USERS: &str = "users";
}
