// SPDX-License-Identifier: MIT

use kaddad_backend::config::Config;
use kaddad_backend::db::FirestoreDb;
use kaddad_backend::routes::create_router;
use kaddad_backend::services::BookingService;
use kaddad_backend::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let booking = BookingService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        booking,
    });

    (create_router(state.clone()), state)
}

/// Mint a signed session token for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, is_admin: bool, signing_key: &[u8]) -> String {
    kaddad_backend::middleware::auth::create_jwt(user_id, is_admin, signing_key)
        .expect("Failed to sign test JWT")
}
