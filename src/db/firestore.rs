// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Trips (documents embedding the passenger list)
//! - Users (profiles + moderation flags)
//!
//! Every booking transition goes through [`FirestoreDb::update_trip`], which
//! runs the read-check-mutate-write cycle inside a single transaction so two
//! concurrent requests can never both act on the same stale seat count.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{TransitionError, Trip, TripStatus, User};
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 50;
/// Commit attempts per trip transition before giving up on a contended
/// document. Guard rejections never retry; only lost commit races do.
const MAX_TXN_ATTEMPTS: u32 = 5;

/// Filters for the public trip listing.
#[derive(Debug, Clone, Default)]
pub struct TripListFilter {
    /// Trip status to match (listing defaults to `active`)
    pub status: Option<TripStatus>,
    /// Exact departure date
    pub date: Option<NaiveDate>,
    /// Lower bound on departure date (used to hide past trips)
    pub date_from: Option<NaiveDate>,
    /// Minimum free seats
    pub min_seats: Option<u32>,
    pub limit: u32,
    pub offset: u32,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator connection skips real credentials so local runs don't
        // touch (or leak) developer credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // A dummy JWT satisfies the SDK's token plumbing; the emulator never
        // verifies it.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Trip Operations ─────────────────────────────────────────

    /// Get a trip by ID.
    pub async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&trip_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a newly created trip. Fails if the document already exists.
    pub async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let _: Trip = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::TRIPS)
            .document_id(trip.trip_id.to_string())
            .object(trip)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically apply a state transition to a trip.
    ///
    /// The trip is read, mutated, and written back inside one transaction, so
    /// the guards in `apply` are always evaluated against the state being
    /// replaced — never a stale read. A commit that loses a race against a
    /// concurrent writer is retried with freshly read state; a guard rejection
    /// rolls back and surfaces immediately, because retrying cannot make an
    /// illegal transition legal.
    ///
    /// Returns the updated trip as persisted.
    pub async fn update_trip<F>(&self, trip_id: Uuid, apply: F) -> Result<Trip, AppError>
    where
        F: Fn(&mut Trip) -> Result<(), TransitionError>,
    {
        let client = self.get_client()?;
        let doc_id = trip_id.to_string();

        let mut attempt = 1;
        loop {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            // Read the current state; this registers the document for
            // conflict detection at commit time.
            let current: Option<Trip> = client
                .fluent()
                .select()
                .by_id_in(collections::TRIPS)
                .obj()
                .one(&doc_id)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to read trip in transaction: {}", e))
                })?;

            let Some(mut trip) = current else {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound("Trip not found".to_string()));
            };

            if let Err(rejection) = apply(&mut trip) {
                // Guard failed against the current state: nothing to write.
                let _ = transaction.rollback().await;
                return Err(rejection.into());
            }

            trip.updated_at = crate::time_utils::now_rfc3339();

            client
                .fluent()
                .update()
                .in_col(collections::TRIPS)
                .document_id(&doc_id)
                .object(&trip)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add trip to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => {
                    tracing::debug!(
                        trip_id = %doc_id,
                        status = %trip.status,
                        available_seats = trip.available_seats,
                        "Trip transition committed"
                    );
                    return Ok(trip);
                }
                Err(err) if attempt < MAX_TXN_ATTEMPTS => {
                    tracing::warn!(
                        trip_id = %doc_id,
                        attempt,
                        error = %err,
                        "Trip commit lost a race, retrying with fresh state"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed after {} attempts: {}",
                        attempt, err
                    )));
                }
            }
        }
    }

    /// List trips for the public search, sorted by date then departure time.
    ///
    /// Structured filters run server-side; free-text origin/destination
    /// matching happens in the query layer on the fetched page (Firestore has
    /// no substring queries).
    pub async fn list_trips(&self, filter: &TripListFilter) -> Result<Vec<Trip>, AppError> {
        let status = filter.status.unwrap_or(TripStatus::Active).to_string();
        let date = filter.date.map(|d| d.to_string());
        let date_from = filter.date_from.map(|d| d.to_string());
        let min_seats = filter.min_seats;

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| {
                q.for_all([
                    q.field("status").eq(status.clone()),
                    date.clone().and_then(|d| q.field("date").eq(d)),
                    date_from
                        .clone()
                        .and_then(|d| q.field("date").greater_than_or_equal(d)),
                    min_seats
                        .and_then(|n| q.field("available_seats").greater_than_or_equal(n)),
                ])
            })
            .order_by([
                ("date", firestore::FirestoreQueryDirection::Ascending),
                (
                    "departure_time",
                    firestore::FirestoreQueryDirection::Ascending,
                ),
            ])
            .limit(filter.limit)
            .offset(filter.offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get trips published by a driver, newest first.
    pub async fn trips_for_driver(&self, driver_id: Uuid) -> Result<Vec<Trip>, AppError> {
        let driver = driver_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("driver_id").eq(driver.clone()))
            .order_by([
                ("date", firestore::FirestoreQueryDirection::Descending),
                (
                    "departure_time",
                    firestore::FirestoreQueryDirection::Descending,
                ),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get trips a user has booked a seat on, newest first.
    pub async fn trips_for_passenger(&self, user_id: Uuid) -> Result<Vec<Trip>, AppError> {
        let passenger = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("passengers").array_contains(passenger.clone()))
            .order_by([
                ("date", firestore::FirestoreQueryDirection::Descending),
                (
                    "departure_time",
                    firestore::FirestoreQueryDirection::Descending,
                ),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a trip (admin moderation).
    pub async fn delete_trip(&self, trip_id: Uuid) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TRIPS)
            .document_id(trip_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.user_id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all users (admin view).
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user and every trip they drive (admin moderation).
    ///
    /// Trips the user merely booked are left alone; their seat is freed the
    /// next time the trip document is touched, not here.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_and_trips(&self, user_id: Uuid) -> Result<usize, AppError> {
        let client = self.get_client()?;

        let trips = self.trips_for_driver(user_id).await?;
        let trip_count = trips.len();

        stream::iter(trips)
            .map(|trip| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::TRIPS)
                    .document_id(trip.trip_id.to_string())
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(user_id = %user_id, count = trip_count, "Deleted user's trips");

        client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = %user_id, deleted_trips = trip_count, "User deletion complete");

        Ok(trip_count + 1)
    }
}
