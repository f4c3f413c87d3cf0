// SPDX-License-Identifier: MIT

//! Admin moderation routes.
//!
//! All routes here sit behind `require_auth` + `require_admin` (applied in
//! routes/mod.rs). Admins can inspect users, toggle bans, and remove users
//! or trips from the marketplace.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Trip, User};
use crate::routes::ApiResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/trips", get(user_trips))
        .route("/admin/users/{id}/ban", put(toggle_ban))
        .route("/admin/users/{id}", delete(delete_user))
        .route("/admin/trips/{id}", delete(delete_trip))
}

fn parse_user_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid User ID format".to_string()))
}

fn parse_trip_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid Trip ID format".to_string()))
}

/// All users except the calling admin.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users: Vec<User> = state
        .db
        .list_users()
        .await?
        .into_iter()
        .filter(|u| u.user_id != admin.user_id)
        .collect();

    Ok(ApiResponse::ok(users))
}

/// Trips driven by a given user.
async fn user_trips(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Trip>>>> {
    let user_id = parse_user_id(&id)?;
    let trips = state.db.trips_for_driver(user_id).await?;
    Ok(ApiResponse::ok(trips))
}

/// Toggle a user's ban flag.
async fn toggle_ban(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user_id = parse_user_id(&id)?;

    if user_id == admin.user_id {
        return Err(AppError::InvalidInput(
            "Admin cannot ban themselves".to_string(),
        ));
    }

    let mut user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    user.is_banned = !user.is_banned;
    state.db.upsert_user(&user).await?;

    let message = if user.is_banned {
        "User banned successfully"
    } else {
        "User unbanned successfully"
    };

    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %user_id,
        is_banned = user.is_banned,
        "Ban status toggled"
    );

    Ok(ApiResponse::ok_with_message(user, message))
}

/// Delete a user and every trip they drive.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let user_id = parse_user_id(&id)?;

    if user_id == admin.user_id {
        return Err(AppError::InvalidInput(
            "Admin cannot delete their own account".to_string(),
        ));
    }

    if state.db.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let deleted = state.db.delete_user_and_trips(user_id).await?;

    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %user_id,
        deleted_documents = deleted,
        "User removed by admin"
    );

    Ok(ApiResponse::message("User deleted successfully"))
}

/// Delete a trip outright.
async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let trip_id = parse_trip_id(&id)?;

    if state.db.get_trip(trip_id).await?.is_none() {
        return Err(AppError::NotFound("Trip not found".to_string()));
    }

    state.db.delete_trip(trip_id).await?;

    tracing::info!(admin_id = %admin.user_id, trip_id = %trip_id, "Trip removed by admin");

    Ok(ApiResponse::message("Trip deleted successfully"))
}
