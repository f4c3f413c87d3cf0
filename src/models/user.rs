//! User model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User profile stored in Firestore.
///
/// Credentials live with the external identity provider; this record only
/// carries profile data and the moderation flags the admin API works on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub user_id: Uuid,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact phone number
    pub phone: String,
    /// Email address
    pub email: String,
    /// Whether the user has the admin role
    pub is_admin: bool,
    /// Whether an admin has banned this user
    pub is_banned: bool,
    /// When the account was created (RFC3339)
    pub created_at: String,
}
