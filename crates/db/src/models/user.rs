//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitesmith_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Password hashes live in `user_credentials`, so this row is safe to
/// serialize to API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: Option<String>,
    pub credits: i32,
    pub credits_granted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user together with its password credential.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
}

/// DTO for a profile update. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
}
