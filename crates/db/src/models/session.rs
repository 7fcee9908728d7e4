//! Sign-in sessions.
//!
//! Every sign-in or refresh opens one row. Access tokens name their row, so
//! a revoked or expired row locks the token out of saving.

use serde::Serialize;
use sqlx::FromRow;
use sitesmith_core::types::{DbId, Timestamp};

/// A row of `user_sessions`. Serializes without the refresh token digest,
/// for the account's session list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A session about to be opened.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
