//! Queries over `user_sessions`.
//!
//! "Live" below means not revoked and not yet expired.

use sqlx::PgPool;
use sitesmith_core::types::DbId;

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                       user_agent, ip_address, created_at, updated_at";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Revoke the live session holding this refresh token digest and return
    /// it. Claiming in one statement keeps a token from being redeemed twice
    /// by concurrent refresh calls.
    pub async fn claim_by_refresh_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = true, updated_at = NOW()
             WHERE refresh_token_hash = $1
               AND is_revoked = false
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Whether session `id` is live and belongs to `user_id`.
    pub async fn is_live(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM user_sessions
                WHERE id = $1 AND user_id = $2 AND is_revoked = false AND expires_at > NOW()
             )",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// The user's live sessions, newest first.
    pub async fn list_live_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1 AND is_revoked = false AND expires_at > NOW()
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Revoke every live session of the user. Returns how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true, updated_at = NOW()
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
