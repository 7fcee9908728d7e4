//! Repository for the `users` table, including all credit mutations.
//!
//! Credit balances are only ever changed by single atomic statements; there
//! is deliberately no "read balance, write balance" method here.

use sqlx::PgPool;
use sitesmith_core::types::DbId;

use crate::models::user::{CreateUser, UpdateProfile, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, display_name, credits, credits_granted_at, created_at, updated_at";

/// Provides CRUD and credit operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user and its password credential in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, display_name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.display_name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_credentials (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(&input.password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update profile fields. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                display_name = COALESCE($3, display_name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.display_name)
            .fetch_optional(pool)
            .await
    }

    /// Provision a user with the initial credit grant.
    ///
    /// Upsert keyed by `id`: the grant is applied at most once per user
    /// (tracked by `credits_granted_at`), so repeating the call is harmless.
    pub async fn provision(
        pool: &PgPool,
        id: DbId,
        email: &str,
        grant: i32,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, credits, credits_granted_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                credits = CASE
                    WHEN users.credits_granted_at IS NULL THEN users.credits + EXCLUDED.credits
                    ELSE users.credits
                END,
                credits_granted_at = COALESCE(users.credits_granted_at, NOW())
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(email)
            .bind(grant)
            .fetch_one(pool)
            .await
    }

    /// Current credit balance, or `None` for an unknown user.
    pub async fn credits(pool: &PgPool, id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically deduct `amount` credits via the `deduct_credits` SQL
    /// function.
    ///
    /// Returns the new balance, or `None` when the balance is insufficient
    /// or the user does not exist.
    pub async fn deduct_credits(
        pool: &PgPool,
        id: DbId,
        amount: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i32>>("SELECT deduct_credits($1, $2)")
            .bind(id)
            .bind(amount)
            .fetch_one(pool)
            .await
    }

    /// Atomically return `amount` credits. Returns the new balance, or
    /// `None` for an unknown user.
    pub async fn refund_credits(
        pool: &PgPool,
        id: DbId,
        amount: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET credits = credits + $2 WHERE id = $1 RETURNING credits",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }
}
