//! Repository for the `user_credentials` table.

use sqlx::PgPool;
use sitesmith_core::types::DbId;

/// Password credential lookups. Rows are created by [`super::UserRepo::create`].
pub struct CredentialRepo;

impl CredentialRepo {
    /// The stored Argon2id PHC hash for a user.
    pub async fn find_password_hash(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM user_credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
