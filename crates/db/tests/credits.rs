//! Credit balance operations against a real database.

use sqlx::PgPool;
use sitesmith_db::models::user::CreateUser;
use sitesmith_db::repositories::UserRepo;

async fn user_with_credits(pool: &PgPool, email: &str, credits: i32) -> i64 {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: None,
            password_hash: "$argon2id$test".to_string(),
        },
    )
    .await
    .unwrap();
    sqlx::query("UPDATE users SET credits = $2 WHERE id = $1")
        .bind(user.id)
        .bind(credits)
        .execute(pool)
        .await
        .unwrap();
    user.id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deduct_returns_new_balance(pool: PgPool) {
    let id = user_with_credits(&pool, "a@example.com", 5).await;

    let remaining = UserRepo::deduct_credits(&pool, id, 1).await.unwrap();

    assert_eq!(remaining, Some(4));
    assert_eq!(UserRepo::credits(&pool, id).await.unwrap(), Some(4));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn insufficient_balance_is_left_unchanged(pool: PgPool) {
    let id = user_with_credits(&pool, "b@example.com", 0).await;

    assert_eq!(UserRepo::deduct_credits(&pool, id, 1).await.unwrap(), None);
    assert_eq!(UserRepo::credits(&pool, id).await.unwrap(), Some(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_user_cannot_be_charged(pool: PgPool) {
    assert_eq!(UserRepo::deduct_credits(&pool, 424242, 1).await.unwrap(), None);
    assert_eq!(UserRepo::refund_credits(&pool, 424242, 1).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_deductions_never_overspend(pool: PgPool) {
    let id = user_with_credits(&pool, "c@example.com", 1).await;

    let (a, b) = tokio::join!(
        UserRepo::deduct_credits(&pool, id, 1),
        UserRepo::deduct_credits(&pool, id, 1),
    );

    let applied = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(applied, 1);
    assert_eq!(UserRepo::credits(&pool, id).await.unwrap(), Some(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_adds_back(pool: PgPool) {
    let id = user_with_credits(&pool, "d@example.com", 2).await;

    assert_eq!(UserRepo::refund_credits(&pool, id, 1).await.unwrap(), Some(3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn provision_grants_only_once(pool: PgPool) {
    let id = user_with_credits(&pool, "e@example.com", 0).await;

    let first = UserRepo::provision(&pool, id, "e@example.com", 10).await.unwrap();
    assert_eq!(first.credits, 10);
    assert!(first.credits_granted_at.is_some());

    UserRepo::deduct_credits(&pool, id, 3).await.unwrap();
    let second = UserRepo::provision(&pool, id, "e@example.com", 10).await.unwrap();
    assert_eq!(second.credits, 7);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn email_lookup_is_case_insensitive(pool: PgPool) {
    let id = user_with_credits(&pool, "Mixed@Example.com", 0).await;

    let found = UserRepo::find_by_email(&pool, "mixed@example.COM")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
}
