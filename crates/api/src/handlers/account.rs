//! Credit handlers: `init-user`, `deduct-credits`, and the balance lookup.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitesmith_core::credits::validate_deduction_amount;
use sitesmith_core::error::CoreError;
use sitesmith_core::types::DbId;
use sitesmith_db::repositories::UserRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /init-user`.
#[derive(Debug, Deserialize, Validate)]
pub struct InitUserRequest {
    pub user_id: DbId,
    #[validate(email)]
    pub email: String,
}

/// Request body for `POST /deduct-credits`.
///
/// A non-numeric `amount` fails deserialization and is rejected as 400.
#[derive(Debug, Deserialize, Validate)]
pub struct DeductCreditsRequest {
    pub user_id: DbId,
    pub amount: i32,
}

#[derive(Debug, Serialize)]
pub struct InitUserResponse {
    pub success: bool,
    pub credits: i32,
}

#[derive(Debug, Serialize)]
pub struct DeductCreditsResponse {
    pub success: bool,
    pub credits: i32,
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i32,
}

/// POST /api/v1/init-user
///
/// Grant the initial credit balance. The grant is applied once per user;
/// repeating the call returns the current balance unchanged.
pub async fn init_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<InitUserRequest>,
) -> AppResult<Json<InitUserResponse>> {
    ensure_self(&auth_user, input.user_id)?;

    let user = UserRepo::provision(
        &state.pool,
        input.user_id,
        input.email.trim(),
        state.config.initial_credits,
    )
    .await?;
    tracing::info!(user_id = user.id, credits = user.credits, "User provisioned");

    Ok(Json(InitUserResponse {
        success: true,
        credits: user.credits,
    }))
}

/// POST /api/v1/deduct-credits
pub async fn deduct_credits(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<DeductCreditsRequest>,
) -> AppResult<Json<DeductCreditsResponse>> {
    ensure_self(&auth_user, input.user_id)?;
    validate_deduction_amount(input.amount)?;

    let credits = UserRepo::deduct_credits(&state.pool, input.user_id, input.amount)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InsufficientCredits(format!(
                "Balance is below {}",
                input.amount
            )))
        })?;
    tracing::info!(user_id = input.user_id, amount = input.amount, credits, "Credits deducted");

    Ok(Json(DeductCreditsResponse {
        success: true,
        credits,
    }))
}

/// GET /api/v1/credits
pub async fn get_credits(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<CreditsResponse>> {
    let credits = UserRepo::credits(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;
    Ok(Json(CreditsResponse { credits }))
}

/// Users may only act on their own balance.
fn ensure_self(auth_user: &AuthUser, user_id: DbId) -> Result<(), AppError> {
    if auth_user.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot act on another user's credits".into(),
        )));
    }
    Ok(())
}
