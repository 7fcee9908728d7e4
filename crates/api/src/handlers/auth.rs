//! Handlers for the `/auth` resource: accounts, sign-in sessions and the profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitesmith_core::error::CoreError;
use sitesmith_core::types::DbId;
use sitesmith_db::models::session::{CreateSession, UserSession};
use sitesmith_db::models::user::{CreateUser, UpdateProfile, User};
use sitesmith_db::repositories::{CredentialRepo, SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sign-up`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Request body for `PUT /auth/me`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

/// Successful authentication response returned by sign-up, sign-in and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/sign-up
///
/// Create an account and sign it in. Credits are granted separately by
/// `init-user`.
pub async fn sign_up(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidJson(input): ValidJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email.trim().to_string(),
            display_name: input.display_name,
            password_hash,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, "User signed up");

    let response = create_auth_response(&state, user, client).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidJson(input): ValidJson<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let hash = CredentialRepo::find_password_hash(&state.pool, user.id)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Sign-in rejected: wrong password");
        return Err(invalid());
    }

    let response = create_auth_response(&state, user, client).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new token pair. The presented session is
/// revoked and a new one opened, so access tokens issued under the old
/// session can no longer save.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidJson(input): ValidJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::claim_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let response = create_auth_response(&state, user, client).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Sign the account out everywhere: every live session is revoked.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::info!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/sessions
///
/// The account's live sign-in sessions, newest first.
pub async fn sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<UserSession>>> {
    let sessions = SessionRepo::list_live_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(sessions))
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<User>> {
    let user = find_user(&state, auth_user.user_id).await?;
    Ok(Json(user))
}

/// PUT /api/v1/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidJson(input): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let patch = UpdateProfile {
        email: input.email.map(|e| e.trim().to_string()),
        display_name: input.display_name,
    };
    let user = UserRepo::update_profile(&state.pool, auth_user.user_id, &patch)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth_user.user_id,
        }))?;
    Ok(Json(user))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

/// Open a sign-in session for `user` and issue the token pair bound to it.
async fn create_auth_response(
    state: &AppState,
    user: User,
    client: ClientInfo,
) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash: refresh_hash,
            expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
            user_agent: client.user_agent,
            ip_address: client.ip_address,
        },
    )
    .await?;
    tracing::debug!(user_id = user.id, session_id = session.id, "Sign-in session opened");

    let access_token = generate_access_token(user.id, session.id, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: jwt.access_token_ttl_secs(),
        user,
    })
}
