//! JSON body extractor with field validation.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use sitesmith_core::error::CoreError;
use validator::Validate;

use crate::error::AppError;

/// Like [`axum::Json`], but malformed bodies become `400 BAD_REQUEST` in
/// the standard error envelope and the payload is run through
/// [`Validate`] (`400 VALIDATION_ERROR`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
        Ok(ValidJson(value))
    }
}
