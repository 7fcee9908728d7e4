//! `AppError` to HTTP response mapping, without a server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use sitesmith_api::error::AppError;
use sitesmith_core::error::CoreError;
use sitesmith_core::generation::GenerationError;
use sitesmith_core::save::SaveError;
use uuid::Uuid;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Website",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Website with id 42 not found");
}

#[tokio::test]
async fn unknown_page_and_session_return_404() {
    for err in [
        CoreError::PageNotFound(Uuid::new_v4()),
        CoreError::SessionNotFound(Uuid::new_v4()),
    ] {
        let (status, json) = error_to_response(AppError::Core(err)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn validation_and_bad_request_return_400() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Validation("name empty".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = error_to_response(AppError::BadRequest("bad json".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "bad json");
}

#[tokio::test]
async fn insufficient_credits_return_402() {
    let (status, json) = error_to_response(AppError::Save(SaveError::InsufficientCredits)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "INSUFFICIENT_CREDITS");

    let (status, _) = error_to_response(AppError::Core(CoreError::InsufficientCredits(
        "Balance is below 5".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn unauthenticated_save_returns_401() {
    let (status, json) = error_to_response(AppError::Save(SaveError::Unauthenticated)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn provider_failure_message_is_shown() {
    let err = AppError::Generation(GenerationError::Provider("quota exceeded".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "GENERATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn empty_transcript_is_a_client_error() {
    let (status, _) = error_to_response(AppError::Generation(GenerationError::EmptyTranscript)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn persistence_failure_reports_refund_and_site() {
    let err = AppError::Save(SaveError::Persistence {
        message: "Failed to save chat history: disk full".into(),
        site_id: Some(7),
        refunded: true,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("disk full"));
    assert!(message.contains("refunded"));
    assert!(message.contains("site 7"));
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret stack trace".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
