pub mod account;
pub mod auth;
pub mod editor;
pub mod generation;
pub mod sites;

use axum::http::header::{CONTENT_SECURITY_POLICY, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use sitesmith_core::sanitize::SafeMarkup;

/// Serve sanitized markup as a standalone HTML document.
///
/// `Content-Security-Policy: sandbox` makes the browser treat the response
/// as a sandboxed frame with scripts disabled, a second layer behind the
/// sanitizer.
pub(crate) fn html_preview(markup: &SafeMarkup) -> Response {
    (
        [
            (CONTENT_TYPE, "text/html; charset=utf-8"),
            (CONTENT_SECURITY_POLICY, "sandbox"),
        ],
        markup.render(),
    )
        .into_response()
}
