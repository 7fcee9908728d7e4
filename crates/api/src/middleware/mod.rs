//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthUser`] resolves the account and sign-in session from a Bearer token.
//! - [`client::ClientInfo`] captures the caller's user agent and address for session rows.

pub mod auth;
pub mod client;
