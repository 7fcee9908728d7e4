//! Domain types and pure logic for the Sitesmith website builder.
//!
//! Everything here is independent of HTTP and PostgreSQL: the external
//! collaborators (text generation, persistence) are reached through the
//! [`generation::TextGenerator`] and [`save::SaveStore`] traits.

pub mod chat;
pub mod credits;
pub mod error;
pub mod generation;
pub mod project;
pub mod sanitize;
pub mod save;
pub mod style;
pub mod types;
