//! Client for OpenAI-compatible chat-completion APIs.
//!
//! [`OpenAiClient`] implements [`sitesmith_core::generation::TextGenerator`],
//! so the generation orchestrator never depends on a particular provider.

pub mod client;
pub mod config;

pub use client::{LlmError, OpenAiClient};
pub use config::LlmConfig;
