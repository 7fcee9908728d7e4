//! Generation orchestrator.
//!
//! Turns a page transcript into a request for the external text-generation
//! collaborator, splits the reply into HTML and CSS, and appends the reply
//! to the transcript as a new assistant turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::chat::{Role, Transcript};
use crate::style::split_style;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed instruction prepended to every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert web developer. Generate a modern, \
     responsive landing page using HTML with embedded CSS styling. Return only the HTML and CSS.";

/// Moderate temperature: stylistic variety, stable enough for iterative refinement.
pub const GENERATION_TEMPERATURE: f32 = 0.7;

/// Upper bound on generated output, in tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 1800;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Role of a message sent to the text-generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<Role> for PromptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Assistant,
        }
    }
}

/// A role-tagged message in a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

/// Everything the text-generation collaborator needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// System instruction followed by every transcript turn in order.
    pub fn from_transcript(transcript: &Transcript) -> Self {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(PromptMessage {
            role: PromptRole::System,
            content: SYSTEM_INSTRUCTION.to_string(),
        });
        messages.extend(transcript.turns().iter().map(|turn| PromptMessage {
            role: turn.role().into(),
            content: turn.message().to_string(),
        }));
        Self {
            messages,
            temperature: GENERATION_TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// HTML and CSS parsed from one generation reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSite {
    pub html: String,
    pub css: String,
}

/// Errors from a generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Cannot generate from an empty transcript")]
    EmptyTranscript,

    /// The collaborator failed (network, timeout, quota, malformed reply).
    #[error("Text generation failed: {0}")]
    Provider(String),
}

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// External text-generation collaborator: prompt in, single text blob out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one generation round-trip over a transcript.
///
/// No retry is performed; the caller decides whether to resubmit.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate from `transcript` and append the reply as an assistant turn.
    ///
    /// The appended turn's message equals the returned `html`. On error the
    /// transcript is left untouched.
    pub async fn generate(
        &self,
        transcript: &mut Transcript,
    ) -> Result<GeneratedSite, GenerationError> {
        if transcript.is_empty() {
            return Err(GenerationError::EmptyTranscript);
        }

        let request = GenerationRequest::from_transcript(transcript);
        tracing::debug!(
            turns = transcript.len(),
            max_tokens = request.max_tokens,
            "Requesting site generation"
        );

        let reply = self.generator.complete(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "Site generation failed");
            e
        })?;

        let (html, css) = split_style(&reply);
        transcript.push_assistant(html.clone());

        tracing::debug!(
            html_len = html.len(),
            css_len = css.len(),
            "Site generation complete"
        );
        Ok(GeneratedSite { html, css })
    }
}
