//! REST client for the `/chat/completions` endpoint using [`reqwest`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitesmith_core::generation::{GenerationError, GenerationRequest, PromptMessage, TextGenerator};

use crate::config::LlmConfig;

/// HTTP client for one OpenAI-compatible provider.
#[derive(Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

/// Errors from the provider API layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    #[error("No API key configured")]
    MissingApiKey,
}

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, or an empty string if the provider
    /// returned none.
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}

impl OpenAiClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Run one chat completion and return the reply text.
    pub async fn chat_completion(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let parsed = response.json::<CompletionResponse>().await?;
        Ok(parsed.into_text())
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an [`LlmError::Api`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.chat_completion(request).await.map_err(|e| {
            tracing::error!(model = %self.config.model, error = %e, "Chat completion failed");
            GenerationError::Provider(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use sitesmith_core::chat::Transcript;

    use super::*;

    fn config(api_key: &str) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:9".into(),
            api_key: api_key.into(),
            model: "gpt-4".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn request_body_matches_wire_format() {
        let mut transcript = Transcript::new();
        transcript.push_user("a bakery").unwrap();
        let request = GenerationRequest::from_transcript(&transcript);

        let body = CompletionBody {
            model: "gpt-4",
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 1800);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "a bakery");
    }

    #[test]
    fn reply_text_is_first_choice_content() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"<h1>Hi</h1>"}},{"message":{"content":"other"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text(), "<h1>Hi</h1>");
    }

    #[test]
    fn missing_content_yields_empty_text() {
        for raw in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed.into_text(), "", "for {raw}");
        }
    }

    #[test]
    fn blank_api_key_is_rejected() {
        assert_matches!(OpenAiClient::new(config("  ")), Err(LlmError::MissingApiKey));
        assert!(OpenAiClient::new(config("sk-test")).is_ok());
    }
}
