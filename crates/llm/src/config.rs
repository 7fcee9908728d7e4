use std::time::Duration;

/// Text-generation provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound for one completion call.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var            | Default                     |
    /// |--------------------|-----------------------------|
    /// | `OPENAI_API_KEY`   | (required)                  |
    /// | `OPENAI_BASE_URL`  | `https://api.openai.com/v1` |
    /// | `OPENAI_MODEL`     | `gpt-4`                     |
    /// | `LLM_TIMEOUT_SECS` | `90`                        |
    ///
    /// # Panics
    ///
    /// Panics if `OPENAI_API_KEY` is unset or `LLM_TIMEOUT_SECS` is not a
    /// valid integer.
    pub fn from_env() -> Self {
        let api_key =
            std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set in the environment");

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".into());

        let timeout_secs: u64 = std::env::var("LLM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "90".into())
            .parse()
            .expect("LLM_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
