use sitesmith_core::credits::INITIAL_CREDIT_GRANT;

use crate::auth::jwt::JwtConfig;
use crate::editor::DEFAULT_IDLE_TIMEOUT_MINS;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret, which must always be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Must exceed the
    /// text-generation timeout so a slow model reply is not cut off early.
    pub request_timeout_secs: u64,
    /// Credits granted by `init-user` (default: `10`).
    pub initial_credits: i32,
    /// Minutes an editor session may stay untouched before it is evicted
    /// (default: `120`).
    pub editor_idle_timeout_mins: i64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `INITIAL_CREDITS`      | `10`                       |
    /// | `EDITOR_IDLE_TIMEOUT_MINS` | `120`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let initial_credits: i32 = std::env::var("INITIAL_CREDITS")
            .unwrap_or_else(|_| INITIAL_CREDIT_GRANT.to_string())
            .parse()
            .expect("INITIAL_CREDITS must be a valid i32");
        assert!(initial_credits >= 0, "INITIAL_CREDITS must not be negative");

        let editor_idle_timeout_mins: i64 = std::env::var("EDITOR_IDLE_TIMEOUT_MINS")
            .unwrap_or_else(|_| DEFAULT_IDLE_TIMEOUT_MINS.to_string())
            .parse()
            .expect("EDITOR_IDLE_TIMEOUT_MINS must be a valid i64");
        assert!(
            editor_idle_timeout_mins > 0,
            "EDITOR_IDLE_TIMEOUT_MINS must be positive"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            initial_credits,
            editor_idle_timeout_mins,
            jwt,
        }
    }
}
