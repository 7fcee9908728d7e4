use std::net::SocketAddr;
use std::sync::Arc;

use sitesmith_api::config::ServerConfig;
use sitesmith_api::editor::sweep::start_idle_sweep;
use sitesmith_api::editor::EditorSessions;
use sitesmith_api::router::build_app_router;
use sitesmith_api::state::AppState;
use sitesmith_core::generation::GenerationOrchestrator;
use sitesmith_llm::{LlmConfig, OpenAiClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitesmith_api=debug,sitesmith_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let llm_config = LlmConfig::from_env();
    tracing::info!(model = %llm_config.model, base_url = %llm_config.base_url, "Loaded text-generation configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sitesmith_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sitesmith_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    sitesmith_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Text generation ---
    let client = OpenAiClient::new(llm_config).expect("Failed to build text-generation client");
    let generator = GenerationOrchestrator::new(Arc::new(client));

    // --- App state ---
    let editor_sessions = Arc::new(EditorSessions::with_idle_timeout(
        chrono::Duration::minutes(config.editor_idle_timeout_mins),
    ));
    let sweep_handle = start_idle_sweep(Arc::clone(&editor_sessions));
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        generator,
        editor_sessions: Arc::clone(&editor_sessions),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    sweep_handle.abort();
    let open_sessions = editor_sessions.len().await;
    tracing::info!(open_sessions, "Server stopped, discarding editor sessions");
    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
