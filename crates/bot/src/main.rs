use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelbot_bot::commands::definitions;
use reelbot_bot::config::BotConfig;
use reelbot_bot::discord::DiscordClient;
use reelbot_bot::routes;
use reelbot_bot::services::Services;
use reelbot_bot::signature::SignatureVerifier;
use reelbot_bot::state::AppState;
use reelbot_providers::http::{build_client, REQUEST_TIMEOUT};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reelbot_bot=debug,reelbot_pipeline=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = BotConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        host = %config.host,
        port = config.port,
        narration = config.narration.is_some(),
        "Loaded bot configuration"
    );

    let verifier = SignatureVerifier::from_hex(&config.discord.public_key)
        .expect("DISCORD_PUBLIC_KEY is not a valid Ed25519 public key");

    // --- Clients ---
    let http = build_client(REQUEST_TIMEOUT).expect("Failed to build HTTP client");
    let discord = DiscordClient::new(
        http.clone(),
        config.discord.application_id.clone(),
        config.discord.bot_token.clone(),
    );

    if config.register_commands {
        let commands = definitions::all(config.narration.is_some());
        match discord.register_commands(&commands).await {
            Ok(count) => tracing::info!(count, "Slash commands registered"),
            Err(e) => tracing::error!(error = %e, "Slash command registration failed"),
        }
    }

    // --- App state ---
    let services = Services::from_config(&config, http, Arc::new(discord));
    let tasks = TaskTracker::new();
    let shutdown = CancellationToken::new();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    let state = AppState {
        config: Arc::new(config.clone()),
        verifier: Arc::new(verifier),
        services: Arc::new(services),
        tasks: tasks.clone(),
        shutdown: shutdown.clone(),
    };

    let app = routes::build_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(active = tasks.len(), "Server stopped accepting connections, cancelling commands");
    shutdown.cancel();
    tasks.close();
    if tokio::time::timeout(shutdown_timeout, tasks.wait()).await.is_err() {
        tracing::warn!(active = tasks.len(), "Commands still running at shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
