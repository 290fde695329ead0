use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::BotConfig;
use crate::services::Services;
use crate::signature::SignatureVerifier;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    /// Checks interaction signatures against the application key.
    pub verifier: Arc<SignatureVerifier>,
    pub services: Arc<Services>,
    /// Background command tasks, waited on during shutdown.
    pub tasks: TaskTracker,
    /// Cancelled on shutdown; every command task watches a child token.
    pub shutdown: CancellationToken,
}
