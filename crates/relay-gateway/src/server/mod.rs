//! Gateway server setup
//!
//! Provides the WebSocket route, store wiring, the background sweep and shutdown.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use relay_common::{AppConfig, AppError};
use relay_db::InMemoryStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
///
/// Without a `DATABASE_URL` the gateway runs on an in-process store.
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let Some(database) = config.database.as_ref() else {
        tracing::warn!("DATABASE_URL not set; using the in-memory store");
        let store = Arc::new(InMemoryStore::with_worker(config.app.worker_id));
        return GatewayState::with_memory_store(config, store);
    };

    tracing::info!("Connecting to PostgreSQL...");
    let pool = relay_db::create_pool(&relay_db::DatabaseConfig::from(database))
        .await
        .map_err(AppError::database)?;
    tracing::info!("PostgreSQL connection established");

    let snowflake_generator = Arc::new(relay_core::SnowflakeGenerator::new(config.app.worker_id));

    let message_repo = Arc::new(relay_db::PgMessageRepository::new(
        pool.clone(),
        snowflake_generator,
    ));
    let conversation_repo = Arc::new(relay_db::PgConversationRepository::new(pool.clone()));
    let user_repo = Arc::new(relay_db::PgUserRepository::new(pool));

    GatewayState::new(config, message_repo, conversation_repo, user_repo)
}

/// Spawn the periodic typing expiry and presence retention sweep
pub fn spawn_sweeper(state: GatewayState) -> JoinHandle<()> {
    let period = state.config().relay.sweep_interval();
    let retention = state.config().relay.presence_retention();

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            state.typing().sweep();
            if let Some(retention) = retention {
                state.presence().evict_stale(retention);
            }
        }
    })
}

/// Serve the gateway on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(AppError::network)?;
    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    let sweeper = spawn_sweeper(state.clone());
    let result = axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::network(format!("Server error: {e}")));
    sweeper.abort();

    tracing::info!("Gateway stopped");
    result
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();
    let state = create_gateway_state(config).await?;

    tracing::info!("Starting Gateway server on {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::network(format!("Failed to bind to {addr}: {e}")))?;

    serve(listener, state, shutdown_signal()).await
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl-C received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
