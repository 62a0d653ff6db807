//! Punchclock - A state-managed HTTP service for server-synchronized work timers
//!
//! This is the main entry point for the punchclock application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use punchclock::{
    api::create_router,
    config::Config,
    services::{HttpServerClock, ServerClock, SystemServerClock},
    state::AppState,
    tasks::timer_tick_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("punchclock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting punchclock server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, tick={}s, time_endpoint={}",
        config.host,
        config.port,
        config.tick,
        config.time_endpoint.as_deref().unwrap_or("(local clock)")
    );

    // Pick the authoritative clock source
    let clock: Arc<dyn ServerClock> = match &config.time_endpoint {
        Some(endpoint) => Arc::new(HttpServerClock::new(endpoint.clone())),
        None => Arc::new(SystemServerClock),
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.tick,
        clock,
    ));

    // Measure the server clock offset once at startup; a failure is
    // non-fatal, the timer then runs on the unshifted local clock until a
    // later start re-attempts the measurement.
    match state.sync_server_offset().await {
        Ok(offset) => info!("Server clock offset: {:.3}s", offset),
        Err(e) => warn!("Could not measure server clock offset: {}", e),
    }

    // Start the timer tick background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        timer_tick_task(tick_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start - Start or resume the timer");
    info!("  POST /timer/stop  - Stop the timer and return the final value");
    info!("  GET  /status      - Check timer status and server info");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
