//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::realtime::RealtimeHub;
use crate::config::Settings;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<RealtimeHub>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create state with a fresh, not yet initialized realtime hub
    pub fn new(settings: Settings) -> Self {
        let hub = Arc::new(RealtimeHub::new(&settings.realtime));
        Self {
            hub,
            settings: Arc::new(settings),
        }
    }
}

/// Build the full router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors_layer)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let state = AppState::new(settings);
        tracing::info!(
            typing_timeout_ms = state.settings.realtime.typing_timeout_ms,
            "Realtime hub created"
        );

        let router = build_router(state.clone());

        // Bind to address
        let listener = TcpListener::bind(state.settings.server_addr()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        // Collaborators may emit from here on
        self.state.hub.initialize()?;

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
