//! Application startup and lifecycle management.

use crate::config::{GenerationSettings, JokeConfig, ProviderKind};
use crate::handlers::joke::tell_joke;
use crate::services::providers::{mock::MockTextProvider, vertex::VertexTextProvider};
use crate::services::TextProvider;
use axum::{
    body::Body,
    http::Request,
    middleware::from_fn,
    routing::any,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{request_id_middleware, request_span};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn new(text_provider: Arc<dyn TextProvider>) -> Self {
        Self { text_provider }
    }
}

/// Construct the provider selected by `GENAI_PROVIDER`.
pub fn build_text_provider(
    settings: &GenerationSettings,
) -> Result<Arc<dyn TextProvider>, AppError> {
    let provider: Arc<dyn TextProvider> = match settings.provider {
        ProviderKind::Vertex => {
            let provider = VertexTextProvider::new(settings)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            tracing::info!(
                model = %settings.model,
                location = %settings.location,
                static_token = settings.access_token.is_some(),
                "Initialized Vertex AI text provider"
            );
            Arc::new(provider)
        }
        ProviderKind::Mock => {
            tracing::warn!("Using mock text provider");
            Arc::new(MockTextProvider::default())
        }
    };

    Ok(provider)
}

/// Every method on every path goes to the joke handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(tell_joke))
        .fallback(tell_joke)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| request_span(request)),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Bind the listener on all interfaces. Port 0 picks a free port.
    pub async fn build(
        config: JokeConfig,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Dad-joke service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(AppState::new(text_provider)),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the listener fails.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            e
        })
    }
}
