//! Application startup and lifecycle management.
//!
//! The composition root: catalog and gateway are constructed here and
//! injected into handlers through `AppState`. Nothing is a global.

use crate::config::PlantConfig;
use crate::handlers::{chat, health, plants, scan};
use crate::services::gateway::gemini::GeminiBackend;
use crate::services::gateway::GenerationParams;
use crate::services::{AiGateway, PlantCatalog};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::{per_minute_rate_limiter, rate_limit_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: PlantConfig,
    pub catalog: Arc<PlantCatalog>,
    pub gateway: Arc<AiGateway>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Build the application with the backend implied by the configuration:
    /// a real Gemini backend when an API key is present, the unconfigured
    /// gateway otherwise.
    pub async fn build(config: PlantConfig) -> Result<Self, AppError> {
        let gateway = if config.gemini_configured() {
            let backend = GeminiBackend::new(
                config.gemini.api_key.clone(),
                config.gemini.model.clone(),
            )
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("HTTP client: {}", e)))?;

            tracing::info!(model = %config.gemini.model, "Initialized Gemini backend");

            AiGateway::new(
                Arc::new(backend),
                GenerationParams {
                    temperature: config.gemini.temperature,
                    max_output_tokens: config.gemini.max_output_tokens,
                },
            )
        } else {
            tracing::warn!("GEMINI_API_KEY not set: AI features will fail fast as unconfigured");
            AiGateway::unconfigured()
        };

        Self::build_with_gateway(config, Arc::new(gateway)).await
    }

    /// Build with an explicit gateway. Used by tests to substitute a
    /// scripted backend.
    pub async fn build_with_gateway(
        config: PlantConfig,
        gateway: Arc<AiGateway>,
    ) -> Result<Self, AppError> {
        let catalog = PlantCatalog::load_embedded()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("plant catalog: {}", e)))?;

        tracing::info!(plants = catalog.len(), "Loaded plant catalog");

        let state = AppState {
            config: config.clone(),
            catalog: Arc::new(catalog),
            gateway,
        };

        let limiter = per_minute_rate_limiter(config.limits.rate_limit_per_minute);

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/health", get(health::health_check))
            .route("/ready", get(health::readiness_check))
            .route("/api/v1/chat/message", post(chat::send_message))
            .route("/api/v1/chat/quick-advice", post(chat::quick_advice))
            .route("/api/v1/chat/suggestions", get(chat::suggestions))
            .route("/api/v1/scan/identify", post(scan::identify_plant))
            .route("/api/v1/scan/validate/:plant_name", post(scan::validate_plant))
            .route("/api/v1/plants/list", get(plants::list_plants))
            .route("/api/v1/plants/search", get(plants::search_plants))
            .route("/api/v1/plants/stats/overview", get(plants::catalog_stats))
            .route(
                "/api/v1/plants/by-condition/:condition",
                get(plants::plants_by_condition),
            )
            .route("/api/v1/plants/:plant_id", get(plants::get_plant))
            // Multipart bodies need headroom beyond the raw image bytes.
            .layer(DefaultBodyLimit::max(
                config.limits.max_upload_bytes + 64 * 1024,
            ))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        // Port 0 = random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
