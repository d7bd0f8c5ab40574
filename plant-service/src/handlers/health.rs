use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Reports degraded when the AI backend is unconfigured;
/// the catalog endpoints remain fully operational either way.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let gemini_configured = state.gateway.is_configured();

    let status = if gemini_configured { "healthy" } else { "degraded" };

    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "service": "plant-service",
            "version": env!("CARGO_PKG_VERSION"),
            "services": {
                "api": "operational",
                "gemini": if gemini_configured { "operational" } else { "not_configured" },
                "chat": if gemini_configured { "operational" } else { "degraded" },
                "scan": if gemini_configured { "operational" } else { "degraded" },
                "plants": "operational",
            },
            "catalog_size": state.catalog.len(),
        })),
    )
}

/// Readiness probe: the catalog is embedded, so the service is ready as soon
/// as it is serving.
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
