use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(anyhow::Error),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream failure after {attempts} attempt(s): {source}")]
    Upstream {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Whether error responses may carry underlying detail. Outside prod the
/// deployment is considered verbose.
fn verbose_errors() -> bool {
    std::env::var("ENVIRONMENT").map(|e| e != "prod").unwrap_or(true)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            error: String,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error, message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error".to_string(),
                err.to_string(),
                None,
                None,
            ),
            AppError::InvalidInput(err) => (
                StatusCode::BAD_REQUEST,
                "Invalid input".to_string(),
                err.to_string(),
                None,
                None,
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload too large".to_string(),
                msg,
                None,
                None,
            ),
            AppError::NotFound(err) => (
                StatusCode::NOT_FOUND,
                "Not found".to_string(),
                err.to_string(),
                None,
                None,
            ),
            AppError::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Feature not configured".to_string(),
                msg,
                None,
                None,
            ),
            AppError::Upstream { attempts, source } => {
                tracing::error!(attempts, error = %source, "Upstream AI backend failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream failure".to_string(),
                    format!("AI backend failed after {} attempt(s)", attempts),
                    verbose_errors().then(|| source.to_string()),
                    None,
                )
            }
            AppError::TooManyRequests(msg, retry) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
                msg,
                None,
                retry,
            ),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "An unexpected error occurred".to_string(),
                    verbose_errors().then(|| format!("{:#}", err)),
                    None,
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                    "Service is misconfigured".to_string(),
                    verbose_errors().then(|| err.to_string()),
                    None,
                )
            }
        };

        // Expected caller conditions are not failures.
        if status.is_client_error() {
            tracing::debug!(status = %status, error = %error, "Request rejected");
        }

        let mut res = (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                message,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
