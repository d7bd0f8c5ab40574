use crate::dtos::{IdentifyResponse, ValidateResponse};
use crate::services::PlantValidation;
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

/// Multipart reads fail with a length-limit error when the body blows the
/// request size cap; that is an oversize upload, not a malformed request.
fn map_multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "Image must not exceed {}MB",
            max_bytes / 1024 / 1024
        ))
    } else {
        AppError::InvalidInput(anyhow::anyhow!("Failed to read multipart field: {}", e))
    }
}

/// Identify a plant from an uploaded photo.
///
/// The upload is rejected before the gateway is invoked when the content
/// type is not an image or the body exceeds the configured ceiling.
#[tracing::instrument(skip(state, multipart))]
pub async fn identify_plant(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IdentifyResponse>, AppError> {
    let max_bytes = state.config.limits.max_upload_bytes;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, max_bytes))?
        .ok_or_else(|| AppError::InvalidInput(anyhow::anyhow!("No image uploaded")))?;

    let filename = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    if !content_type.starts_with("image/") {
        return Err(AppError::InvalidInput(anyhow::anyhow!(
            "Uploaded file must be an image (JPEG, PNG, WebP)"
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| map_multipart_error(e, max_bytes))?;

    if data.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Image must not exceed {}MB",
            max_bytes / 1024 / 1024
        )));
    }

    tracing::info!(
        filename = filename.as_deref().unwrap_or("unnamed"),
        size = data.len(),
        "Processing plant image"
    );

    let text = state
        .gateway
        .identify_plant(&data, &content_type, None)
        .await?;

    // The model is asked for structured output but may answer free-form;
    // both are successes for the caller.
    let data = match PlantValidation::from_reply(text) {
        PlantValidation::Structured(value) => value,
        PlantValidation::Raw(text) => serde_json::json!({
            "raw_text": text,
            "note": "Response was not structured JSON",
        }),
    };

    Ok(Json(IdentifyResponse {
        success: true,
        data,
        message: "Plant identified successfully".to_string(),
        filename,
    }))
}

/// Validate and enrich a plant's medicinal claims with the AI backend.
#[tracing::instrument(skip(state))]
pub async fn validate_plant(
    State(state): State<AppState>,
    Path(plant_name): Path<String>,
) -> Result<Json<ValidateResponse>, AppError> {
    if plant_name.trim().is_empty() {
        return Err(AppError::InvalidInput(anyhow::anyhow!(
            "Plant name must not be empty"
        )));
    }

    let data = match state.gateway.validate_plant_info(&plant_name).await? {
        PlantValidation::Structured(value) => value,
        PlantValidation::Raw(text) => serde_json::json!({ "raw_text": text }),
    };

    Ok(Json(ValidateResponse {
        success: true,
        data,
        message: "Validation completed successfully".to_string(),
    }))
}
