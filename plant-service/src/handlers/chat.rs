use crate::dtos::{
    ChatRequest, ChatResponse, QuickAdviceParams, QuickAdviceResponse, SuggestionsResponse,
};
use crate::services::gateway::DEFAULT_MAX_RETRIES;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Suggested questions surfaced by the chat UI.
const SUGGESTIONS: &[&str] = &[
    "How can malaria be treated with medicinal plants?",
    "Which plants help with digestion?",
    "Traditional remedies for a persistent cough?",
    "Plants that strengthen the immune system",
    "How to treat a wound with plants?",
    "Natural approaches to hypertension",
    "Which plants are used for diabetes?",
    "Remedies for headaches",
];

#[tracing::instrument(skip(state, request))]
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request.validate()?;

    let history = request.conversation_history.unwrap_or_default();

    tracing::info!(
        history_len = history.len(),
        "Chat message received"
    );

    let response = state
        .gateway
        .chat_medical(&request.message, &history, DEFAULT_MAX_RETRIES)
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        response,
        message: "Response generated successfully".to_string(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn quick_advice(
    State(state): State<AppState>,
    Query(params): Query<QuickAdviceParams>,
) -> Result<Json<QuickAdviceResponse>, AppError> {
    params.validate()?;

    let prompt = format!(
        "Give brief medical advice (3-4 lines) for: {}\n\n\
         Include:\n\
         - 1-2 recommended African medicinal plants\n\
         - A simple preparation method\n\
         - A reminder to see a doctor if symptoms persist\n\n\
         Be concise and accessible.",
        params.symptom
    );

    let advice = state
        .gateway
        .chat_medical(&prompt, &[], DEFAULT_MAX_RETRIES)
        .await?;

    Ok(Json(QuickAdviceResponse {
        success: true,
        advice,
        symptom: params.symptom,
    }))
}

pub async fn suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        success: true,
        suggestions: SUGGESTIONS.to_vec(),
    })
}
