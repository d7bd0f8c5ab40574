//! AI gateway client: mediates every call to the generative AI backend
//! behind a uniform, retryable, text-first contract.
//!
//! The backend itself sits behind the [`GenerativeBackend`] trait so the
//! gateway can be exercised against a scripted mock in tests and against the
//! Gemini REST API in production.

pub mod gemini;
pub mod mock;

use crate::models::ConversationTurn;
use async_trait::async_trait;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::retry::{retry_with_backoff, RetryPolicy};
use std::sync::Arc;
use thiserror::Error;

/// How many trailing conversation turns are folded into a chat prompt.
const HISTORY_WINDOW: usize = 6;

/// Default attempt ceiling for gateway operations.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const MEDICAL_SYSTEM_PROMPT: &str = "\
You are a medical assistant specialized in African medicinal plants.

Rules:
1. Be professional and empathetic.
2. Structure answers with short sections and bullet lists.
3. Always cite scientific sources when they exist, and say so when they do not.
4. Always mention usage precautions and contraindications.
5. For anything resembling a medical emergency, tell the user to see a health professional immediately.
6. Ground every claim in scientifically validated knowledge; flag traditional uses that lack validation.

Answer the user now.";

const IDENTIFY_PROMPT: &str = "\
You are an expert botanist specialized in African medicinal plants.

Identify the plant in this image and provide:
1. Scientific (Latin) name
2. Common and local African names
3. Botanical family
4. Traditional medicinal uses
5. Scientifically validated properties
6. Recommended preparation
7. Safe dosage
8. Precautions and contraindications

If the identification is uncertain, say so explicitly.
If the plant is toxic, state it prominently.
Always recommend consulting an expert in case of doubt.";

/// Errors raised by the gateway. Configuration and image failures are fatal
/// and never retried; upstream failures are only surfaced after the retry
/// loop has run its course.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI backend is not configured (missing API key)")]
    NotConfigured,

    #[error("could not decode uploaded image: {0}")]
    InvalidImage(String),

    #[error("AI backend failed after {attempts} attempt(s): {source}")]
    Upstream {
        attempts: u32,
        #[source]
        source: BackendError,
    },
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured => AppError::NotConfigured(
                "AI assistant is not configured. Set GEMINI_API_KEY to enable this feature."
                    .to_string(),
            ),
            GatewayError::InvalidImage(msg) => {
                AppError::InvalidInput(anyhow::anyhow!("invalid image: {}", msg))
            }
            GatewayError::Upstream { attempts, source } => AppError::Upstream {
                attempts,
                source: anyhow::Error::new(source),
            },
        }
    }
}

/// Error type for a single backend attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited")]
    RateLimited,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no text could be extracted from the model response")]
    EmptyResponse,
}

impl BackendError {
    /// Transient failures are worth another attempt; caller mistakes (4xx)
    /// and unusable response shapes are not.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::RateLimited => true,
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::EmptyResponse => false,
        }
    }
}

/// One part of a prompt sent to the backend.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

/// Generation knobs forwarded to the backend.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: i32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// Raw content of a model reply. The upstream API is inconsistent about
/// exposing the text as a scalar field or as a sequence of parts, so both
/// shapes deserialize here, with a coercion fallback for anything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelReply {
    Scalar { text: String },
    Parts { parts: Vec<ReplyPart> },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl ModelReply {
    /// Normalize the reply to a single text string. Never panics; returns
    /// `None` only when no text at all can be extracted.
    pub fn into_text(self) -> Option<String> {
        match self {
            ModelReply::Scalar { text } => Some(text),
            ModelReply::Parts { parts } => {
                let joined = parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    None
                } else {
                    Some(joined)
                }
            }
            ModelReply::Other(value) => match value {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            },
        }
    }
}

/// Abstraction over the generative AI backend: one attempt, no retry.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        parts: &[PromptPart],
        params: &GenerationParams,
    ) -> Result<ModelReply, BackendError>;
}

/// Outcome of `validate_plant_info`: structured JSON when the model produced
/// some, raw text otherwise. Malformed JSON is never an error.
#[derive(Debug, Clone)]
pub enum PlantValidation {
    Structured(serde_json::Value),
    Raw(String),
}

impl PlantValidation {
    pub fn from_reply(text: String) -> Self {
        let candidate = strip_code_fence(&text);
        match serde_json::from_str::<serde_json::Value>(candidate) {
            Ok(value) if value.is_object() || value.is_array() => Self::Structured(value),
            _ => Self::Raw(text),
        }
    }
}

/// Strip an optional markdown code fence (with or without a `json` tag)
/// around the payload.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

/// The gateway client. One instance per process, shared read-only across
/// concurrent requests; it has no per-call mutable state.
pub struct AiGateway {
    backend: Option<Arc<dyn GenerativeBackend>>,
    retry: RetryPolicy,
    params: GenerationParams,
}

impl AiGateway {
    pub fn new(backend: Arc<dyn GenerativeBackend>, params: GenerationParams) -> Self {
        Self {
            backend: Some(backend),
            retry: RetryPolicy::default(),
            params,
        }
    }

    /// A gateway with no backend: every operation fails fast with
    /// [`GatewayError::NotConfigured`] and zero network attempts.
    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            retry: RetryPolicy::default(),
            params: GenerationParams::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn GenerativeBackend>, GatewayError> {
        self.backend.as_ref().ok_or(GatewayError::NotConfigured)
    }

    /// Medical chat completion over the fixed system instruction, a bounded
    /// window of conversation history and the user's message.
    pub async fn chat_medical(
        &self,
        message: &str,
        history: &[ConversationTurn],
        max_retries: u32,
    ) -> Result<String, GatewayError> {
        let prompt = build_chat_prompt(message, history);
        self.generate_text(vec![PromptPart::Text(prompt)], max_retries)
            .await
    }

    /// Identify a plant from raw image bytes. The bytes must decode as an
    /// image before any backend call is attempted.
    pub async fn identify_plant(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        extra_prompt: Option<&str>,
    ) -> Result<String, GatewayError> {
        // Configuration gate first, then the decode gate: neither spends a
        // backend attempt.
        self.backend()?;

        image::load_from_memory(image_bytes)
            .map_err(|e| GatewayError::InvalidImage(e.to_string()))?;

        let mut instruction = IDENTIFY_PROMPT.to_string();
        if let Some(extra) = extra_prompt {
            instruction.push_str("\n\nAdditional context: ");
            instruction.push_str(extra);
        }

        let parts = vec![
            PromptPart::Text(instruction),
            PromptPart::InlineImage {
                mime_type: mime_type.to_string(),
                data: image_bytes.to_vec(),
            },
        ];

        self.generate_text(parts, DEFAULT_MAX_RETRIES).await
    }

    /// Free-text validation of a plant's medicinal claims. The reply is
    /// parsed as JSON when possible and passed through raw otherwise.
    pub async fn validate_plant_info(
        &self,
        plant_name: &str,
    ) -> Result<PlantValidation, GatewayError> {
        let prompt = format!(
            "You are a scientific reviewer of medicinal plant claims.\n\
             Assess the plant \"{}\" and reply as JSON with the fields:\n\
             {{\"verified\": bool, \"sources\": [string], \"safety_profile\": string,\n\
             \"validated_properties\": [string], \"unvalidated_claims\": [string]}}.\n\
             If you cannot produce JSON, reply in plain text.",
            plant_name
        );

        let text = self
            .generate_text(vec![PromptPart::Text(prompt)], DEFAULT_MAX_RETRIES)
            .await?;

        Ok(PlantValidation::from_reply(text))
    }

    async fn generate_text(
        &self,
        parts: Vec<PromptPart>,
        max_retries: u32,
    ) -> Result<String, GatewayError> {
        let backend = self.backend()?.clone();
        let policy = self.retry.with_max_attempts(max_retries);
        let params = self.params.clone();
        let parts = Arc::new(parts);

        let text = retry_with_backoff(
            &policy,
            "gateway_generate",
            BackendError::is_transient,
            || {
                let backend = backend.clone();
                let parts = parts.clone();
                let params = params.clone();
                async move {
                    let reply = backend.generate(&parts, &params).await?;
                    reply.into_text().ok_or(BackendError::EmptyResponse)
                }
            },
        )
        .await
        .map_err(|failure| GatewayError::Upstream {
            attempts: failure.attempts,
            source: failure.error,
        })?;

        tracing::debug!(chars = text.len(), "Gateway response normalized");
        Ok(text)
    }
}

/// Fold the fixed system instruction, the trailing history window and the
/// new message into a single prompt.
fn build_chat_prompt(message: &str, history: &[ConversationTurn]) -> String {
    let mut prompt = String::from(MEDICAL_SYSTEM_PROMPT);
    prompt.push_str("\n\n");

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for turn in &history[start..] {
        prompt.push_str(turn.role.label());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }

    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt
}

#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;
    use crate::models::Role;
    use std::time::Duration;

    fn gateway_with(backend: MockBackend) -> (AiGateway, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let gateway = AiGateway::new(backend.clone(), GenerationParams::default());
        (gateway, backend)
    }

    // A tiny valid 1x1 PNG for decode checks.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x60, 0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01, 0x7A, 0x5E, 0xAB, 0x3F,
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn scalar_reply_normalizes_to_text() {
        let reply: ModelReply =
            serde_json::from_value(serde_json::json!({ "text": "hello" })).unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("hello"));
    }

    #[test]
    fn parts_reply_concatenates_text_parts() {
        let reply: ModelReply = serde_json::from_value(serde_json::json!({
            "parts": [
                { "text": "plant" },
                { "inline_data": { "mime_type": "image/png", "data": "" } },
                { "text": "info" }
            ]
        }))
        .unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("plant info"));
    }

    #[test]
    fn unknown_reply_shape_is_string_coerced() {
        let reply: ModelReply = serde_json::from_value(serde_json::json!(42)).unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("42"));

        let reply: ModelReply = serde_json::from_value(serde_json::json!(null)).unwrap();
        assert!(reply.into_text().is_none());
    }

    #[test]
    fn validation_parses_fenced_json() {
        let v = PlantValidation::from_reply(
            "```json\n{\"verified\": true, \"sources\": []}\n```".to_string(),
        );
        match v {
            PlantValidation::Structured(value) => assert_eq!(value["verified"], true),
            PlantValidation::Raw(_) => panic!("expected structured outcome"),
        }
    }

    #[test]
    fn validation_falls_back_to_raw_text() {
        let v = PlantValidation::from_reply("not json at all".to_string());
        match v {
            PlantValidation::Raw(text) => assert_eq!(text, "not json at all"),
            PlantValidation::Structured(_) => panic!("expected raw outcome"),
        }
    }

    #[test]
    fn chat_prompt_keeps_only_the_trailing_history_window() {
        let history: Vec<ConversationTurn> = (0..10)
            .map(|i| ConversationTurn {
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("turn-{}", i),
            })
            .collect();

        let prompt = build_chat_prompt("latest question", &history);
        assert!(!prompt.contains("turn-3"));
        assert!(prompt.contains("turn-4"));
        assert!(prompt.contains("turn-9"));
        assert!(prompt.ends_with("User: latest question"));
    }

    #[tokio::test(start_paused = true)]
    async fn chat_succeeds_on_third_attempt_after_backoff() {
        let (gateway, backend) = gateway_with(MockBackend::fail_n_then_succeed(2, "answer"));
        let started = tokio::time::Instant::now();

        let text = gateway.chat_medical("hello", &[], 3).await.unwrap();

        assert_eq!(text, "answer");
        assert_eq!(backend.calls(), 3);
        // 1s + 2s of backoff must have elapsed before the third attempt.
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn chat_exhaustion_reports_exactly_three_attempts() {
        let (gateway, backend) = gateway_with(MockBackend::always_fail());

        let err = gateway.chat_medical("hello", &[], 3).await.unwrap_err();

        match err {
            GatewayError::Upstream { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_api_errors_are_not_retried() {
        let (gateway, backend) = gateway_with(MockBackend::fail_with_api(400, "bad prompt"));

        let err = gateway.chat_medical("hello", &[], 3).await.unwrap_err();

        match err {
            GatewayError::Upstream { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn unconfigured_gateway_fails_fast_with_zero_attempts() {
        let gateway = AiGateway::unconfigured();

        let chat = gateway.chat_medical("hello", &[], 3).await;
        assert!(matches!(chat, Err(GatewayError::NotConfigured)));

        let identify = gateway.identify_plant(TINY_PNG, "image/png", None).await;
        assert!(matches!(identify, Err(GatewayError::NotConfigured)));

        let validate = gateway.validate_plant_info("Moringa oleifera").await;
        assert!(matches!(validate, Err(GatewayError::NotConfigured)));
    }

    #[tokio::test]
    async fn identify_rejects_undecodable_bytes_without_backend_call() {
        let (gateway, backend) = gateway_with(MockBackend::always_ok("unused"));

        let err = gateway
            .identify_plant(b"definitely not an image", "image/png", None)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidImage(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn identify_sends_instruction_and_image() {
        let (gateway, backend) = gateway_with(MockBackend::always_ok("Moringa oleifera"));

        let text = gateway
            .identify_plant(TINY_PNG, "image/png", Some("found in a garden"))
            .await
            .unwrap();

        assert_eq!(text, "Moringa oleifera");
        assert_eq!(backend.calls(), 1);

        let parts = backend.last_parts();
        assert_eq!(parts.len(), 2);
        match &parts[0] {
            PromptPart::Text(t) => {
                assert!(t.contains("botanist"));
                assert!(t.contains("found in a garden"));
            }
            _ => panic!("first part must be the instruction"),
        }
        assert!(matches!(parts[1], PromptPart::InlineImage { .. }));
    }
}
