use crate::models::ConversationTurn;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1 to 2000 characters"))]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<ConversationTurn>>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuickAdviceParams {
    #[validate(length(min = 1, message = "Symptom must not be empty"))]
    pub symptom: String,
}

#[derive(Debug, Serialize)]
pub struct QuickAdviceResponse {
    pub success: bool,
    pub advice: String,
    pub symptom: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub suggestions: Vec<&'static str>,
}
