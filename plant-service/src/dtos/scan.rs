use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub success: bool,
    pub data: serde_json::Value,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub data: serde_json::Value,
    pub message: String,
}
