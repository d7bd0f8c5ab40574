use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default upload ceiling for plant photos (10MB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10_485_760;

#[derive(Debug, Clone, Deserialize)]
pub struct PlantConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// API key for the Gemini backend. Empty means the AI features run in
    /// the unconfigured state and fail fast without network calls.
    pub api_key: String,
    /// Model used for chat, identification and validation
    /// (e.g. gemini-2.0-flash).
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    pub max_upload_bytes: usize,
    pub rate_limit_per_minute: u32,
}

impl PlantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(PlantConfig {
            common: common_config,
            gemini: GeminiSettings {
                // Deliberately optional in every environment: a missing key
                // degrades the AI surface instead of failing startup.
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: get_env("GEMINI_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                temperature: get_env("GEMINI_TEMPERATURE", Some("0.7"), is_prod)?
                    .parse()
                    .unwrap_or(0.7),
                max_output_tokens: get_env("GEMINI_MAX_OUTPUT_TOKENS", Some("2048"), is_prod)?
                    .parse()
                    .unwrap_or(2048),
            },
            limits: LimitSettings {
                max_upload_bytes: get_env(
                    "MAX_UPLOAD_BYTES",
                    Some(&DEFAULT_MAX_UPLOAD_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
                rate_limit_per_minute: get_env("RATE_LIMIT_PER_MINUTE", Some("30"), is_prod)?
                    .parse()
                    .unwrap_or(30),
            },
        })
    }

    pub fn gemini_configured(&self) -> bool {
        !self.gemini.api_key.is_empty()
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
