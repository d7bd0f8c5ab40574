use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A catalog entry for one medicinal plant.
///
/// Records are loaded once at startup and immutable for the process
/// lifetime; list fields default to empty rather than being absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: String,
    pub scientific_name: String,
    #[serde(default)]
    pub common_names: Vec<String>,
    /// Language code or ethnic group -> local name.
    #[serde(default)]
    pub local_names: HashMap<String, String>,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub traditional_uses: Vec<String>,
    #[serde(default)]
    pub medicinal_properties: Vec<String>,
    #[serde(default)]
    pub preparation: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub found_in: Vec<String>,
    #[serde(default)]
    pub scientific_validation: String,
}

/// One turn of a chat conversation, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}
