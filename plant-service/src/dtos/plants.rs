use crate::models::PlantRecord;
use crate::services::CatalogStats;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct PlantListResponse {
    pub success: bool,
    pub data: Vec<PlantRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 2, message = "Search term must be at least 2 characters"))]
    pub q: String,
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results_count: usize,
    pub data: Vec<PlantRecord>,
}

#[derive(Debug, Serialize)]
pub struct PlantResponse {
    pub success: bool,
    pub data: PlantRecord,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConditionParams {
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: Option<u32>,
}

/// Trimmed projection returned by the by-condition lookup.
#[derive(Debug, Serialize)]
pub struct ConditionMatch {
    pub id: String,
    pub scientific_name: String,
    pub common_names: Vec<String>,
    pub traditional_uses: Vec<String>,
    pub preparation: String,
    pub warnings: Vec<String>,
}

impl From<&PlantRecord> for ConditionMatch {
    fn from(record: &PlantRecord) -> Self {
        Self {
            id: record.id.clone(),
            scientific_name: record.scientific_name.clone(),
            common_names: record.common_names.clone(),
            traditional_uses: record.traditional_uses.clone(),
            preparation: record.preparation.clone(),
            warnings: record.warnings.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConditionResponse {
    pub success: bool,
    pub condition: String,
    pub results_count: usize,
    pub data: Vec<ConditionMatch>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: CatalogStats,
}
