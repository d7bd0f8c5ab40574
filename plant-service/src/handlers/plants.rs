use crate::dtos::{
    ConditionMatch, ConditionParams, ConditionResponse, ListParams, Pagination, PlantListResponse,
    PlantResponse, SearchParams, SearchResponse, StatsResponse,
};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

const DEFAULT_LIST_LIMIT: u32 = 50;
const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[tracing::instrument(skip(state))]
pub async fn list_plants(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PlantListResponse>, AppError> {
    params.validate()?;

    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let (page, total) = state.catalog.list(limit as usize, offset as usize);

    Ok(Json(PlantListResponse {
        success: true,
        data: page.to_vec(),
        pagination: Pagination {
            total,
            limit,
            offset,
            has_more: (offset as usize + limit as usize) < total,
        },
    }))
}

#[tracing::instrument(skip(state))]
pub async fn search_plants(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    params.validate()?;

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = state.catalog.search(&params.q, limit as usize);

    Ok(Json(SearchResponse {
        success: true,
        results_count: results.len(),
        data: results.into_iter().cloned().collect(),
        query: params.q,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_plant(
    State(state): State<AppState>,
    Path(plant_id): Path<String>,
) -> Result<Json<PlantResponse>, AppError> {
    let record = state.catalog.get_by_id(&plant_id).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!(
            "Plant with id '{}' not found. Known ids: {}",
            plant_id,
            state.catalog.ids().join(", ")
        ))
    })?;

    Ok(Json(PlantResponse {
        success: true,
        data: record.clone(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn plants_by_condition(
    State(state): State<AppState>,
    Path(condition): Path<String>,
    Query(params): Query<ConditionParams>,
) -> Result<Json<ConditionResponse>, AppError> {
    params.validate()?;

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let matches: Vec<ConditionMatch> = state
        .catalog
        .by_condition(&condition, limit as usize)
        .into_iter()
        .map(ConditionMatch::from)
        .collect();

    Ok(Json(ConditionResponse {
        success: true,
        results_count: matches.len(),
        data: matches,
        condition,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn catalog_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: state.catalog.stats(),
    })
}
