use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc, Weekday};
use serde::Deserialize;
use tracing::error;

use freeweek_core::freetime::common_free_slots;
use freeweek_types::api::{NewBusyBlock, UpdateBlockRequest};
use freeweek_types::models::GroupCode;

use crate::state::{AppState, store_status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksQuery {
    /// When set, only that user's blocks are returned.
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlotsQuery {
    /// Accepted for interface symmetry; blocks are week-independent so
    /// the result is the same for every week.
    pub week_start: Option<NaiveDate>,
}

pub async fn get_blocks(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<BlocksQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let blocks = state.blocks.clone();
    let result = tokio::task::spawn_blocking(move || match query.user_id {
        Some(user_id) => blocks.get_blocks_by_user(&code, &user_id),
        None => blocks.get_blocks(&code),
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(result))
}

pub async fn add_block(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<NewBusyBlock>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let blocks = state.blocks.clone();
    let block = tokio::task::spawn_blocking(move || blocks.add_block(&code, input))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(store_status)?;

    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn update_block(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
    Json(req): Json<UpdateBlockRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let blocks = state.blocks.clone();
    tokio::task::spawn_blocking(move || blocks.update_block(&code, &id, &req.user_id, &req.patch))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(store_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_block(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
    Query(query): Query<ActorQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let blocks = state.blocks.clone();
    tokio::task::spawn_blocking(move || blocks.remove_block(&code, &id, &query.user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(store_status)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Fetches the group's full block set and aggregates the windows where
/// nobody is busy. Recomputed on every call; never persisted.
pub async fn free_slots(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let week_start = query
        .week_start
        .unwrap_or_else(|| Utc::now().date_naive().week(Weekday::Mon).first_day());

    let blocks = state.blocks.clone();
    let group_blocks =
        tokio::task::spawn_blocking(move || blocks.get_blocks_for_week(&code, week_start))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    Ok(Json(common_free_slots(&group_blocks, week_start)))
}
