use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use freeweek_core::identity::user_id_for_name;
use freeweek_types::api::{CreateGroupRequest, JoinGroupRequest, RenameMemberRequest};
use freeweek_types::models::GroupCode;

use crate::state::{AppState, store_status};

/// Callers may omit the user id; the server derives the deterministic
/// one from the display name (same name, same id).
fn resolve_user_id(explicit: Option<String>, user_name: &str) -> String {
    explicit
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| user_id_for_name(user_name))
}

pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&req.code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let user_id = resolve_user_id(req.user_id, &req.user_name);

    let groups = state.groups.clone();
    let group = tokio::task::spawn_blocking(move || {
        groups.create_group(&code, &user_id, &req.user_name)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(store_status)?;

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn join_group(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<JoinGroupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let user_id = resolve_user_id(req.user_id, &req.user_name);

    let groups = state.groups.clone();
    let group =
        tokio::task::spawn_blocking(move || groups.join_group(&code, &user_id, &req.user_name))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .map_err(store_status)?;

    Ok(Json(group))
}

pub async fn get_members(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let groups = state.groups.clone();
    let members = tokio::task::spawn_blocking(move || groups.get_group_members(&code))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(members))
}

pub async fn rename_member(
    State(state): State<AppState>,
    Path((code, user_id)): Path<(String, String)>,
    Json(req): Json<RenameMemberRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;

    let groups = state.groups.clone();
    tokio::task::spawn_blocking(move || {
        groups.update_member_name(&code, &user_id, &req.user_name)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(store_status)?;

    Ok(StatusCode::NO_CONTENT)
}
