use std::time::Duration;

use axum::http::StatusCode;
use tracing::warn;

use freeweek_gateway::dispatcher::Dispatcher;
use freeweek_store::{BlockStore, GroupRegistry, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub blocks: BlockStore,
    pub groups: GroupRegistry,
    pub dispatcher: Dispatcher,
    pub poll_interval: Duration,
}

/// Maps store failures onto HTTP statuses. Write-path failures are
/// surfaced (never swallowed) so clients can retry or show a banner.
pub fn store_status(err: StoreError) -> StatusCode {
    let status = match &err {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::InvalidInterval => StatusCode::BAD_REQUEST,
        StoreError::GroupExists(_) => StatusCode::CONFLICT,
    };
    warn!("store operation failed ({}): {}", status, err);
    status
}
