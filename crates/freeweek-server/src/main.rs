mod blocks;
mod groups;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use freeweek_gateway::dispatcher::Dispatcher;
use freeweek_gateway::subscription::WatchKind;
use freeweek_gateway::ws;
use freeweek_store::{BlockStore, GroupRegistry};
use freeweek_types::models::GroupCode;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freeweek=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("FREEWEEK_DB_PATH").unwrap_or_else(|_| "freeweek.db".into());
    let host = std::env::var("FREEWEEK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FREEWEEK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let poll_secs: u64 = std::env::var("FREEWEEK_POLL_SECS")
        .unwrap_or_else(|_| "3".into())
        .parse()?;

    // Init database
    let db = Arc::new(freeweek_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let state = AppState {
        blocks: BlockStore::new(Arc::clone(&db), dispatcher.clone()),
        groups: GroupRegistry::new(db, dispatcher.clone()),
        dispatcher,
        poll_interval: Duration::from_secs(poll_secs),
    };

    // Routes
    let app = Router::new()
        .route("/groups", post(groups::create_group))
        .route("/groups/{code}/join", post(groups::join_group))
        .route("/groups/{code}/members", get(groups::get_members))
        .route("/groups/{code}/members/{user_id}", put(groups::rename_member))
        .route(
            "/groups/{code}/blocks",
            get(blocks::get_blocks).post(blocks::add_block),
        )
        .route(
            "/groups/{code}/blocks/{id}",
            axum::routing::patch(blocks::update_block).delete(blocks::remove_block),
        )
        .route("/groups/{code}/free-slots", get(blocks::free_slots))
        .route("/groups/{code}/subscribe", get(ws_upgrade))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("freeweek server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ScopeQuery {
    /// "blocks" (default) or "members"
    scope: Option<String>,
}

/// Streams full-state snapshots for one group over a WebSocket. Each
/// frame replaces the previous state on the client; delivery runs on
/// the push path plus the poll fallback, both cancelled when the
/// socket closes.
async fn ws_upgrade(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ScopeQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let code = GroupCode::parse(&code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let members = query.scope.as_deref() == Some("members");

    Ok(ws.on_upgrade(move |socket| async move {
        let group = code.as_str().to_string();
        if members {
            let groups = state.groups.clone();
            ws::serve_snapshots(
                socket,
                state.dispatcher.clone(),
                group,
                WatchKind::Members,
                state.poll_interval,
                move || groups.get_group_members(&code),
            )
            .await;
        } else {
            let blocks = state.blocks.clone();
            ws::serve_snapshots(
                socket,
                state.dispatcher.clone(),
                group,
                WatchKind::Blocks,
                state.poll_interval,
                move || blocks.get_blocks(&code),
            )
            .await;
        }
    }))
}
