//! Live host statistics: `GET /api/stats` and `GET /api/processes`.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use herakles_dashboard::processes::{self, ProcessInfo};
use herakles_dashboard::reader::StatsSnapshot;
use herakles_dashboard::Role;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::handlers::ApiError;
use crate::state::SharedState;

const DEFAULT_TOP_PROCESSES: usize = 5;

/// Instantaneous snapshot; not persisted.
#[instrument(skip(state, headers))]
pub async fn stats_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<StatsSnapshot>, ApiError> {
    state.telemetry.record_request("/api/stats");
    state.authenticator.authorize(&headers, Role::Viewer)?;

    let snapshot = state.stats_reader.lock().await.snapshot();
    debug!(
        "Stats snapshot: cpu={:.1}% ram={:.1}%",
        snapshot.cpu.total, snapshot.ram.percent
    );
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct ProcessesQuery {
    pub top: Option<String>,
}

#[instrument(skip(state, headers))]
pub async fn processes_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ProcessesQuery>,
) -> Result<Json<Vec<ProcessInfo>>, ApiError> {
    state.telemetry.record_request("/api/processes");
    state.authenticator.authorize(&headers, Role::Viewer)?;

    let top = query
        .top
        .as_deref()
        .and_then(|t| t.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_TOP_PROCESSES);

    let list = tokio::task::spawn_blocking(move || processes::top_processes(top)).await?;
    Ok(Json(list))
}
