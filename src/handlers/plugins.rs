//! Plugin catalog and caller identity endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use herakles_dashboard::{PluginSummary, Role};
use serde_json::json;
use tracing::{debug, instrument};

use crate::handlers::ApiError;
use crate::state::SharedState;

/// `GET /api/plugins`: plugins visible to the caller's role.
#[instrument(skip(state, headers))]
pub async fn plugins_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PluginSummary>>, ApiError> {
    state.telemetry.record_request("/api/plugins");
    let caller = state.authenticator.authorize(&headers, Role::Viewer)?;

    let visible = state.plugins.list_visible(caller.role);
    debug!(
        "{} ({}) sees {} of {} plugins",
        caller.name,
        caller.role,
        visible.len(),
        state.plugins.len()
    );
    Ok(Json(visible))
}

/// `GET /api/me`: who the presented token belongs to, if anyone.
#[instrument(skip(state, headers))]
pub async fn me_handler(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    state.telemetry.record_request("/api/me");

    match state.authenticator.identify(&headers) {
        Some(caller) => Json(json!({ "auth": true, "user": caller })),
        None => Json(json!({ "auth": false })),
    }
}
