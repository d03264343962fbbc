//! Retention administration: `GET|POST /admin/retention` (admin only).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use herakles_dashboard::{RetentionConfig, Role};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::handlers::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct RetentionResponse {
    pub ok: bool,
    pub retention_hours: u64,
    pub interval_sec: u64,
}

impl From<RetentionConfig> for RetentionResponse {
    fn from(cfg: RetentionConfig) -> Self {
        Self {
            ok: true,
            retention_hours: cfg.retention_hours,
            interval_sec: cfg.sample_interval_seconds,
        }
    }
}

/// Interprets one field of the update body.
///
/// Absent or `null` keeps the current value (`None`). Numbers and numeric
/// strings are truncated to integers; anything else becomes 0, which the
/// controller clamps to its floor.
pub fn coerce_setting(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    let number = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    };
    Some(number.unwrap_or(0))
}

#[instrument(skip(state, headers))]
pub async fn get_retention_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<RetentionResponse>, ApiError> {
    state.telemetry.record_request("/admin/retention");
    state.authenticator.authorize(&headers, Role::Admin)?;
    Ok(Json(state.retention.snapshot().into()))
}

#[instrument(skip(state, headers, body))]
pub async fn update_retention_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RetentionResponse>, ApiError> {
    state.telemetry.record_request("/admin/retention");
    let caller = state.authenticator.authorize(&headers, Role::Admin)?;

    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?
    };

    let interval = coerce_setting(payload.get("interval"));
    let hours = coerce_setting(payload.get("hours"));
    let effective = state.retention.update(interval, hours);

    info!(
        "Retention updated by {}: interval={}s retention={}h",
        caller.name, effective.sample_interval_seconds, effective.retention_hours
    );
    Ok(Json(effective.into()))
}
