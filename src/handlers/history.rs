//! Metric history: `GET /api/metrics?hours=H&step=S`.
//!
//! Both parameters are lenient: an unparseable `hours` falls back to the
//! configured default window and an unparseable `step` to the current
//! sample interval.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use herakles_dashboard::{BucketedAggregate, Role};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::handlers::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<String>,
    pub step: Option<String>,
}

/// Parses the window length in hours. Negative or non-finite values fall
/// back to `default`.
pub fn parse_hours(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|h| h.trim().parse::<f64>().ok())
        .filter(|h| h.is_finite() && *h >= 0.0)
        .unwrap_or(default)
}

/// Parses the bucket width in seconds, clamped to at least 1.
pub fn parse_step(raw: Option<&str>, default: u64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(default as i64)
        .max(1)
}

/// Earliest timestamp covered by a window of `hours` ending at `now`.
pub fn window_start(now: i64, hours: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    let span = (hours.max(0.0) * 3600.0) as i64;
    now.saturating_sub(span)
}

#[instrument(skip(state, headers))]
pub async fn history_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BucketedAggregate>>, ApiError> {
    state.telemetry.record_request("/api/metrics");
    state.authenticator.authorize(&headers, Role::Viewer)?;

    let retention = state.retention.snapshot();
    let hours = parse_hours(query.hours.as_deref(), state.config.default_query_hours());
    let step = parse_step(query.step.as_deref(), retention.sample_interval_seconds);
    let since = window_start(chrono::Utc::now().timestamp(), hours);

    let buckets = state.store.query(since, step).await?;
    debug!(
        "History query: {}h step {}s -> {} buckets",
        hours,
        step,
        buckets.len()
    );
    Ok(Json(buckets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours(Some("12"), 6.0), 12.0);
        assert_eq!(parse_hours(Some("0.5"), 6.0), 0.5);
        assert_eq!(parse_hours(Some("abc"), 6.0), 6.0);
        assert_eq!(parse_hours(Some("NaN"), 6.0), 6.0);
        assert_eq!(parse_hours(Some("-1e300"), 6.0), 6.0);
        assert_eq!(parse_hours(Some("-2"), 6.0), 6.0);
        assert_eq!(parse_hours(None, 6.0), 6.0);
    }

    #[test]
    fn test_parse_step() {
        assert_eq!(parse_step(Some("60"), 5), 60);
        assert_eq!(parse_step(Some("0"), 5), 1);
        assert_eq!(parse_step(Some("-30"), 5), 1);
        assert_eq!(parse_step(Some("2.5"), 5), 5);
        assert_eq!(parse_step(None, 5), 5);
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(10_000, 1.0), 6_400);
        assert_eq!(window_start(10_000, 0.5), 8_200);
        assert_eq!(window_start(1_700_000_000, -1e300), 1_700_000_000);
        assert_eq!(window_start(1_700_000_000, f64::NAN), 1_700_000_000);
        assert_eq!(window_start(0, 1e300), i64::MIN);
    }
}
