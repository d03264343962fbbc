//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! sampler, store and plugin status as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_dashboard::SamplerStats;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Herakles Dashboard - More info: https://www.herakles.now";

/// Formats an uptime in the largest sensible unit.
pub fn format_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}

fn render_sampler_table(stats: &SamplerStats, stored: Option<u64>) -> String {
    let mut out = String::new();
    writeln!(out, "SAMPLER").ok();
    writeln!(out, "=======").ok();
    writeln!(out).ok();
    writeln!(out, "{:<24} {:>14}", "samples recorded", stats.samples_recorded()).ok();
    writeln!(out, "{:<24} {:>14}", "prune sweeps", stats.prune_sweeps()).ok();
    writeln!(out, "{:<24} {:>14}", "rows pruned", stats.rows_pruned()).ok();
    writeln!(out, "{:<24} {:>14}", "last sample (unix)", stats.last_sample_ts()).ok();
    match stored {
        Some(count) => writeln!(out, "{:<24} {:>14}", "stored samples", count).ok(),
        None => writeln!(out, "{:<24} {:>14}", "stored samples", "unavailable").ok(),
    };
    out
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");
    state.telemetry.record_request("/health");

    let stored = state.store.count().await.ok();

    // The store is the only hard dependency of the dashboard
    let (status, message) = match stored {
        Some(_) => (StatusCode::OK, "OK"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metric store unavailable"),
    };

    let uptime_str = format_uptime(state.start_time.elapsed().as_secs());
    let table = render_sampler_table(&state.sampler_stats, stored);
    let retention = state.retention.snapshot();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nUptime: {uptime_str}\n\n{table}\n\
             Sample interval: {}s\nRetention: {}h\nPlugins loaded: {}\n\n{FOOTER_TEXT}",
            retention.sample_interval_seconds,
            retention.retention_hours,
            state.plugins.len()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(90), "1.5 minutes");
        assert_eq!(format_uptime(2 * 3600), "2.0 hours");
        assert_eq!(format_uptime(36 * 3600), "1.5 days");
    }

    #[test]
    fn test_sampler_table_marks_unavailable_store() {
        let stats = SamplerStats::new();
        let table = render_sampler_table(&stats, None);
        assert!(table.contains("unavailable"));
        assert!(render_sampler_table(&stats, Some(12)).contains("12"));
    }
}
