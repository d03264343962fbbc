//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with all available endpoints and descriptions.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::{format_uptime, FOOTER_TEXT};
use crate::state::SharedState;

const ENDPOINTS: [(&str, &str, &str); 8] = [
    ("/health", "public", "Sampler, store and plugin health (text)"),
    ("/metrics", "public", "Prometheus self-telemetry of the dashboard"),
    ("/api/me", "public", "Identity behind the presented API token"),
    ("/api/stats", "viewer", "Instantaneous CPU, memory, disk, network and temperature"),
    ("/api/metrics?hours=6", "viewer", "Bucketed metric history (hours, step)"),
    ("/api/processes?top=5", "viewer", "Busiest processes by CPU, then memory"),
    ("/api/plugins", "viewer", "Plugins visible to the caller's role"),
    ("/admin/retention", "admin", "Read (GET) or change (POST) sampling and retention"),
];

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.telemetry.record_request("/");

    let version = env!("CARGO_PKG_VERSION");
    let uptime_str = format_uptime(state.start_time.elapsed().as_secs());
    let retention = state.retention.snapshot();

    let mut endpoints = String::new();
    for (path, role, desc) in ENDPOINTS {
        writeln!(
            endpoints,
            r#"        <li><a href="{path}">{path}</a> <span class="role">{role}</span>
            <div class="endpoint-desc">{desc}</div></li>"#
        )
        .ok();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Herakles Dashboard</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{ color: #333; border-bottom: 3px solid #007bff; padding-bottom: 15px; }}
        .info {{
            background: #e9ecef;
            padding: 15px;
            border-radius: 4px;
            display: flex;
            justify-content: space-around;
            flex-wrap: wrap;
        }}
        .info-label {{ font-weight: 600; color: #555; display: block; font-size: 0.9em; }}
        .info-value {{ font-size: 1.2em; color: #007bff; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{
            margin: 15px 0;
            padding: 12px;
            background: #f8f9fa;
            border-left: 4px solid #007bff;
            border-radius: 4px;
        }}
        .endpoint-list a {{ color: #007bff; text-decoration: none; font-weight: 600; }}
        .role {{ font-size: 0.8em; color: #fff; background: #6c757d; padding: 1px 6px; border-radius: 3px; }}
        .endpoint-desc {{ color: #666; margin-top: 5px; }}
        .footer {{ margin-top: 40px; border-top: 1px solid #ddd; color: #666; font-size: 0.9em; text-align: center; }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Dashboard</h1>

    <div class="info">
        <div><span class="info-label">Version</span><span class="info-value">{version}</span></div>
        <div><span class="info-label">Uptime</span><span class="info-value">{uptime}</span></div>
        <div><span class="info-label">Sample interval</span><span class="info-value">{interval}s</span></div>
        <div><span class="info-label">Retention</span><span class="info-value">{hours}h</span></div>
        <div><span class="info-label">Plugins</span><span class="info-value">{plugins}</span></div>
    </div>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
{endpoints}    </ul>
    <p>Protected endpoints expect <code>Authorization: Bearer &lt;token&gt;</code> or <code>x-api-key</code>.</p>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        interval = retention.sample_interval_seconds,
        hours = retention.retention_hours,
        plugins = state.plugins.len(),
        endpoints = endpoints,
        footer = FOOTER_TEXT
    );

    Html(html)
}
