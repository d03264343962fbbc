//! HTTP endpoint handlers for the dashboard.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page
//! - `/health`: Health check endpoint
//! - `/metrics`: Prometheus self-telemetry
//! - `/api/*`: JSON API (stats, history, processes, plugins, identity)
//! - `/admin/retention`: Retention administration

pub mod error;
pub mod health;
pub mod history;
pub mod metrics;
pub mod plugins;
pub mod retention;
pub mod root;
pub mod stats;

// Re-export handlers
pub use error::ApiError;
pub use health::health_handler;
pub use history::history_handler;
pub use metrics::metrics_handler;
pub use plugins::{me_handler, plugins_handler};
pub use retention::{get_retention_handler, update_retention_handler};
pub use root::root_handler;
pub use stats::{processes_handler, stats_handler};
