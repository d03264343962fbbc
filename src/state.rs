//! Application state management for the dashboard.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_dashboard::telemetry::DashboardMetrics;
use herakles_dashboard::{
    MetricStore, PluginRegistry, ProcReader, RetentionController, SamplerStats, TokenAuthenticator,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MetricStore,
    pub retention: Arc<RetentionController>,
    pub plugins: Arc<PluginRegistry>,
    pub authenticator: Arc<TokenAuthenticator>,
    /// Reader for the live stats view; separate from the sampler's so the
    /// two never disturb each other's deltas.
    pub stats_reader: Mutex<ProcReader>,
    pub sampler_stats: Arc<SamplerStats>,
    pub telemetry: DashboardMetrics,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
