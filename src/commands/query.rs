//! Query command implementation.
//!
//! Prints the same bucketed history `/api/metrics` serves, straight from
//! the database file.

use chrono::Utc;
use herakles_dashboard::MetricStore;

use crate::config::Config;
use crate::handlers::history::window_start;

/// Prints bucketed history for the last `hours` as pretty JSON.
pub async fn command_query(hours: f64, step: Option<i64>, config: &Config) -> anyhow::Result<()> {
    if !(hours.is_finite() && hours > 0.0) {
        anyhow::bail!("--hours must be a positive number, got {}", hours);
    }
    let width = step
        .unwrap_or(config.retention().sample_interval_seconds as i64)
        .max(1);

    let store = MetricStore::open(config.database_path()).await?;
    let since = window_start(Utc::now().timestamp(), hours);
    let buckets = store.query(since, width).await?;
    store.close().await;

    println!("{}", serde_json::to_string_pretty(&buckets)?);
    Ok(())
}
