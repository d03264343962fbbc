//! Prune command implementation.
//!
//! One-shot retention sweep, for running from cron while the server is
//! stopped or to shrink the window after the fact.

use chrono::Utc;
use herakles_dashboard::{MetricStore, RetentionConfig};
use tracing::info;

use crate::config::Config;

/// Deletes samples older than `hours` (or the configured retention).
pub async fn command_prune(hours: Option<i64>, config: &Config) -> anyhow::Result<()> {
    let configured = config.retention();
    let retention = match hours {
        Some(h) => RetentionConfig::new(configured.sample_interval_seconds as i64, h),
        None => configured,
    };

    let database = config.database_path();
    let store = MetricStore::open(&database).await?;
    let cutoff = retention.cutoff(Utc::now().timestamp());

    let removed = store.prune(cutoff).await?;
    let remaining = store.count().await?;
    store.close().await;

    info!("Pruned {} samples older than {}", removed, cutoff);
    println!(
        "✅ Removed {} samples older than {}h from {} ({} remaining)",
        removed,
        retention.retention_hours,
        database.display(),
        remaining
    );
    Ok(())
}
