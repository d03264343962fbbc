//! Metric history storage and retrieval.
//!
//! Samples are kept in a single append-only SQLite table indexed by
//! timestamp. Aggregation happens in SQL: rows are grouped into buckets of
//! `floor(ts / width)` and each numeric column is averaged, so callers can
//! render long time ranges without transferring every raw sample.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::sample::{BucketedAggregate, MetricSample};

/// How long a writer waits for the SQLite lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by the metric store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to create database directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only time series of host samples.
#[derive(Clone)]
pub struct MetricStore {
    pool: SqlitePool,
}

impl MetricStore {
    /// Opens (or creates) the database file at `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Metric store opened at {}", path.display());
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds exactly one connection that never expires, because every
    /// SQLite `:memory:` connection is its own database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metrics (
                ts   INTEGER NOT NULL,
                cpu  REAL,
                ram  REAL,
                up   REAL,
                down REAL,
                temp REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_metrics_ts ON metrics(ts)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Appends one sample.
    #[instrument(skip(self, sample), fields(ts = sample.timestamp))]
    pub async fn record(&self, sample: &MetricSample) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO metrics (ts, cpu, ram, up, down, temp) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(sample.timestamp)
            .bind(sample.cpu_percent)
            .bind(sample.ram_percent)
            .bind(sample.up_mbps)
            .bind(sample.down_mbps)
            .bind(sample.temperature_c)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Returns one aggregate per non-empty bucket at or after `since`,
    /// ordered by bucket ascending.
    ///
    /// Bucket widths below one second are treated as one second.
    #[instrument(skip(self))]
    pub async fn query(
        &self,
        since: i64,
        bucket_width_seconds: i64,
    ) -> Result<Vec<BucketedAggregate>, StoreError> {
        let width = bucket_width_seconds.max(1);

        let rows = sqlx::query(
            r#"
            SELECT
                ts / ?       AS bucket,
                MIN(ts)      AS first_ts,
                AVG(cpu)     AS avg_cpu,
                AVG(ram)     AS avg_ram,
                AVG(up)      AS avg_up,
                AVG(down)    AS avg_down,
                AVG(temp)    AS avg_temp
            FROM metrics
            WHERE ts >= ?
            GROUP BY bucket
            ORDER BY bucket
            "#,
        )
        .bind(width)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(BucketedAggregate {
                ts: row.try_get::<i64, _>("first_ts")?,
                cpu: row.try_get::<Option<f64>, _>("avg_cpu")?,
                ram: row.try_get::<Option<f64>, _>("avg_ram")?,
                up: row.try_get::<Option<f64>, _>("avg_up")?,
                down: row.try_get::<Option<f64>, _>("avg_down")?,
                temp: row.try_get::<Option<f64>, _>("avg_temp")?,
            });
        }

        debug!(buckets = out.len(), width, since, "Aggregated metric history");
        Ok(out)
    }

    /// Deletes every sample strictly older than `cutoff` and returns the
    /// number of removed rows.
    #[instrument(skip(self))]
    pub async fn prune(&self, cutoff: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM metrics WHERE ts < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of stored samples.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Most recent raw sample, if any.
    pub async fn latest(&self) -> Result<Option<MetricSample>, StoreError> {
        let row = sqlx::query(
            "SELECT ts, cpu, ram, up, down, temp FROM metrics ORDER BY ts DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(MetricSample {
            timestamp: row.try_get("ts")?,
            cpu_percent: row.try_get::<Option<f64>, _>("cpu")?.unwrap_or(0.0),
            ram_percent: row.try_get::<Option<f64>, _>("ram")?.unwrap_or(0.0),
            up_mbps: row.try_get::<Option<f64>, _>("up")?.unwrap_or(0.0),
            down_mbps: row.try_get::<Option<f64>, _>("down")?.unwrap_or(0.0),
            temperature_c: row.try_get("temp")?,
        }))
    }

    /// Closes the underlying pool, waiting for in-flight statements.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64, cpu: f64, temp: Option<f64>) -> MetricSample {
        MetricSample {
            timestamp: ts,
            cpu_percent: cpu,
            ram_percent: 50.0,
            up_mbps: 1.0,
            down_mbps: 2.0,
            temperature_c: temp,
        }
    }

    #[tokio::test]
    async fn test_record_and_count() {
        let store = MetricStore::open_in_memory().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store.record(&sample(10, 1.0, None)).await.unwrap();
        store.record(&sample(11, 2.0, Some(40.0))).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.timestamp, 11);
        assert_eq!(latest.temperature_c, Some(40.0));
    }

    #[tokio::test]
    async fn test_latest_on_empty_store() {
        let store = MetricStore::open_in_memory().await.unwrap();
        assert!(store.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_respects_since() {
        let store = MetricStore::open_in_memory().await.unwrap();
        for ts in [100, 200, 300] {
            store.record(&sample(ts, ts as f64, None)).await.unwrap();
        }

        let rows = store.query(200, 1).await.unwrap();
        let ts: Vec<i64> = rows.iter().map(|r| r.ts).collect();
        assert_eq!(ts, vec![200, 300]);
    }

    #[tokio::test]
    async fn test_query_clamps_zero_width() {
        let store = MetricStore::open_in_memory().await.unwrap();
        store.record(&sample(5, 10.0, None)).await.unwrap();
        store.record(&sample(6, 20.0, None)).await.unwrap();

        let rows = store.query(0, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_prune_returns_deleted_rows() {
        let store = MetricStore::open_in_memory().await.unwrap();
        for ts in [1, 2, 3, 4] {
            store.record(&sample(ts, 0.0, None)).await.unwrap();
        }

        assert_eq!(store.prune(3).await.unwrap(), 2);
        assert_eq!(store.prune(3).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
