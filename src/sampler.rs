//! Background sampling loop.
//!
//! The sampler wakes on a short poll tick, records a sample whenever the
//! current sample interval has elapsed and prunes expired rows on a fixed
//! cadence. Interval and retention are read from the shared
//! [`RetentionController`] on every iteration, so admin updates apply on the
//! next tick. A late tick is not compensated: the next sample is scheduled
//! `interval` after the one just taken.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::reader::MetricReader;
use crate::retention::RetentionController;
use crate::store::{MetricStore, StoreError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Fallback delay when `now + interval` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("metric store failure: {0}")]
    Store(#[from] StoreError),

    #[error("sampler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Loop timing that is fixed for the sampler's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct SamplerOptions {
    pub poll_interval: Duration,
    pub prune_interval: Duration,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

/// Counters published by the sampler for health and telemetry endpoints.
#[derive(Debug, Default)]
pub struct SamplerStats {
    pub samples_recorded: AtomicU64,
    pub prune_sweeps: AtomicU64,
    pub rows_pruned: AtomicU64,
    /// Unix timestamp of the last recorded sample, 0 before the first.
    pub last_sample_ts: AtomicI64,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_recorded(&self) -> u64 {
        self.samples_recorded.load(Ordering::Relaxed)
    }

    pub fn prune_sweeps(&self) -> u64 {
        self.prune_sweeps.load(Ordering::Relaxed)
    }

    pub fn rows_pruned(&self) -> u64 {
        self.rows_pruned.load(Ordering::Relaxed)
    }

    pub fn last_sample_ts(&self) -> i64 {
        self.last_sample_ts.load(Ordering::Relaxed)
    }
}

pub struct Sampler<R> {
    /// Readers do blocking file I/O, so reads run on the blocking pool.
    reader: Arc<Mutex<R>>,
    store: MetricStore,
    retention: Arc<RetentionController>,
    options: SamplerOptions,
    stats: Arc<SamplerStats>,
}

impl<R: MetricReader + 'static> Sampler<R> {
    pub fn new(
        reader: R,
        store: MetricStore,
        retention: Arc<RetentionController>,
        options: SamplerOptions,
    ) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            store,
            retention,
            options,
            stats: Arc::new(SamplerStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<SamplerStats> {
        self.stats.clone()
    }

    /// Takes one sample and records it.
    async fn sample_once(&self) -> Result<(), SamplerError> {
        let reader = self.reader.clone();
        let reading = tokio::task::spawn_blocking(move || {
            reader.lock().unwrap_or_else(|e| e.into_inner()).read()
        })
        .await?;

        let timestamp = chrono::Utc::now().timestamp();
        let sample = reading.into_sample(timestamp);
        self.store.record(&sample).await?;

        self.stats.samples_recorded.fetch_add(1, Ordering::Relaxed);
        self.stats.last_sample_ts.store(timestamp, Ordering::Relaxed);
        debug!(
            "Recorded sample ts={} cpu={:.1}% ram={:.1}%",
            timestamp, sample.cpu_percent, sample.ram_percent
        );
        Ok(())
    }

    /// Deletes rows older than the current retention window.
    async fn prune_once(&self) -> Result<(), StoreError> {
        let retention = self.retention.snapshot();
        let cutoff = retention.cutoff(chrono::Utc::now().timestamp());
        let deleted = self.store.prune(cutoff).await?;

        self.stats.prune_sweeps.fetch_add(1, Ordering::Relaxed);
        self.stats.rows_pruned.fetch_add(deleted, Ordering::Relaxed);
        if deleted > 0 {
            info!(
                "Pruned {} samples older than {}h (cutoff {})",
                deleted, retention.retention_hours, cutoff
            );
        } else {
            debug!("Prune sweep found nothing older than cutoff {}", cutoff);
        }
        Ok(())
    }

    /// Runs until `stop` flips to true or the store fails.
    pub async fn run(self, mut stop: watch::Receiver<bool>) -> Result<(), SamplerError> {
        info!(
            "Sampler started (poll {:?}, prune every {:?})",
            self.options.poll_interval, self.options.prune_interval
        );

        let mut next_sample = Instant::now();
        let mut next_prune = Instant::now();
        let mut stop_open = true;

        loop {
            if *stop.borrow() {
                break;
            }

            let now = Instant::now();
            if now >= next_sample {
                let interval = self.retention.snapshot().sample_interval_seconds;
                self.sample_once().await?;
                next_sample = schedule_after(Duration::from_secs(interval));
            }

            if now >= next_prune {
                self.prune_once().await?;
                next_prune = schedule_after(self.options.prune_interval);
            }

            if stop_open {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.poll_interval) => {}
                    changed = stop.changed() => {
                        if changed.is_err() {
                            debug!("Sampler stop channel closed, running until process exit");
                            stop_open = false;
                        }
                    }
                }
            } else {
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }

        info!("Sampler stopped");
        Ok(())
    }

    /// Starts the loop on its own task.
    pub fn spawn(self) -> SamplerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let task = tokio::spawn(async move {
            let result = self.run(stop_rx).await;
            if let Err(e) = &result {
                error!("Sampler terminated: {}", e);
            }
            result
        });

        SamplerHandle {
            stop_tx,
            stats,
            task: Some(task),
        }
    }
}

/// `now + delay`, or a far-future instant when that overflows.
fn schedule_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Owner's side of a spawned sampler.
pub struct SamplerHandle {
    stop_tx: watch::Sender<bool>,
    stats: Arc<SamplerStats>,
    task: Option<JoinHandle<Result<(), SamplerError>>>,
}

impl SamplerHandle {
    pub fn stats(&self) -> Arc<SamplerStats> {
        self.stats.clone()
    }

    /// Waits for the task to end on its own. Only returns early on failure,
    /// since a healthy sampler never stops unless asked.
    pub async fn join(&mut self) -> Result<(), SamplerError> {
        match self.task.as_mut() {
            Some(task) => {
                let result = task.await;
                self.task = None;
                result?
            }
            None => Ok(()),
        }
    }

    /// Signals the loop to stop and waits for it.
    pub async fn stop(mut self) -> Result<(), SamplerError> {
        let _ = self.stop_tx.send(true);
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reading;
    use crate::retention::RetentionConfig;

    struct FixedReader(f64);

    impl MetricReader for FixedReader {
        fn read(&mut self) -> Reading {
            Reading {
                cpu_percent: self.0,
                ram_percent: 50.0,
                ..Reading::default()
            }
        }
    }

    fn fast_options() -> SamplerOptions {
        SamplerOptions {
            poll_interval: Duration::from_millis(10),
            prune_interval: Duration::from_secs(300),
        }
    }

    #[tokio::test]
    async fn test_samples_immediately_and_stops() {
        let store = MetricStore::open_in_memory().await.unwrap();
        let retention = Arc::new(RetentionController::new(RetentionConfig::new(60, 1)));
        let sampler = Sampler::new(FixedReader(42.0), store.clone(), retention, fast_options());

        let handle = sampler.spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stats();
        handle.stop().await.unwrap();

        // One sample at start, the next one is 60s away
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(stats.samples_recorded(), 1);
        assert_eq!(stats.prune_sweeps(), 1);
        assert!(stats.last_sample_ts() > 0);

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.cpu_percent, 42.0);
    }

    #[tokio::test]
    async fn test_initial_prune_removes_expired_rows() {
        let store = MetricStore::open_in_memory().await.unwrap();
        let old = crate::sample::MetricSample {
            timestamp: 1_000,
            cpu_percent: 1.0,
            ram_percent: 1.0,
            up_mbps: 0.0,
            down_mbps: 0.0,
            temperature_c: None,
        };
        store.record(&old).await.unwrap();

        let retention = Arc::new(RetentionController::new(RetentionConfig::new(60, 1)));
        let handle = Sampler::new(FixedReader(1.0), store.clone(), retention, fast_options()).spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stats();
        handle.stop().await.unwrap();

        assert_eq!(stats.rows_pruned(), 1);
        let latest = store.latest().await.unwrap().unwrap();
        assert!(latest.timestamp > 1_000);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_interval_update_applies_without_restart() {
        let store = MetricStore::open_in_memory().await.unwrap();
        let retention = Arc::new(RetentionController::new(RetentionConfig::new(1, 1)));
        let handle = Sampler::new(
            FixedReader(5.0),
            store.clone(),
            retention.clone(),
            fast_options(),
        )
        .spawn();

        // Samples at ~0s and ~1s; the second one picks up the new interval
        tokio::time::sleep(Duration::from_millis(500)).await;
        retention.update(Some(3600), None);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        handle.stop().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    /// `Cell` makes the reader `Send` but not `Sync`.
    struct CellReader(std::cell::Cell<f64>);

    impl MetricReader for CellReader {
        fn read(&mut self) -> Reading {
            self.0.set(self.0.get() + 1.0);
            Reading {
                cpu_percent: self.0.get(),
                ..Reading::default()
            }
        }
    }

    #[tokio::test]
    async fn test_reader_need_not_be_sync() {
        let store = MetricStore::open_in_memory().await.unwrap();
        let retention = Arc::new(RetentionController::new(RetentionConfig::new(60, 1)));
        let handle = Sampler::new(
            CellReader(std::cell::Cell::new(0.0)),
            store.clone(),
            retention,
            fast_options(),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await.unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.cpu_percent, 1.0);
    }

    #[tokio::test]
    async fn test_huge_interval_keeps_sampler_running() {
        let store = MetricStore::open_in_memory().await.unwrap();
        let retention = Arc::new(RetentionController::new(RetentionConfig::default()));
        retention.update(Some(i64::MAX), Some(i64::MAX));

        let mut handle =
            Sampler::new(FixedReader(3.0), store.clone(), retention, fast_options()).spawn();

        // join only returns if the task ended, which it must not
        let ended = tokio::time::timeout(Duration::from_millis(300), handle.join()).await;
        assert!(ended.is_err());

        handle.stop().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_schedule_after_never_overflows() {
        let before = Instant::now();
        assert!(schedule_after(Duration::MAX) >= before);
        assert!(schedule_after(Duration::from_secs(1)) > before);
    }

    #[tokio::test]
    async fn test_store_failure_ends_task() {
        let store = MetricStore::open_in_memory().await.unwrap();
        store.close().await;

        let retention = Arc::new(RetentionController::new(RetentionConfig::default()));
        let mut handle = Sampler::new(FixedReader(1.0), store, retention, fast_options()).spawn();

        let result = tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .unwrap();
        assert!(matches!(result, Err(SamplerError::Store(_))));
    }
}
