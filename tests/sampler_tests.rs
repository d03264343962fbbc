//! Integration tests for the background sampler and runtime retention.
//!
//! The sampler and the admin path share one `RetentionController`; these
//! tests check that changes made through it reach the running loop.

use chrono::Utc;
use herakles_dashboard::{
    MetricReader, MetricSample, MetricStore, ProcReader, Reading, RetentionConfig,
    RetentionController, Sampler, SamplerOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

struct Constant;

impl MetricReader for Constant {
    fn read(&mut self) -> Reading {
        Reading {
            cpu_percent: 12.5,
            ram_percent: 33.0,
            up_mbps: 0.25,
            down_mbps: 4.0,
            temperature_c: None,
        }
    }
}

fn old_sample(ts: i64) -> MetricSample {
    MetricSample {
        timestamp: ts,
        cpu_percent: 1.0,
        ram_percent: 1.0,
        up_mbps: 0.0,
        down_mbps: 0.0,
        temperature_c: Some(30.0),
    }
}

#[tokio::test]
async fn test_retention_shrink_reaches_next_prune_sweep() {
    let dir = tempdir().unwrap();
    let store = MetricStore::open(dir.path().join("dashboard.db")).await.unwrap();

    let two_hours_ago = Utc::now().timestamp() - 2 * 3600;
    for offset in 0..5 {
        store.record(&old_sample(two_hours_ago + offset)).await.unwrap();
    }

    let retention = Arc::new(RetentionController::new(RetentionConfig::new(3600, 168)));
    let options = SamplerOptions {
        poll_interval: Duration::from_millis(20),
        prune_interval: Duration::from_millis(100),
    };
    let handle = Sampler::new(Constant, store.clone(), retention.clone(), options).spawn();

    // Inside the 168h window nothing is pruned
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.count().await.unwrap(), 6);

    let applied = retention.update(None, Some(1));
    assert_eq!(applied.retention_hours, 1);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let stats = handle.stats();
    handle.stop().await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(stats.rows_pruned(), 5);
    assert!(stats.prune_sweeps() >= 2);

    let latest = store.latest().await.unwrap().unwrap();
    assert_eq!(latest.cpu_percent, 12.5);
    assert_eq!(latest.temperature_c, None);
}

#[tokio::test]
async fn test_zero_interval_update_is_clamped_for_the_loop() {
    let retention = RetentionController::new(RetentionConfig::default());
    let applied = retention.update(Some(0), Some(0));

    assert_eq!(applied.sample_interval_seconds, 1);
    assert_eq!(applied.retention_hours, 1);
    assert_eq!(retention.snapshot(), applied);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_proc_reader_drives_the_sampler() {
    let store = MetricStore::open_in_memory().await.unwrap();
    let retention = Arc::new(RetentionController::new(RetentionConfig::new(3600, 1)));
    let handle = Sampler::new(
        ProcReader::new(),
        store.clone(),
        retention,
        SamplerOptions::default(),
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.stop().await.unwrap();

    let sample = store.latest().await.unwrap().unwrap();
    assert!((0.0..=100.0).contains(&sample.ram_percent));
    // CPU and network rates need two readings; the first one reports 0
    assert_eq!(sample.cpu_percent, 0.0);
    assert_eq!(sample.up_mbps, 0.0);
}
