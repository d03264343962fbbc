//! Metric sample types.
//!
//! A `MetricSample` is one persisted row per sampling tick; a
//! `BucketedAggregate` is one row of an aggregated history query.

use serde::{Deserialize, Serialize};

/// One raw sample, written once by the sampler and never updated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    /// Upload throughput in Mbit/s.
    pub up_mbps: f64,
    /// Download throughput in Mbit/s.
    pub down_mbps: f64,
    /// Mean sensor temperature; `None` when no sensor is available.
    pub temperature_c: Option<f64>,
}

/// Average of all samples that fall into one time bucket.
///
/// `ts` is the earliest raw timestamp in the bucket, not the bucket
/// boundary. A field with no non-null inputs stays `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketedAggregate {
    pub ts: i64,
    pub cpu: Option<f64>,
    pub ram: Option<f64>,
    pub up: Option<f64>,
    pub down: Option<f64>,
    pub temp: Option<f64>,
}
