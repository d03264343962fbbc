//! Runtime-adjustable sampling and retention settings.
//!
//! The controller is shared between the administrative HTTP operation and the
//! sampler. Updates go through a lock so the sampler observes them on its
//! next poll tick; nothing is persisted across restarts.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::info;

pub const DEFAULT_SAMPLE_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_RETENTION_HOURS: u64 = 168;

/// Upper bound for both settings (about 31 years in seconds).
pub const MAX_SETTING: u64 = 1_000_000_000;

const SECONDS_PER_HOUR: i64 = 3600;

/// Effective sampling and retention settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Seconds between two samples, in `1..=MAX_SETTING`.
    pub sample_interval_seconds: u64,
    /// Maximum sample age in hours, in `1..=MAX_SETTING`.
    pub retention_hours: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sample_interval_seconds: DEFAULT_SAMPLE_INTERVAL_SECONDS,
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl RetentionConfig {
    /// Builds a config, clamping both values into `1..=MAX_SETTING`.
    pub fn new(sample_interval_seconds: i64, retention_hours: i64) -> Self {
        Self {
            sample_interval_seconds: clamp_setting(sample_interval_seconds),
            retention_hours: clamp_setting(retention_hours),
        }
    }

    /// Oldest timestamp that survives a prune at `now`.
    pub fn cutoff(&self, now: i64) -> i64 {
        let window = i64::try_from(self.retention_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(SECONDS_PER_HOUR);
        now.saturating_sub(window)
    }
}

/// Values below 1 become 1, values above [`MAX_SETTING`] become
/// `MAX_SETTING`.
pub fn clamp_setting(value: i64) -> u64 {
    value.clamp(1, MAX_SETTING as i64) as u64
}

/// Shared, lock-guarded retention settings.
#[derive(Debug, Default)]
pub struct RetentionController {
    inner: RwLock<RetentionConfig>,
}

impl RetentionController {
    pub fn new(initial: RetentionConfig) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Current effective settings.
    pub fn snapshot(&self) -> RetentionConfig {
        // RetentionConfig is Copy and always valid, so a poisoned lock still
        // holds a usable value.
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies an administrative update and returns the effective settings.
    ///
    /// `None` keeps the current value; others are clamped into `1..=MAX_SETTING`.
    pub fn update(&self, interval_seconds: Option<i64>, retention_hours: Option<i64>) -> RetentionConfig {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if let Some(interval) = interval_seconds {
            guard.sample_interval_seconds = clamp_setting(interval);
        }
        if let Some(hours) = retention_hours {
            guard.retention_hours = clamp_setting(hours);
        }

        let effective = *guard;
        drop(guard);

        info!(
            "Retention updated: interval={}s retention={}h",
            effective.sample_interval_seconds, effective.retention_hours
        );
        effective
    }
}
