//! Host metric readers.
//!
//! A [`MetricReader`] produces one [`Reading`] per call. Rates (CPU busy
//! percentage, network throughput) are deltas against the previous call on
//! the same reader, so every consumer owns its own instance.

use serde::Serialize;
use tracing::debug;

use crate::collectors::{filesystem, netdev, thermal};
use crate::sample::MetricSample;
use crate::system::{self, CpuUsageTracker};

/// Instantaneous host measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub up_mbps: f64,
    pub down_mbps: f64,
    pub temperature_c: Option<f64>,
}

impl Reading {
    /// Stamps the reading for persistence.
    pub fn into_sample(self, timestamp: i64) -> MetricSample {
        MetricSample {
            timestamp,
            cpu_percent: self.cpu_percent,
            ram_percent: self.ram_percent,
            up_mbps: self.up_mbps,
            down_mbps: self.down_mbps,
            temperature_c: self.temperature_c,
        }
    }
}

/// Source of host readings. Never fails: unavailable values degrade to zero
/// (or `None` for temperature).
pub trait MetricReader: Send {
    fn read(&mut self) -> Reading;
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuSnapshot {
    pub total: f64,
    pub per_core: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RamSnapshot {
    pub percent: f64,
    pub used: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskSnapshot {
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetSnapshot {
    pub up_mbps: f64,
    pub down_mbps: f64,
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub ts: i64,
    pub cpu: CpuSnapshot,
    pub ram: RamSnapshot,
    pub disk: DiskSnapshot,
    pub net: NetSnapshot,
    pub temperature_c: Option<f64>,
}

/// Reader backed by /proc and /sys.
#[derive(Debug, Default)]
pub struct ProcReader {
    cpu: CpuUsageTracker,
    net: netdev::NetRateTracker,
}

impl ProcReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn cpu_usage(&mut self) -> system::CpuUsage {
        self.cpu.sample().unwrap_or_else(|e| {
            debug!("CPU read failed: {}", e);
            system::CpuUsage::default()
        })
    }

    fn memory(&self) -> system::MemoryInfo {
        system::read_memory_info().unwrap_or_else(|e| {
            debug!("Memory read failed: {}", e);
            system::MemoryInfo::default()
        })
    }

    fn net_rates(&mut self) -> netdev::NetRates {
        self.net.sample().unwrap_or_else(|e| {
            debug!("Network read failed: {}", e);
            netdev::NetRates::default()
        })
    }

    /// Full snapshot for the live stats view, including per-core CPU and
    /// root filesystem usage.
    pub fn snapshot(&mut self) -> StatsSnapshot {
        let cpu = self.cpu_usage();
        let memory = self.memory();
        let net = self.net_rates();

        let disk_percent = match filesystem::filesystem_usage("/") {
            Ok(usage) => usage.used_percent(),
            Err(e) => {
                debug!("Root filesystem read failed: {}", e);
                0.0
            }
        };

        StatsSnapshot {
            ts: chrono::Utc::now().timestamp(),
            cpu: CpuSnapshot {
                total: cpu.total,
                per_core: cpu.per_core,
            },
            ram: RamSnapshot {
                percent: memory.used_percent(),
                used: memory.used_bytes(),
                total: memory.total_bytes,
            },
            disk: DiskSnapshot { percent: disk_percent },
            net: NetSnapshot {
                up_mbps: net.up_mbps,
                down_mbps: net.down_mbps,
            },
            temperature_c: thermal::mean_temperature(),
        }
    }
}

impl MetricReader for ProcReader {
    fn read(&mut self) -> Reading {
        let cpu = self.cpu_usage();
        let memory = self.memory();
        let net = self.net_rates();

        Reading {
            cpu_percent: cpu.total,
            ram_percent: memory.used_percent(),
            up_mbps: net.up_mbps,
            down_mbps: net.down_mbps,
            temperature_c: thermal::mean_temperature(),
        }
    }
}
