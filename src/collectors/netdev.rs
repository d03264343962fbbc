//! Network interface counters and throughput from /proc/net/dev.

use std::collections::HashMap;
use std::fs;
use std::time::Instant;

/// Byte counters of one network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetDevStats {
    pub receive_bytes: u64,
    pub transmit_bytes: u64,
}

/// Parses /proc/net/dev content into per-interface byte counters.
pub fn parse_netdev(content: &str) -> HashMap<String, NetDevStats> {
    let mut stats = HashMap::new();

    // The first two lines are headers
    for line in content.lines().skip(2) {
        let Some((interface, values)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = values.split_whitespace().collect();
        if values.len() < 16 {
            continue; // Skip malformed lines
        }

        stats.insert(
            interface.trim().to_string(),
            NetDevStats {
                receive_bytes: values[0].parse().unwrap_or(0),
                transmit_bytes: values[8].parse().unwrap_or(0),
            },
        );
    }

    stats
}

/// Reads network interface statistics from /proc/net/dev.
pub fn read_netdev_stats() -> Result<HashMap<String, NetDevStats>, String> {
    let content = fs::read_to_string("/proc/net/dev")
        .map_err(|e| format!("Failed to read /proc/net/dev: {}", e))?;
    Ok(parse_netdev(&content))
}

/// Sums counters over every interface except loopback.
pub fn total_excluding_loopback(stats: &HashMap<String, NetDevStats>) -> NetDevStats {
    stats
        .iter()
        .filter(|(name, _)| name.as_str() != "lo")
        .fold(NetDevStats { receive_bytes: 0, transmit_bytes: 0 }, |acc, (_, s)| NetDevStats {
            receive_bytes: acc.receive_bytes.saturating_add(s.receive_bytes),
            transmit_bytes: acc.transmit_bytes.saturating_add(s.transmit_bytes),
        })
}

/// Turns successive byte counters into Mbit/s.
#[derive(Debug, Default)]
pub struct NetRateTracker {
    previous: Option<(Instant, NetDevStats)>,
}

/// Upload/download throughput in Mbit/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRates {
    pub up_mbps: f64,
    pub down_mbps: f64,
}

/// Converts a byte delta over `elapsed_secs` into Mbit/s.
///
/// Elapsed time is floored at one microsecond; counter resets yield zero.
pub fn rates_between(previous: NetDevStats, current: NetDevStats, elapsed_secs: f64) -> NetRates {
    let dt = elapsed_secs.max(1e-6);
    let sent = current.transmit_bytes.saturating_sub(previous.transmit_bytes) as f64;
    let recv = current.receive_bytes.saturating_sub(previous.receive_bytes) as f64;
    NetRates {
        up_mbps: sent / dt * 8.0 / 1e6,
        down_mbps: recv / dt * 8.0 / 1e6,
    }
}

impl NetRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the current totals observed at `now`; the first call reports zero.
    pub fn update(&mut self, now: Instant, current: NetDevStats) -> NetRates {
        let rates = match self.previous {
            Some((then, previous)) => {
                rates_between(previous, current, now.duration_since(then).as_secs_f64())
            }
            None => NetRates::default(),
        };
        self.previous = Some((now, current));
        rates
    }

    /// Reads /proc/net/dev and updates the tracker.
    pub fn sample(&mut self) -> Result<NetRates, String> {
        let stats = read_netdev_stats()?;
        Ok(self.update(Instant::now(), total_excluding_loopback(&stats)))
    }
}
