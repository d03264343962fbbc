//! System-wide readings from the /proc filesystem.
//!
//! Parsers take file contents so they can be exercised against fixtures;
//! the `read_*` wrappers pull the live files.

use std::collections::HashMap;
use std::fs;

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

/// Total and available memory from /proc/meminfo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryInfo {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Used memory as a percentage of total, 0 when total is unknown.
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64 * 100.0
    }
}

/// CPU time counters for one `cpu*` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Busy percentage between two counter snapshots, `None` if no time elapsed.
pub fn busy_percent(previous: &CpuStat, current: &CpuStat) -> Option<f64> {
    let delta_total = current.total().saturating_sub(previous.total());
    if delta_total == 0 {
        return None;
    }
    let delta_idle = current.idle_total().saturating_sub(previous.idle_total());
    let busy = delta_total.saturating_sub(delta_idle);
    Some(busy as f64 / delta_total as f64 * 100.0)
}

/// Parses the `cpu` and `cpuN` lines of /proc/stat.
///
/// "cpu" is the aggregate across all cores, "cpu0", "cpu1", ... are cores.
pub fn parse_cpu_stats(content: &str) -> Result<HashMap<String, CpuStat>, String> {
    let mut stats = HashMap::new();

    for line in content.lines() {
        if !line.starts_with("cpu") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 8 {
            continue;
        }

        let field = |i: usize| parts.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);

        stats.insert(
            parts[0].to_string(),
            CpuStat {
                user: field(1),
                nice: field(2),
                system: field(3),
                idle: field(4),
                iowait: field(5),
                irq: field(6),
                softirq: field(7),
                steal: field(8),
            },
        );
    }

    if stats.is_empty() {
        return Err("No CPU statistics found in /proc/stat".to_string());
    }

    Ok(stats)
}

/// Reads CPU statistics from /proc/stat.
pub fn read_cpu_stats() -> Result<HashMap<String, CpuStat>, String> {
    let content = fs::read_to_string("/proc/stat")
        .map_err(|e| format!("Failed to read /proc/stat: {}", e))?;
    parse_cpu_stats(&content)
}

/// Remembers the previous /proc/stat snapshot to turn counters into
/// busy percentages.
#[derive(Debug, Default)]
pub struct CpuUsageTracker {
    previous: Option<HashMap<String, CpuStat>>,
}

/// CPU usage derived from two consecutive snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUsage {
    /// Aggregate busy percentage.
    pub total: f64,
    /// Busy percentage per core, ordered cpu0, cpu1, ...
    pub per_core: Vec<f64>,
}

impl CpuUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a new snapshot and returns usage since the previous one.
    ///
    /// The first call has no baseline and reports zero usage.
    pub fn update(&mut self, current: HashMap<String, CpuStat>) -> CpuUsage {
        let mut usage = CpuUsage::default();

        if let Some(previous) = &self.previous {
            if let (Some(prev), Some(cur)) = (previous.get("cpu"), current.get("cpu")) {
                usage.total = busy_percent(prev, cur).unwrap_or(0.0);
            }

            let mut cores: Vec<(usize, f64)> = current
                .iter()
                .filter_map(|(name, cur)| {
                    let index = name.strip_prefix("cpu")?.parse::<usize>().ok()?;
                    let prev = previous.get(name)?;
                    Some((index, busy_percent(prev, cur).unwrap_or(0.0)))
                })
                .collect();
            cores.sort_by_key(|(index, _)| *index);
            usage.per_core = cores.into_iter().map(|(_, pct)| pct).collect();
        }

        self.previous = Some(current);
        usage
    }

    /// Reads /proc/stat and updates the tracker.
    pub fn sample(&mut self) -> Result<CpuUsage, String> {
        let current = read_cpu_stats()?;
        Ok(self.update(current))
    }
}

/// Parses MemTotal and MemAvailable from /proc/meminfo content.
pub fn parse_meminfo(content: &str) -> Result<MemoryInfo, String> {
    let mut total_bytes: Option<u64> = None;
    let mut available_bytes: Option<u64> = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let key = parts.next();
        let kb = parts.next().and_then(|v| v.parse::<u64>().ok());
        match (key, kb) {
            (Some("MemTotal:"), Some(kb)) => total_bytes = Some(kb * 1024),
            (Some("MemAvailable:"), Some(kb)) => available_bytes = Some(kb * 1024),
            _ => {}
        }

        if total_bytes.is_some() && available_bytes.is_some() {
            break;
        }
    }

    match (total_bytes, available_bytes) {
        (Some(total), Some(available)) => Ok(MemoryInfo {
            total_bytes: total,
            available_bytes: available,
        }),
        _ => Err("Failed to parse MemTotal/MemAvailable from /proc/meminfo".to_string()),
    }
}

/// Reads memory information from /proc/meminfo.
pub fn read_memory_info() -> Result<MemoryInfo, String> {
    let content = fs::read_to_string("/proc/meminfo")
        .map_err(|e| format!("Failed to read /proc/meminfo: {}", e))?;
    parse_meminfo(&content)
}

/// Parses the first three fields of /proc/loadavg.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn parse_load_average(content: &str) -> Result<LoadAverage, String> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!(
            "Invalid /proc/loadavg format: expected at least 3 fields, got {}",
            parts.len()
        ));
    }

    let one_min = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 1min load average: {}", e))?;
    let five_min = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 5min load average: {}", e))?;
    let fifteen_min = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 15min load average: {}", e))?;

    Ok(LoadAverage {
        one_min,
        five_min,
        fifteen_min,
    })
}

/// Reads load average from /proc/loadavg.
pub fn read_load_average() -> Result<LoadAverage, String> {
    let content = fs::read_to_string("/proc/loadavg")
        .map_err(|e| format!("Failed to read /proc/loadavg: {}", e))?;
    parse_load_average(&content)
}

/// Reads system uptime in seconds from /proc/uptime.
///
/// Format: "<uptime_seconds> <idle_seconds>"
pub fn read_uptime() -> Result<f64, String> {
    let content = fs::read_to_string("/proc/uptime")
        .map_err(|e| format!("Failed to read /proc/uptime: {}", e))?;

    content
        .split_whitespace()
        .next()
        .ok_or_else(|| "Invalid /proc/uptime format: no fields found".to_string())?
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse uptime: {}", e))
}

/// Kernel identification from the uname syscall.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnameInfo {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub machine: String,
}

/// Reads system information from the uname syscall.
pub fn read_uname_info() -> Result<UnameInfo, String> {
    use std::ffi::CStr;
    use std::mem;

    unsafe {
        // SAFETY: libc::utsname is a C struct with only arrays of c_char
        // which are valid for zeroed memory initialization
        let mut utsname: libc::utsname = mem::zeroed();
        if libc::uname(&mut utsname) != 0 {
            return Err("Failed to call uname".to_string());
        }

        let field = |ptr: *const libc::c_char| CStr::from_ptr(ptr).to_string_lossy().into_owned();

        Ok(UnameInfo {
            sysname: field(utsname.sysname.as_ptr()),
            nodename: field(utsname.nodename.as_ptr()),
            release: field(utsname.release.as_ptr()),
            machine: field(utsname.machine.as_ptr()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT_A: &str = "cpu  100 0 100 800 0 0 0 0 0 0
cpu0 50 0 50 400 0 0 0 0 0 0
cpu1 50 0 50 400 0 0 0 0 0 0
intr 12345
ctxt 999
";

    const PROC_STAT_B: &str = "cpu  200 0 200 1000 0 0 0 0 0 0
cpu0 150 0 50 400 0 0 0 0 0 0
cpu1 50 0 150 600 0 0 0 0 0 0
";

    #[test]
    fn test_parse_cpu_stats() {
        let stats = parse_cpu_stats(PROC_STAT_A).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["cpu"].total(), 1000);
        assert_eq!(stats["cpu0"].idle, 400);
    }

    #[test]
    fn test_parse_cpu_stats_empty() {
        assert!(parse_cpu_stats("intr 1\n").is_err());
    }

    #[test]
    fn test_cpu_tracker_first_call_is_zero() {
        let mut tracker = CpuUsageTracker::new();
        let usage = tracker.update(parse_cpu_stats(PROC_STAT_A).unwrap());
        assert_eq!(usage.total, 0.0);
        assert!(usage.per_core.is_empty());
    }

    #[test]
    fn test_cpu_tracker_delta() {
        let mut tracker = CpuUsageTracker::new();
        tracker.update(parse_cpu_stats(PROC_STAT_A).unwrap());
        let usage = tracker.update(parse_cpu_stats(PROC_STAT_B).unwrap());

        // total: busy delta 200 of 400 ticks
        assert!((usage.total - 50.0).abs() < 1e-9);
        assert_eq!(usage.per_core.len(), 2);
        // cpu0: 100 busy of 100; cpu1: 100 busy of 300
        assert!((usage.per_core[0] - 100.0).abs() < 1e-9);
        assert!((usage.per_core[1] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16000000 kB\nMemFree:         1000000 kB\nMemAvailable:    4000000 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.total_bytes, 16_000_000 * 1024);
        assert!((info.used_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_meminfo_missing_fields() {
        assert!(parse_meminfo("MemTotal: 100 kB\n").is_err());
    }

    #[test]
    fn test_parse_load_average() {
        let load = parse_load_average("0.52 0.58 0.59 2/1190 12345").unwrap();
        assert!((load.one_min - 0.52).abs() < 0.001);
        assert!((load.five_min - 0.58).abs() < 0.001);
        assert!((load.fifteen_min - 0.59).abs() < 0.001);
    }

    #[test]
    fn test_parse_load_average_invalid() {
        assert!(parse_load_average("0.52 0.58").is_err());
        assert!(parse_load_average("abc def ghi 1/2 3").is_err());
    }
}
