//! Top process listing from /proc.
//!
//! CPU usage is the process's lifetime CPU time divided by its age, which
//! needs no state between requests.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::system;

fn sysconf_or(name: libc::c_int, fallback: f64) -> f64 {
    // SAFETY: sysconf has no preconditions; errors are reported as -1
    let value = unsafe { libc::sysconf(name) };
    if value > 0 {
        value as f64
    } else {
        fallback
    }
}

/// System clock ticks per second.
pub static CLK_TCK: Lazy<f64> = Lazy::new(|| sysconf_or(libc::_SC_CLK_TCK, 100.0));

/// Memory page size in bytes.
pub static PAGE_SIZE: Lazy<f64> = Lazy::new(|| sysconf_or(libc::_SC_PAGESIZE, 4096.0));

/// One row of `GET /api/processes`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub uid: Option<u32>,
    pub cpu: f64,
    pub mem: f64,
}

/// Fields of /proc/<pid>/stat that the listing needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcStat {
    pub comm: String,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub start_ticks: u64,
    pub rss_pages: u64,
}

/// Parses /proc/<pid>/stat content.
///
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`.
pub fn parse_proc_stat(content: &str) -> Option<ProcStat> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let comm = content[open + 1..close].to_string();
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();

    // rest[0] is field 3 (state)
    let field = |n: usize| -> Option<u64> { rest.get(n - 3)?.parse().ok() };

    Some(ProcStat {
        comm,
        utime_ticks: field(14)?,
        stime_ticks: field(15)?,
        start_ticks: field(22)?,
        rss_pages: field(24)?,
    })
}

/// Computes CPU% and memory% for one process.
pub fn usage_of(stat: &ProcStat, uptime_secs: f64, mem_total_bytes: u64) -> (f64, f64) {
    let cpu_secs = (stat.utime_ticks + stat.stime_ticks) as f64 / *CLK_TCK;
    let age_secs = uptime_secs - stat.start_ticks as f64 / *CLK_TCK;
    let cpu = if age_secs > 0.0 {
        cpu_secs / age_secs * 100.0
    } else {
        0.0
    };

    let mem = if mem_total_bytes > 0 {
        stat.rss_pages as f64 * *PAGE_SIZE / mem_total_bytes as f64 * 100.0
    } else {
        0.0
    };

    (cpu, mem)
}

/// Sorts by CPU, then memory, both descending, and keeps the first `top`.
pub fn rank(mut processes: Vec<ProcessInfo>, top: usize) -> Vec<ProcessInfo> {
    processes.sort_by(|a, b| {
        b.cpu
            .partial_cmp(&a.cpu)
            .unwrap_or(Ordering::Equal)
            .then(b.mem.partial_cmp(&a.mem).unwrap_or(Ordering::Equal))
    });
    processes.truncate(top);
    processes
}

fn read_process(proc_path: &Path, pid: u32, uptime: f64, mem_total: u64) -> Option<ProcessInfo> {
    let content = fs::read_to_string(proc_path.join("stat")).ok()?;
    let stat = parse_proc_stat(&content)?;
    let (cpu, mem) = usage_of(&stat, uptime, mem_total);
    let uid = fs::metadata(proc_path).ok().map(|m| m.uid());

    Some(ProcessInfo {
        pid,
        name: stat.comm,
        uid,
        cpu,
        mem,
    })
}

/// Scans `root` (normally `/proc`) and returns the `top` busiest processes.
///
/// Processes that vanish or cannot be read mid-scan are skipped.
pub fn top_processes_in(root: &Path, top: usize) -> Vec<ProcessInfo> {
    let uptime = system::read_uptime().unwrap_or(0.0);
    let mem_total = system::read_memory_info()
        .map(|m| m.total_bytes)
        .unwrap_or(0);

    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            let pid: u32 = match path.file_name().and_then(|s| s.to_str()).map(str::parse::<u32>) {
                Some(Ok(pid)) => pid,
                _ => continue,
            };
            if let Some(info) = read_process(&path, pid, uptime, mem_total) {
                out.push(info);
            }
        }
    }

    rank(out, top)
}

pub fn top_processes(top: usize) -> Vec<ProcessInfo> {
    top_processes_in(Path::new("/proc"), top)
}
