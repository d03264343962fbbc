//! Filesystem usage for the dashboard's disk gauge.

use std::ffi::CString;
use std::mem;

/// Capacity and usage of one mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilesystemUsage {
    pub size_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
}

impl FilesystemUsage {
    /// Used space as a percentage of what is usable by unprivileged users.
    pub fn used_percent(&self) -> f64 {
        let usable = self.used_bytes + self.available_bytes;
        if usable == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / usable as f64 * 100.0
    }
}

/// Gets filesystem usage for the mount containing `path` using libc statvfs.
pub fn filesystem_usage(path: &str) -> Result<FilesystemUsage, String> {
    let c_path = CString::new(path).map_err(|e| format!("Invalid path: {}", e))?;

    unsafe {
        // SAFETY: statvfs is a plain C struct; zeroed memory is a valid initial value
        let mut stat: libc::statvfs = mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(format!("statvfs failed for {}", path));
        }

        let block_size = stat.f_frsize as u64;
        let size_bytes = block_size * stat.f_blocks as u64;
        let available_bytes = block_size * stat.f_bavail as u64;
        let used_bytes = size_bytes.saturating_sub(block_size * stat.f_bfree as u64);

        Ok(FilesystemUsage {
            size_bytes,
            available_bytes,
            used_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_filesystem_usage() {
        let usage = filesystem_usage("/").unwrap();
        assert!(usage.size_bytes > 0);
        let pct = usage.used_percent();
        assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn test_invalid_path() {
        assert!(filesystem_usage("/definitely/not/a/mount/point").is_err());
        assert!(filesystem_usage("bad\0path").is_err());
    }

    #[test]
    fn test_used_percent() {
        let usage = FilesystemUsage {
            size_bytes: 100,
            available_bytes: 25,
            used_bytes: 75,
        };
        assert!((usage.used_percent() - 75.0).abs() < 1e-9);
    }
}
