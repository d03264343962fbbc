//! Startup requirement validation for herakles-dashboard.
//!
//! Confirms that the host exposes the kernel interfaces the sampler reads
//! and that the metric store location is usable before the server starts.

use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Kernel interfaces every reading depends on.
const REQUIRED_PROC_FILES: [&str; 3] = ["/proc/stat", "/proc/meminfo", "/proc/net/dev"];

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("cannot read {path}: {reason}")]
    ProcUnreadable { path: String, reason: String },

    #[error("database directory {path} is not usable: {reason}")]
    DatabaseDir { path: String, reason: String },
}

/// Validate all runtime requirements.
pub fn validate_requirements(database: &Path, plugins_dir: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_proc_access()?;
    check_database_dir(database)?;
    check_plugins_dir(plugins_dir);

    info!("✅ All runtime requirements validated");
    Ok(())
}

fn check_proc_access() -> Result<(), ValidationError> {
    for path in REQUIRED_PROC_FILES {
        match fs::read_to_string(path) {
            Ok(_) => debug!("✅ {} readable", path),
            Err(e) => {
                error!("❌ Cannot read {} - readings depending on it will be 0", path);
                return Err(ValidationError::ProcUnreadable {
                    path: path.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    // Temperature is optional on many hosts (VMs, containers)
    if !Path::new("/sys/class/thermal").exists() && !Path::new("/sys/class/hwmon").exists() {
        warn!("⚠️  No thermal zones or hwmon sensors found - temperature will be null");
    }

    info!("✅ /proc access: system counters readable");
    Ok(())
}

/// The store creates its file on open; the parent must exist (or be
/// creatable) and must not be read-only.
fn check_database_dir(database: &Path) -> Result<(), ValidationError> {
    let parent = match database.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let fail = |reason: String| ValidationError::DatabaseDir {
        path: parent.display().to_string(),
        reason,
    };

    if !parent.exists() {
        debug!("Database directory {} will be created", parent.display());
        return fs::create_dir_all(parent).map_err(|e| fail(e.to_string()));
    }

    let metadata = fs::metadata(parent).map_err(|e| fail(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(fail("not a directory".into()));
    }
    if metadata.permissions().readonly() {
        return Err(fail("directory is read-only".into()));
    }

    info!("✅ Metric store location: {}", database.display());
    Ok(())
}

fn check_plugins_dir(plugins_dir: &Path) {
    if plugins_dir.is_dir() {
        info!("✅ Plugins directory: {}", plugins_dir.display());
    } else {
        warn!(
            "⚠️  Plugins directory {} not found - starting without plugins",
            plugins_dir.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_dir_is_created() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("dashboard.db");
        check_database_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_database_parent_must_be_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        let err = check_database_dir(&file.join("dashboard.db")).unwrap_err();
        assert!(matches!(err, ValidationError::DatabaseDir { .. }));
    }

    #[test]
    fn test_bare_filename_uses_current_dir() {
        assert!(check_database_dir(Path::new("dashboard.db")).is_ok());
    }
}
