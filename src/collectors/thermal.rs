//! Thermal sensor collector for reading host temperature.
//!
//! Readings come from:
//! - /sys/class/thermal/thermal_zone*/temp
//! - /sys/class/hwmon/hwmon*/temp*_input
//!
//! A host without sensors is not an error; it simply reports no temperature.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const THERMAL_BASE: &str = "/sys/class/thermal";
pub const HWMON_BASE: &str = "/sys/class/hwmon";

/// Reads a millidegree value and converts it to Celsius.
fn read_millidegrees(path: &Path) -> Option<f64> {
    let content = fs::read_to_string(path).ok()?;
    let millidegrees = content.trim().parse::<i64>().ok()?;
    Some(millidegrees as f64 / 1000.0)
}

/// Reads temperature from all thermal zones below `base`.
pub fn read_thermal_zones(base: &Path) -> Result<HashMap<String, f64>, String> {
    let mut temperatures = HashMap::new();

    if !base.exists() {
        return Ok(temperatures);
    }

    let entries =
        fs::read_dir(base).map_err(|e| format!("Failed to read thermal directory: {}", e))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let zone_name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };

        if !zone_name.starts_with("thermal_zone") {
            continue;
        }

        if let Some(celsius) = read_millidegrees(&path.join("temp")) {
            temperatures.insert(zone_name, celsius);
        }
    }

    Ok(temperatures)
}

/// Reads temperature inputs from hardware monitoring devices below `base`.
pub fn read_hwmon_temps(base: &Path) -> Result<HashMap<String, f64>, String> {
    let mut temperatures = HashMap::new();

    if !base.exists() {
        return Ok(temperatures);
    }

    let entries =
        fs::read_dir(base).map_err(|e| format!("Failed to read hwmon directory: {}", e))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let hwmon_name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };

        if !hwmon_name.starts_with("hwmon") {
            continue;
        }

        let device_name = fs::read_to_string(path.join("name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| hwmon_name.clone());

        let Ok(dir_entries) = fs::read_dir(&path) else {
            continue;
        };

        for temp_entry in dir_entries.flatten() {
            let temp_path = temp_entry.path();
            let temp_filename = match temp_path.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };

            if !temp_filename.starts_with("temp") || !temp_filename.ends_with("_input") {
                continue;
            }

            if let Some(celsius) = read_millidegrees(&temp_path) {
                temperatures.insert(format!("{}_{}", device_name, temp_filename), celsius);
            }
        }
    }

    Ok(temperatures)
}

/// Mean of every thermal-zone and hwmon reading below the given roots,
/// `None` when no sensor reports a value.
pub fn mean_temperature_from(thermal_base: &Path, hwmon_base: &Path) -> Option<f64> {
    let mut values: Vec<f64> = Vec::new();

    if let Ok(zones) = read_thermal_zones(thermal_base) {
        values.extend(zones.into_values());
    }
    if let Ok(hwmon) = read_hwmon_temps(hwmon_base) {
        values.extend(hwmon.into_values());
    }

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean host temperature from the standard sysfs locations.
pub fn mean_temperature() -> Option<f64> {
    mean_temperature_from(Path::new(THERMAL_BASE), Path::new(HWMON_BASE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_roots_report_no_temperature() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(mean_temperature_from(&missing, &missing), None);
    }

    #[test]
    fn test_mean_of_zones_and_hwmon() {
        let dir = tempdir().unwrap();
        let thermal = dir.path().join("thermal");
        let hwmon = dir.path().join("hwmon");

        fs::create_dir_all(thermal.join("thermal_zone0")).unwrap();
        fs::write(thermal.join("thermal_zone0/temp"), "40000\n").unwrap();
        fs::create_dir_all(thermal.join("cooling_device0")).unwrap();
        fs::write(thermal.join("cooling_device0/temp"), "99000\n").unwrap();

        fs::create_dir_all(hwmon.join("hwmon0")).unwrap();
        fs::write(hwmon.join("hwmon0/name"), "coretemp\n").unwrap();
        fs::write(hwmon.join("hwmon0/temp1_input"), "50000\n").unwrap();
        fs::write(hwmon.join("hwmon0/temp1_label"), "Package\n").unwrap();

        let zones = read_thermal_zones(&thermal).unwrap();
        assert_eq!(zones.len(), 1);

        let hw = read_hwmon_temps(&hwmon).unwrap();
        assert_eq!(hw.get("coretemp_temp1_input"), Some(&50.0));

        assert_eq!(mean_temperature_from(&thermal, &hwmon), Some(45.0));
    }

    #[test]
    fn test_unparseable_sensor_is_ignored() {
        let dir = tempdir().unwrap();
        let thermal = dir.path().join("thermal");
        fs::create_dir_all(thermal.join("thermal_zone0")).unwrap();
        fs::write(thermal.join("thermal_zone0/temp"), "n/a\n").unwrap();

        assert_eq!(mean_temperature_from(&thermal, &dir.path().join("none")), None);
    }
}
