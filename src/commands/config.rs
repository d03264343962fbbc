//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-dashboard.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Dashboard Configuration
# ================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 5000                   # HTTP port
#
# Storage and Plugins
# -------------------
# database_path: ./dashboard.db  # SQLite file holding the metric history
# plugins_dir: ./plugins         # Scanned once at startup
#
# Sampling and Retention
# ----------------------
# sample_interval_seconds: 5   # Initial sample interval (>= 1, adjustable via /admin/retention)
# retention_hours: 168         # Initial retention window (>= 1, adjustable via /admin/retention)
# poll_interval_ms: 200        # How often the sampler checks whether a sample is due
# prune_interval_seconds: 300  # How often samples older than the window are deleted
# default_query_hours: 6.0     # Window of /api/metrics when ?hours is missing or invalid
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable Prometheus /metrics endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# API Tokens
# ----------
# tokens:                      # Bearer or x-api-key credentials
#   - user: alice
#     token: change-me
#     role: admin              # viewer < user < admin
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commented_yaml_still_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Herakles Dashboard Configuration"));
        let parsed: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed.port, Some(5000));
    }
}
