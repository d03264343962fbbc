//! Configuration management for herakles-dashboard.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::{bail, Context};
use clap::ValueEnum;
use herakles_dashboard::retention::{DEFAULT_RETENTION_HOURS, DEFAULT_SAMPLE_INTERVAL_SECONDS};
use herakles_dashboard::sampler::SamplerOptions;
use herakles_dashboard::{RetentionConfig, TokenEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "./dashboard.db";
pub const DEFAULT_PLUGINS_DIR: &str = "./plugins";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_PRUNE_INTERVAL_SECONDS: u64 = 300;
pub const DEFAULT_QUERY_HOURS: f64 = 6.0;

/// Config file locations tried in order when no --config is given.
pub const DEFAULT_CONFIG_LOCATIONS: [&str; 4] = [
    "/etc/herakles/dashboard.yaml",
    "./herakles-dashboard.yaml",
    "./herakles-dashboard.yml",
    "./herakles-dashboard.json",
];

/// Dashboard configuration. Every field is optional; `None` means default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Logging
    pub log_level: Option<String>,

    // Storage and plugins
    #[serde(alias = "database-path")]
    pub database_path: Option<PathBuf>,
    #[serde(alias = "plugins-dir")]
    pub plugins_dir: Option<PathBuf>,

    // Sampling and retention (initial values, adjustable at runtime)
    #[serde(alias = "sample-interval-seconds")]
    pub sample_interval_seconds: Option<i64>,
    #[serde(alias = "retention-hours")]
    pub retention_hours: Option<i64>,
    #[serde(alias = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,
    #[serde(alias = "prune-interval-seconds")]
    pub prune_interval_seconds: Option<u64>,
    #[serde(alias = "default-query-hours")]
    pub default_query_hours: Option<f64>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// API tokens; kept last so TOML output places the table array after plain keys.
    pub tokens: Option<Vec<TokenEntry>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            log_level: Some("info".into()),
            database_path: Some(PathBuf::from(DEFAULT_DATABASE_PATH)),
            plugins_dir: Some(PathBuf::from(DEFAULT_PLUGINS_DIR)),
            sample_interval_seconds: Some(DEFAULT_SAMPLE_INTERVAL_SECONDS as i64),
            retention_hours: Some(DEFAULT_RETENTION_HOURS as i64),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            prune_interval_seconds: Some(DEFAULT_PRUNE_INTERVAL_SECONDS),
            default_query_hours: Some(DEFAULT_QUERY_HOURS),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            tokens: Some(Vec::new()),
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGINS_DIR))
    }

    /// Initial retention values, clamped to at least 1.
    pub fn retention(&self) -> RetentionConfig {
        RetentionConfig::new(
            self.sample_interval_seconds
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL_SECONDS as i64),
            self.retention_hours.unwrap_or(DEFAULT_RETENTION_HOURS as i64),
        )
    }

    pub fn sampler_options(&self) -> SamplerOptions {
        SamplerOptions {
            poll_interval: Duration::from_millis(
                self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            prune_interval: Duration::from_secs(
                self.prune_interval_seconds
                    .unwrap_or(DEFAULT_PRUNE_INTERVAL_SECONDS),
            ),
        }
    }

    pub fn default_query_hours(&self) -> f64 {
        self.default_query_hours.unwrap_or(DEFAULT_QUERY_HOURS)
    }

    pub fn tokens(&self) -> &[TokenEntry] {
        self.tokens.as_deref().unwrap_or(&[])
    }
}

fn validate_tls_file(kind: &str, path: &str) -> anyhow::Result<()> {
    let meta = fs::metadata(path)
        .with_context(|| format!("TLS {} file not found or not readable: {}", kind, path))?;
    if meta.len() == 0 {
        bail!("TLS {} file is empty: {}", kind, path);
    }
    Ok(())
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if let Some(level) = cfg.log_level.as_deref() {
        if <LogLevel as ValueEnum>::from_str(level, true).is_err() {
            bail!(
                "Invalid log_level '{}' (expected off, error, warn, info, debug or trace)",
                level
            );
        }
    }
    if cfg.poll_interval_ms == Some(0) {
        bail!("poll_interval_ms must be greater than 0");
    }
    if cfg.prune_interval_seconds == Some(0) {
        bail!("prune_interval_seconds must be greater than 0");
    }
    if let Some(hours) = cfg.default_query_hours {
        if !(hours.is_finite() && hours > 0.0) {
            bail!("default_query_hours must be a positive number, got {}", hours);
        }
    }

    // Token table
    let mut seen = HashSet::new();
    for entry in cfg.tokens() {
        if entry.token.trim().is_empty() {
            bail!("Token for user '{}' is empty", entry.user);
        }
        if !seen.insert(entry.token.as_str()) {
            bail!("Duplicate token configured (user '{}')", entry.user);
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        match (cfg.tls_cert_path.as_deref(), cfg.tls_key_path.as_deref()) {
            (None, None) => {
                bail!("TLS is enabled but neither tls_cert_path nor tls_key_path are set")
            }
            (Some(_), None) => bail!("TLS is enabled but tls_key_path is not set"),
            (None, Some(_)) => bail!("TLS is enabled but tls_cert_path is not set"),
            (Some(cert), Some(key)) => {
                validate_tls_file("certificate", cert)?;
                validate_tls_file("private key", key)?;
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{:?}", level).to_lowercase());
    }

    if let Some(path) = &args.database {
        config.database_path = Some(path.clone());
    }
    if let Some(dir) = &args.plugins_dir {
        config.plugins_dir = Some(dir.clone());
    }
    if let Some(interval) = args.sample_interval {
        config.sample_interval_seconds = Some(interval);
    }
    if let Some(hours) = args.retention_hours {
        config.retention_hours = Some(hours);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file, or defaults when none is found.
///
/// An explicitly given path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use herakles_dashboard::Role;
    use tempfile::tempdir;

    fn token(user: &str, token: &str) -> TokenEntry {
        TokenEntry {
            user: user.into(),
            token: token.into(),
            role: Role::Viewer,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let cfg = Config {
            log_level: Some("verbose".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            log_level: Some("DEBUG".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let cfg = Config {
            poll_interval_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            prune_interval_seconds: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_token_validation() {
        let cfg = Config {
            tokens: Some(vec![token("a", "same"), token("b", "same")]),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Duplicate token"));

        let cfg = Config {
            tokens: Some(vec![token("a", "  ")]),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_tls_requires_both_files() {
        let cfg = Config {
            enable_tls: Some(true),
            tls_cert_path: Some("/nonexistent/cert.pem".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("tls_key_path"));
    }

    #[test]
    fn test_retention_from_config_is_clamped() {
        let cfg = Config {
            sample_interval_seconds: Some(0),
            retention_hours: Some(-5),
            ..Config::default()
        };
        let retention = cfg.retention();
        assert_eq!(retention.sample_interval_seconds, 1);
        assert_eq!(retention.retention_hours, 1);
    }

    #[test]
    fn test_load_yaml_with_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        fs::write(
            &path,
            "port: 8080\nsample_interval_seconds: 10\ntokens:\n  - user: root\n    token: s3cret\n    role: admin\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.retention().sample_interval_seconds, 10);
        assert_eq!(cfg.tokens()[0].role, Role::Admin);
        // Absent keys stay unset and fall back to defaults
        assert_eq!(cfg.database_path(), PathBuf::from(DEFAULT_DATABASE_PATH));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn test_render_all_formats() {
        let cfg = Config {
            tokens: Some(vec![token("a", "t")]),
            ..Config::default()
        };
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let text = render_config(&cfg, format).unwrap();
            assert!(text.contains("sample_interval_seconds"));
        }
    }
}
