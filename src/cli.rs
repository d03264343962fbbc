//! CLI arguments and subcommands for herakles-dashboard.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use herakles_dashboard::Role;
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-dashboard",
    about = "Self-hosted host monitoring dashboard with metric history and plugins",
    long_about = "Self-hosted host monitoring dashboard.\n\n\
                  Samples CPU, memory, network throughput and temperature in the background, \
                  keeps a bounded history in SQLite, serves bucketed history queries over HTTP \
                  and loads role-gated dashboard plugins from disk.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "More info: https://www.herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// SQLite database holding the metric history
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory scanned for plugins at startup
    #[arg(long)]
    pub plugins_dir: Option<PathBuf>,

    /// Initial sample interval in seconds
    #[arg(long)]
    pub sample_interval: Option<i64>,

    /// Initial retention window in hours
    #[arg(long)]
    pub retention_hours: Option<i64>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable the Prometheus /metrics endpoint
    #[arg(long)]
    pub disable_telemetry: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration, database, plugins and /proc access
    Check,

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Load plugins and list those visible to a role
    Plugins {
        /// Role to list plugins for
        #[arg(short = 'r', long, default_value = "admin")]
        role: Role,
    },

    /// Delete samples older than the retention window
    Prune {
        /// Retention window in hours (defaults to the configured value)
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Print bucketed metric history as JSON
    Query {
        /// How far back to look, in hours
        #[arg(long, default_value_t = 6.0)]
        hours: f64,

        /// Bucket width in seconds (defaults to the sample interval)
        #[arg(long)]
        step: Option<i64>,
    },
}
