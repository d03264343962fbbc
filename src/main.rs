//! herakles-dashboard - version 0.1.0
//!
//! Self-hosted host monitoring dashboard with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, ValueEnum};
use herakles_dashboard::plugins::{self, load_plugins};
use herakles_dashboard::telemetry::DashboardMetrics;
use herakles_dashboard::{
    BackendCatalog, MetricStore, ProcReader, RetentionController, Sampler, SamplerHandle,
    TokenAuthenticator,
};
use std::future::{Future, IntoFuture};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal, sync::Mutex};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_plugins, command_prune, command_query};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{
    get_retention_handler, health_handler, history_handler, me_handler, metrics_handler,
    plugins_handler, processes_handler, root_handler, stats_handler, update_retention_handler,
};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let level = config
        .log_level
        .as_deref()
        .and_then(|s| <LogLevel as ValueEnum>::from_str(s, true).ok())
        .unwrap_or(LogLevel::Info);

    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {:#}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Drives the server until a shutdown signal arrives. The sampler ending
/// on its own is fatal.
async fn serve_until_shutdown<F>(server: F, sampler: &mut SamplerHandle) -> anyhow::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
        result = sampler.join() => {
            match result {
                Ok(()) => error!("❌ Sampler stopped unexpectedly"),
                Err(e) => error!("❌ Sampler failed: {}", e),
            }
            anyhow::bail!("sampler terminated");
        }
    }
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {:#}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), *format, *commented);
        }

        let config = load_validated_config(&args)?;

        return match command {
            Commands::Check => command_check(&config).await,
            Commands::Plugins { role } => command_plugins(*role, &config),
            Commands::Prune { hours } => command_prune(*hours, &config).await,
            Commands::Query { hours, step } => command_query(*hours, *step, &config).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config);

    info!("Starting herakles-dashboard v{}", env!("CARGO_PKG_VERSION"));

    let database_path = config.database_path();
    let plugins_dir = config.plugins_dir();

    if let Err(e) = startup_checks::validate_requirements(&database_path, &plugins_dir) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The dashboard will start but may not function correctly!");
        // Continue anyway - the store open below is the hard requirement
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let store = MetricStore::open(&database_path).await.map_err(|e| {
        error!("Failed to open metric store {}: {}", database_path.display(), e);
        e
    })?;
    info!("Metric store opened at {}", database_path.display());

    let retention = Arc::new(RetentionController::new(config.retention()));
    let initial = retention.snapshot();
    info!(
        "Sampling every {}s, keeping {}h of history",
        initial.sample_interval_seconds, initial.retention_hours
    );

    // Plugins are loaded once; a bad plugin never blocks startup
    let catalog = BackendCatalog::builtin();
    let report = load_plugins(&plugins_dir, &catalog);
    if !report.skipped.is_empty() {
        warn!("{} plugin(s) skipped, see warnings above", report.skipped.len());
    }
    let registry = Arc::new(report.registry);
    info!("{} plugin(s) registered from {}", registry.len(), plugins_dir.display());

    let authenticator = Arc::new(TokenAuthenticator::new(config.tokens()));
    if authenticator.is_empty() {
        warn!("⚠️  No API tokens configured - protected endpoints will answer 401");
    } else {
        debug!("{} API token(s) configured", authenticator.len());
    }

    let telemetry = DashboardMetrics::new()
        .map_err(|e| anyhow::anyhow!("Failed to register telemetry metrics: {}", e))?;
    telemetry.set_plugins_loaded(registry.len());
    debug!("Prometheus registry initialized");

    let mut sampler = Sampler::new(
        ProcReader::new(),
        store.clone(),
        retention.clone(),
        config.sampler_options(),
    )
    .spawn();
    info!("Sampler started");

    let enable_health = config.enable_health.unwrap_or(true);
    let enable_telemetry = config.enable_telemetry.unwrap_or(true);
    let enable_tls = config.enable_tls.unwrap_or(false);

    let state: SharedState = Arc::new(AppState {
        config: Arc::new(config.clone()),
        store: store.clone(),
        retention,
        plugins: registry.clone(),
        authenticator: authenticator.clone(),
        stats_reader: Mutex::new(ProcReader::new()),
        sampler_stats: sampler.stats(),
        telemetry,
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let bind_ip: IpAddr = bind_ip_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind_ip_str, e))?;
    let addr = SocketAddr::new(bind_ip, port);

    let mut app = Router::new().route("/", get(root_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    }
    if enable_telemetry {
        app = app.route("/metrics", get(metrics_handler));
    }

    app = app
        .route("/api/me", get(me_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/metrics", get(history_handler))
        .route("/api/processes", get(processes_handler))
        .route("/api/plugins", get(plugins_handler))
        .route(
            "/admin/retention",
            get(get_retention_handler).post(update_retention_handler),
        );

    let app = app
        .with_state(state)
        .merge(plugins::routes(&registry, &catalog, authenticator));

    let outcome = if enable_tls {
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            anyhow::bail!("TLS is enabled but certificate or key path is missing");
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!(
            "herakles-dashboard listening on https://{}",
            addr
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());
        serve_until_shutdown(server, &mut sampler).await
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "herakles-dashboard listening on http://{}",
            addr
        );

        let server = axum::serve(listener, app).into_future();
        serve_until_shutdown(server, &mut sampler).await
    };

    info!("Stopping sampler...");
    if let Err(e) = sampler.stop().await {
        error!("Sampler did not stop cleanly: {}", e);
    }
    store.close().await;

    outcome?;
    info!("herakles-dashboard stopped gracefully");
    Ok(())
}
