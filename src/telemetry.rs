//! Prometheus self-telemetry for the dashboard process.

use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};

use crate::sampler::SamplerStats;

pub struct DashboardMetrics {
    registry: Registry,
    samples_recorded: Gauge,
    prune_sweeps: Gauge,
    rows_pruned: Gauge,
    last_sample_timestamp: Gauge,
    stored_samples: Gauge,
    plugins_loaded: Gauge,
    http_requests: IntCounterVec,
}

impl DashboardMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let samples_recorded = Gauge::new(
            "herakles_dashboard_samples_recorded_total",
            "Samples written by the sampler since start",
        )?;
        let prune_sweeps = Gauge::new(
            "herakles_dashboard_prune_sweeps_total",
            "Retention prune sweeps since start",
        )?;
        let rows_pruned = Gauge::new(
            "herakles_dashboard_rows_pruned_total",
            "Samples deleted by retention pruning since start",
        )?;
        let last_sample_timestamp = Gauge::new(
            "herakles_dashboard_last_sample_timestamp_seconds",
            "Unix time of the most recent sample",
        )?;
        let stored_samples = Gauge::new(
            "herakles_dashboard_stored_samples",
            "Samples currently held in the metric store",
        )?;
        let plugins_loaded = Gauge::new(
            "herakles_dashboard_plugins_loaded",
            "Plugins registered at startup",
        )?;
        let http_requests = IntCounterVec::new(
            Opts::new(
                "herakles_dashboard_http_requests_total",
                "HTTP requests served, by endpoint",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(samples_recorded.clone()))?;
        registry.register(Box::new(prune_sweeps.clone()))?;
        registry.register(Box::new(rows_pruned.clone()))?;
        registry.register(Box::new(last_sample_timestamp.clone()))?;
        registry.register(Box::new(stored_samples.clone()))?;
        registry.register(Box::new(plugins_loaded.clone()))?;
        registry.register(Box::new(http_requests.clone()))?;

        Ok(Self {
            registry,
            samples_recorded,
            prune_sweeps,
            rows_pruned,
            last_sample_timestamp,
            stored_samples,
            plugins_loaded,
            http_requests,
        })
    }

    pub fn record_request(&self, endpoint: &str) {
        self.http_requests.with_label_values(&[endpoint]).inc();
    }

    pub fn set_plugins_loaded(&self, count: usize) {
        self.plugins_loaded.set(count as f64);
    }

    /// Copies sampler counters and the store size into the gauges.
    pub fn refresh(&self, stats: &SamplerStats, stored_samples: Option<u64>) {
        self.samples_recorded.set(stats.samples_recorded() as f64);
        self.prune_sweeps.set(stats.prune_sweeps() as f64);
        self.rows_pruned.set(stats.rows_pruned() as f64);
        self.last_sample_timestamp.set(stats.last_sample_ts() as f64);
        if let Some(count) = stored_samples {
            self.stored_samples.set(count as f64);
        }
    }

    /// Renders the registry in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
