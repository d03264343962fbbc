//! Herakles Dashboard Library
//!
//! Core of a self-hosted host monitoring dashboard: a background sampler
//! that records CPU, memory, network and temperature readings into SQLite,
//! bucketed history queries over that store, runtime-adjustable retention,
//! and a role-gated plugin registry.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use herakles_dashboard::{
//!     MetricStore, ProcReader, RetentionConfig, RetentionController, Sampler, SamplerOptions,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MetricStore::open("./dashboard.db").await?;
//! let retention = Arc::new(RetentionController::new(RetentionConfig::default()));
//!
//! let sampler = Sampler::new(ProcReader::new(), store.clone(), retention, SamplerOptions::default());
//! let handle = sampler.spawn();
//!
//! let since = chrono::Utc::now().timestamp() - 6 * 3600;
//! for bucket in store.query(since, 60).await? {
//!     println!("{} cpu={:?}", bucket.ts, bucket.cpu);
//! }
//!
//! handle.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod collectors;
pub mod plugins;
pub mod processes;
pub mod reader;
pub mod retention;
pub mod role;
pub mod sample;
pub mod sampler;
pub mod store;
pub mod system;
pub mod telemetry;

// Re-export main types for convenience
pub use auth::{AuthError, Caller, TokenAuthenticator, TokenEntry};
pub use plugins::{BackendCatalog, PluginError, PluginManifest, PluginRegistry, PluginSummary};
pub use reader::{MetricReader, ProcReader, Reading};
pub use retention::{RetentionConfig, RetentionController};
pub use role::Role;
pub use sample::{BucketedAggregate, MetricSample};
pub use sampler::{Sampler, SamplerError, SamplerHandle, SamplerOptions, SamplerStats};
pub use store::{MetricStore, StoreError};
