//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defaults live here, in the loader; the core components receive the
//! resolved values and assume nothing on their own.

use serde::Deserialize;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub core: CoreConfig,
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Knobs consumed by the dispatch core.
#[derive(Debug, Deserialize, Clone)]
pub struct CoreConfig {
    /// Sessions idle longer than this are evicted by the sweep.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Token bucket burst capacity per (sender, conversation).
    #[serde(default = "default_bucket_capacity")]
    pub rate_bucket_capacity: f64,
    /// Token bucket refill rate, tokens per second.
    #[serde(default = "default_refill_per_second")]
    pub rate_refill_per_second: f64,
    /// Hard deadline for a single handler invocation.
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_ms: u64,
    /// Minimum gap between "rate limited" notices for one bucket.
    #[serde(default = "default_notice_cooldown")]
    pub rate_notice_cooldown_secs: u64,
    /// Rate buckets untouched for this long are garbage-collected.
    #[serde(default = "default_bucket_idle_horizon")]
    pub bucket_idle_horizon_secs: u64,
    /// Cadence of the background eviction/GC sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            rate_bucket_capacity: default_bucket_capacity(),
            rate_refill_per_second: default_refill_per_second(),
            handler_timeout_ms: default_handler_timeout(),
            rate_notice_cooldown_secs: default_notice_cooldown(),
            bucket_idle_horizon_secs: default_bucket_idle_horizon(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_session_ttl() -> u64 {
    900
}
fn default_bucket_capacity() -> f64 {
    5.0
}
fn default_refill_per_second() -> f64 {
    1.0
}
fn default_handler_timeout() -> u64 {
    30_000
}
fn default_notice_cooldown() -> u64 {
    30
}
fn default_bucket_idle_horizon() -> u64 {
    600
}
fn default_sweep_interval() -> u64 {
    30
}
