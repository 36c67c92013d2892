//! Configuration schema and site compliance matrix (C11): TOML-backed,
//! environment-overrideable config with a fatal startup validation pass,
//! plus the per-site HUD/tracking table the dispatcher consults.

mod compliance;
mod config;

pub use compliance::{ComplianceMatrix, SiteCompliance};
pub use config::{
    BreakerConfig, CacheConfig, CaptureBackend, CaptureConfig, Config, ConfigError, DispatcherConfig, EnsembleConfig,
    EnsembleMethod, RecorderConfig, StrategiesConfig, TelemetryConfig,
};
