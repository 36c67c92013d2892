use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::compliance::SiteCompliance;

/// Startup configuration failed to load or validate — fatal.
#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "failed to read config file: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `capture.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    Auto,
    X11,
    Wayland,
    Win32,
    Quartz,
}

impl Default for CaptureBackend {
    fn default() -> Self {
        CaptureBackend::Auto
    }
}

/// `ensemble.method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleMethod {
    WeightedVote,
    HighestConfidence,
    Majority,
    Average,
}

impl Default for EnsembleMethod {
    fn default() -> Self {
        EnsembleMethod::WeightedVote
    }
}

fn default_max_fps() -> u32 {
    10
}
fn default_timeout_ms() -> u64 {
    50
}
fn default_learning_rate() -> f64 {
    0.1
}
fn default_min_weight() -> f64 {
    0.01
}
fn default_stale_ms() -> u64 {
    30_000
}
fn default_true() -> bool {
    true
}
fn default_cache_max_size() -> usize {
    10_000
}
fn default_cache_ttl_s() -> u64 {
    300
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_breaker_timeout_s() -> u64 {
    60
}
fn default_slow_op_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CaptureConfig {
    pub backend: CaptureBackend,
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { backend: CaptureBackend::default(), max_fps: default_max_fps() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StrategiesConfig {
    pub enabled: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self { enabled: Vec::new(), timeout_ms: default_timeout_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EnsembleConfig {
    pub method: EnsembleMethod,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self { method: EnsembleMethod::default(), learning_rate: default_learning_rate(), min_weight: default_min_weight() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DispatcherConfig {
    #[serde(default = "default_stale_ms")]
    pub stale_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { stale_ms: default_stale_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RecorderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    #[serde(default = "default_cache_ttl_s")]
    pub ttl_s: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: default_cache_max_size(), ttl_s: default_cache_ttl_s() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_breaker_timeout_s")]
    pub timeout_s: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: default_failure_threshold(), timeout_s: default_breaker_timeout_s() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct TelemetryConfig {
    #[serde(default = "default_slow_op_ms")]
    pub slow_op_ms: u64,
    pub profile_dir: Option<String>,
}

/// Full recognised configuration schema. Unknown keys at any level are rejected at load time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub strategies: StrategiesConfig,
    pub ensemble: EnsembleConfig,
    pub dispatcher: DispatcherConfig,
    pub recorder: RecorderConfig,
    pub cache: CacheConfig,
    pub breaker: BreakerConfig,
    pub telemetry: TelemetryConfig,
    pub compliance: HashMap<String, SiteCompliance>,
}

impl Config {
    /// Parses TOML text, then applies `PT_<SECTION>_<KEY>` environment
    /// overrides.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::parse(&text)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PT_CAPTURE_MAX_FPS") {
            if let Ok(v) = v.parse() {
                self.capture.max_fps = v;
            }
        }
        if let Ok(v) = std::env::var("PT_STRATEGIES_TIMEOUT_MS") {
            if let Ok(v) = v.parse() {
                self.strategies.timeout_ms = v;
            }
        }
        if let Ok(v) = std::env::var("PT_ENSEMBLE_LEARNING_RATE") {
            if let Ok(v) = v.parse() {
                self.ensemble.learning_rate = v;
            }
        }
        if let Ok(v) = std::env::var("PT_DISPATCHER_STALE_MS") {
            if let Ok(v) = v.parse() {
                self.dispatcher.stale_ms = v;
            }
        }
        if let Ok(v) = std::env::var("PT_RECORDER_ENABLED") {
            if let Ok(v) = v.parse() {
                self.recorder.enabled = v;
            }
        }
        if let Ok(v) = std::env::var("PT_CACHE_MAX_SIZE") {
            if let Ok(v) = v.parse() {
                self.cache.max_size = v;
            }
        }
        if let Ok(v) = std::env::var("PT_CACHE_TTL_S") {
            if let Ok(v) = v.parse() {
                self.cache.ttl_s = v;
            }
        }
        if let Ok(v) = std::env::var("PT_BREAKER_FAILURE_THRESHOLD") {
            if let Ok(v) = v.parse() {
                self.breaker.failure_threshold = v;
            }
        }
        if let Ok(v) = std::env::var("PT_TELEMETRY_SLOW_OP_MS") {
            if let Ok(v) = v.parse() {
                self.telemetry.slow_op_ms = v;
            }
        }
        if let Ok(v) = std::env::var("PT_TELEMETRY_PROFILE_DIR") {
            self.telemetry.profile_dir = Some(v);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.capture.max_fps) {
            return Err(ConfigError::Invalid(format!("capture.max_fps {} out of range [1,60]", self.capture.max_fps)));
        }
        if !(0.0..=1.0).contains(&self.ensemble.learning_rate) {
            return Err(ConfigError::Invalid(format!(
                "ensemble.learning_rate {} out of range [0,1]",
                self.ensemble.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.max_fps, 10);
        assert_eq!(config.cache.max_size, 10_000);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = Config::parse("[capture]\nmax_fps = 30\n").unwrap();
        assert_eq!(config.capture.max_fps, 30);
        assert_eq!(config.breaker.failure_threshold, 5);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = Config::parse("[capture]\nbogus_field = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_fps_is_rejected() {
        let result = Config::parse("[capture]\nmax_fps = 999\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn compliance_table_parses_per_site() {
        let toml = r#"
            [compliance.pokerstars]
            hud_enabled = true
            tracking_enabled = false
        "#;
        let config = Config::parse(toml).unwrap();
        let site = config.compliance.get("pokerstars").unwrap();
        assert!(site.hud_enabled);
        assert!(!site.tracking_enabled);
    }
}
