//! Configuration for the scheduling simulation.
//!
//! Configurations can be loaded from YAML or JSON, or assembled with the
//! builder. Every field has a default, so an empty document is a valid
//! configuration.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   log_level: info
//!   auto_respond: true
//!
//! scheduler:
//!   qubits_per_worker: 2
//!   routing_latency: 10000000000
//!   request:
//!     memory_size: 1
//!     fidelity: 0.7
//!
//! delays:
//!   propagation_speed: 0.0002
//!   per_hop_overhead: 20000000
//!   fixed_overhead: 100000000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controller::DEFAULT_ROUTING_LATENCY;
use crate::requests::RequestParams;
use crate::routing::DelayModel;
use crate::types::Time;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// General simulation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether workers respond automatically when a request's window ends
    #[serde(default = "default_auto_respond")]
    pub auto_respond: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auto_respond() -> bool {
    true
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            auto_respond: default_auto_respond(),
        }
    }
}

/// Scheduling parameters used by the coordinator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerParams {
    /// Qubits per partition, i.e. per worker
    #[serde(default = "default_qubits_per_worker")]
    pub qubits_per_worker: usize,

    /// Lead time between dispatch and a request's start, in picoseconds
    #[serde(default = "default_routing_latency")]
    pub routing_latency: Time,

    /// Fixed per-request memory and fidelity parameters
    #[serde(default)]
    pub request: RequestParams,
}

fn default_qubits_per_worker() -> usize {
    2
}

fn default_routing_latency() -> Time {
    DEFAULT_ROUTING_LATENCY
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            qubits_per_worker: default_qubits_per_worker(),
            routing_latency: default_routing_latency(),
            request: RequestParams::default(),
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// General parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Scheduling parameters
    #[serde(default)]
    pub scheduler: SchedulerParams,

    /// Classical delay model
    #[serde(default)]
    pub delays: DelayModel,
}

impl SimConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting the format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => {
                let content = std::fs::read_to_string(path)?;
                Self::from_yaml(&content)
            }
            "json" => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json(&content)
            }
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scheduler.qubits_per_worker == 0 {
            return Err(ConfigError::Validation(
                "scheduler.qubits_per_worker must be at least 1".to_string(),
            ));
        }
        let fidelity = self.scheduler.request.fidelity;
        if !(fidelity > 0.0 && fidelity <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "scheduler.request.fidelity must be in (0, 1], got {fidelity}"
            )));
        }
        if self.scheduler.request.memory_size == 0 {
            return Err(ConfigError::Validation(
                "scheduler.request.memory_size must be at least 1".to_string(),
            ));
        }
        if !(self.delays.propagation_speed > 0.0) {
            return Err(ConfigError::Validation(format!(
                "delays.propagation_speed must be positive, got {}",
                self.delays.propagation_speed
            )));
        }
        Ok(())
    }

    /// Converts to a YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to a pretty JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for assembling a [`SimConfig`] programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Sets whether workers auto-respond.
    pub fn auto_respond(mut self, enable: bool) -> Self {
        self.config.simulation.auto_respond = enable;
        self
    }

    /// Sets the partition group size.
    pub fn qubits_per_worker(mut self, qubits: usize) -> Self {
        self.config.scheduler.qubits_per_worker = qubits;
        self
    }

    /// Sets the dispatch lead time.
    pub fn routing_latency(mut self, latency: Time) -> Self {
        self.config.scheduler.routing_latency = latency;
        self
    }

    /// Sets the per-request memory size.
    pub fn memory_size(mut self, memory_size: u32) -> Self {
        self.config.scheduler.request.memory_size = memory_size;
        self
    }

    /// Sets the per-request fidelity target.
    pub fn fidelity(mut self, fidelity: f64) -> Self {
        self.config.scheduler.request.fidelity = fidelity;
        self
    }

    /// Sets the classical delay model.
    pub fn delay_model(mut self, delays: DelayModel) -> Self {
        self.config.delays = delays;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MICROSECOND, SECOND};

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = SimConfig::new();
        config.validate().unwrap();

        assert_eq!(config.scheduler.qubits_per_worker, 2);
        assert_eq!(config.scheduler.routing_latency, SECOND / 100);
        assert_eq!(config.scheduler.request.memory_size, 1);
        assert_eq!(config.scheduler.request.fidelity, 0.7);
        assert_eq!(config.delays.per_hop_overhead, 20 * MICROSECOND);
        assert_eq!(config.delays.fixed_overhead, 100 * MICROSECOND);
        assert!(config.simulation.auto_respond);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
simulation:
  log_level: debug
  auto_respond: false

scheduler:
  qubits_per_worker: 4
  routing_latency: 5000000000
  request:
    memory_size: 2
    fidelity: 0.9

delays:
  per_hop_overhead: 10000000
"#;
        let config = SimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.log_level, "debug");
        assert!(!config.simulation.auto_respond);
        assert_eq!(config.scheduler.qubits_per_worker, 4);
        assert_eq!(config.scheduler.request.fidelity, 0.9);
        assert_eq!(config.delays.per_hop_overhead, 10_000_000);
        // Unspecified delay fields keep their defaults.
        assert_eq!(config.delays.fixed_overhead, 100 * MICROSECOND);
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "scheduler": {
                "qubits_per_worker": 3
            }
        }"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.scheduler.qubits_per_worker, 3);
        assert_eq!(config.scheduler.request.fidelity, 0.7);
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config = SimConfig::from_json("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_builder() {
        let config = SimConfigBuilder::new()
            .qubits_per_worker(4)
            .routing_latency(SECOND)
            .fidelity(0.85)
            .auto_respond(false)
            .build()
            .unwrap();

        assert_eq!(config.scheduler.qubits_per_worker, 4);
        assert_eq!(config.scheduler.routing_latency, SECOND);
        assert_eq!(config.scheduler.request.fidelity, 0.85);
        assert!(!config.simulation.auto_respond);
    }

    #[test]
    fn test_validation_rejects_zero_group() {
        let result = SimConfigBuilder::new().qubits_per_worker(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_fidelity() {
        assert!(SimConfigBuilder::new().fidelity(0.0).build().is_err());
        assert!(SimConfigBuilder::new().fidelity(1.5).build().is_err());
        assert!(SimConfigBuilder::new().fidelity(1.0).build().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_memory() {
        let result = SimConfigBuilder::new().memory_size(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = SimConfigBuilder::new()
            .qubits_per_worker(4)
            .fidelity(0.8)
            .build()
            .unwrap();

        let yaml = config.to_yaml().unwrap();
        let restored = SimConfig::from_yaml(&yaml).unwrap();
        assert_eq!(
            restored.scheduler.qubits_per_worker,
            config.scheduler.qubits_per_worker
        );
        assert_eq!(restored.scheduler.request.fidelity, 0.8);
    }
}
