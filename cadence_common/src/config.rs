//! Configuration loading traits and types.
//!
//! Every Cadence binary reads one TOML file shaped like [`CadenceConfig`]:
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "arm-controller"
//!
//! [scheduler]
//! period_us = 20000
//! event_log = ["initialize", "interrupt", "finish"]
//!
//! [[subsystems]]
//! name = "drivetrain"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_PERIOD_US, MAX_PERIOD_US, MAX_SUBSYSTEMS, MAX_SUBSYSTEM_NAME, MIN_PERIOD_US,
};
use crate::event::{EventKind, EventMask};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Equivalent `tracing` level, for subscriber filters.
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields shared across all Cadence applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loop and event-log settings for one scheduler instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Control loop period [µs].
    #[serde(default = "default_period_us")]
    pub period_us: u64,

    /// Log a warning whenever one tick overruns the period.
    #[serde(default = "default_true")]
    pub overrun_warn: bool,

    /// Start in disabled mode (only `runs_when_disabled` commands run).
    #[serde(default)]
    pub start_disabled: bool,

    /// Lifecycle events written to the log.
    #[serde(default = "default_event_log")]
    pub event_log: Vec<EventKind>,
}

fn default_period_us() -> u64 {
    DEFAULT_PERIOD_US
}

fn default_true() -> bool {
    true
}

fn default_event_log() -> Vec<EventKind> {
    vec![EventKind::Initialize, EventKind::Interrupt, EventKind::Finish]
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_us: DEFAULT_PERIOD_US,
            overrun_warn: true,
            start_disabled: false,
            event_log: default_event_log(),
        }
    }
}

impl SchedulerConfig {
    /// Loop period as a `Duration`.
    pub const fn period(&self) -> std::time::Duration {
        std::time::Duration::from_micros(self.period_us)
    }

    /// Event log selection folded into a mask.
    pub fn event_mask(&self) -> EventMask {
        self.event_log.iter().copied().collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PERIOD_US..=MAX_PERIOD_US).contains(&self.period_us) {
            return Err(ConfigError::ValidationError(format!(
                "period_us {} outside [{MIN_PERIOD_US}, {MAX_PERIOD_US}]",
                self.period_us
            )));
        }
        Ok(())
    }
}

/// One statically declared subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemConfig {
    pub name: heapless::String<MAX_SUBSYSTEM_NAME>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    pub shared: SharedConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Subsystems registered at startup, in registration order.
    #[serde(default)]
    pub subsystems: heapless::Vec<SubsystemConfig, MAX_SUBSYSTEMS>,
}

impl CadenceConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Runs all validation rules: shared fields, loop bounds, subsystem names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.scheduler.validate()?;

        let mut seen = HashSet::new();
        for subsystem in &self.subsystems {
            let name = subsystem.name.as_str();
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "subsystem name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate subsystem name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Any serde-deserializable struct can be loaded from TOML.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
