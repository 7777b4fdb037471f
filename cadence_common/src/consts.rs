//! System-wide constants for the Cadence workspace.
//!
//! Single source of truth for numeric limits and default paths.

/// Maximum number of subsystems a single scheduler can register.
///
/// Requirement sets are packed into one `u64`, one bit per subsystem.
pub const MAX_SUBSYSTEMS: usize = 64;

/// Maximum length of a subsystem name in configuration files.
pub const MAX_SUBSYSTEM_NAME: usize = 32;

/// Default control loop period in microseconds (50 Hz = 20 000 µs).
pub const DEFAULT_PERIOD_US: u64 = 20_000;

/// Shortest loop period accepted by configuration validation (1 kHz).
pub const MIN_PERIOD_US: u64 = 1_000;

/// Longest loop period accepted by configuration validation (1 Hz).
pub const MAX_PERIOD_US: u64 = 1_000_000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/cadence.toml";
