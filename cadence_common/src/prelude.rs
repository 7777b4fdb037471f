//! Prelude module for common re-exports.
//!
//! ```rust
//! use cadence_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{CadenceConfig, ConfigError, ConfigLoader, SchedulerConfig, SharedConfig};

// ─── Identifiers ────────────────────────────────────────────────────
pub use crate::command::{CommandId, InterruptionBehavior, SubsystemId, SubsystemSet};

// ─── Events ─────────────────────────────────────────────────────────
pub use crate::event::{EventKind, EventMask};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_PERIOD_US, MAX_SUBSYSTEMS};

/// Default loop period as Duration.
pub const DEFAULT_PERIOD: Duration = Duration::from_micros(DEFAULT_PERIOD_US);
