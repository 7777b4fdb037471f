//! Applying a loaded [`CadenceConfig`] to a scheduler.

use std::collections::HashMap;
use std::path::Path;

use cadence_common::command::SubsystemId;
use cadence_common::config::{CadenceConfig, ConfigError};
use tracing::info;

use crate::error::RegistrationError;
use crate::scheduler::CommandScheduler;
use crate::scheduler::events::TracingEventSink;

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<CadenceConfig, ConfigError> {
    CadenceConfig::load_validated(path)
}

/// Register configured subsystems, set the initial mode and attach a
/// [`TracingEventSink`] with the configured event mask.
///
/// Returns the name → id map of the registered subsystems.
pub fn apply_config(
    scheduler: &mut CommandScheduler,
    config: &CadenceConfig,
) -> Result<HashMap<String, SubsystemId>, RegistrationError> {
    let mut subsystems = HashMap::with_capacity(config.subsystems.len());
    for subsystem in &config.subsystems {
        let name = subsystem.name.as_str();
        let id = scheduler.register_subsystem(name)?;
        subsystems.insert(name.to_string(), id);
    }

    scheduler.set_disabled(config.scheduler.start_disabled);

    let mask = config.scheduler.event_mask();
    if !mask.is_empty() {
        scheduler.add_event_sink(TracingEventSink::new(mask));
    }

    info!(
        "Scheduler configured: {} subsystems, period={}µs, disabled={}",
        subsystems.len(),
        config.scheduler.period_us,
        config.scheduler.start_disabled
    );
    Ok(subsystems)
}
