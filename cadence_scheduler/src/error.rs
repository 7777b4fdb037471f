//! Error types for composition, scheduling and registration.
//!
//! Only construction and registration mistakes are errors. Losing
//! arbitration against a `CancelIncoming` holder is an expected outcome and
//! never surfaces here.

use cadence_common::command::{CommandId, SubsystemId, SubsystemSet};
use thiserror::Error;

/// Fatal mistakes detected while building a composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// The command was already absorbed into another composition.
    #[error("'{name}' ({id}) is already part of a composition")]
    AlreadyGrouped { id: CommandId, name: String },

    /// The command is currently running and cannot be absorbed.
    #[error("'{name}' ({id}) is running and cannot be composed")]
    Running { id: CommandId, name: String },

    /// No command with this id is registered.
    #[error("unknown command {0}")]
    UnknownCommand(CommandId),

    /// The same command was listed twice.
    #[error("{0} appears more than once in the composition")]
    DuplicateCommand(CommandId),

    /// Two siblings that would run simultaneously share a subsystem.
    #[error("'{first}' and '{second}' both require {shared:?}")]
    OverlappingRequirements {
        first: String,
        second: String,
        shared: SubsystemSet,
    },

    /// The command is bound as a subsystem default and cannot be absorbed.
    #[error("'{name}' ({id}) is a subsystem default command")]
    DefaultCommand { id: CommandId, name: String },

    /// The designated deadline child does not exist.
    #[error("deadline index {index} out of range for {len} children")]
    MissingDeadline { index: usize, len: usize },
}

/// Requests that can never become valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Grouped commands only run through their owning composition.
    #[error("'{name}' ({id}) belongs to a composition and cannot be scheduled directly")]
    Grouped { id: CommandId, name: String },

    #[error("unknown command {0}")]
    UnknownCommand(CommandId),
}

/// Subsystem and default-command registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("subsystem capacity of {max} exhausted")]
    TooManySubsystems { max: usize },

    #[error("subsystem '{0}' is already registered")]
    DuplicateSubsystem(String),

    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemId),

    #[error("unknown command {0}")]
    UnknownCommand(CommandId),

    /// A default command must require exactly its own subsystem.
    #[error("default command '{command}' for '{subsystem}' must require only that subsystem, got {requirements:?}")]
    InvalidDefaultCommand {
        command: String,
        subsystem: String,
        requirements: SubsystemSet,
    },

    #[error("default command '{0}' belongs to a composition")]
    GroupedDefaultCommand(String),
}
