//! Cadence Common Library
//!
//! Shared identifiers, constants and configuration loading for the Cadence
//! command scheduler workspace.
//!
//! # Module Structure
//!
//! - [`command`] - Command/subsystem handles and requirement sets
//! - [`event`] - Lifecycle event kinds and filter masks
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Numeric limits and defaults
//! - [`prelude`] - Common re-exports for convenience

pub mod command;
pub mod config;
pub mod consts;
pub mod event;
pub mod prelude;
