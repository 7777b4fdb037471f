//! # Cadence Scheduler
//!
//! Cooperative, single-threaded command scheduler for fixed-period control
//! loops. Commands claim exclusive ownership of subsystems, compose into
//! sequences, parallel groups, races and deadlines, and are polled to
//! completion by one `run()` call per tick.
//!
//! ## Tick Phases
//!
//! 0. Subsystem periodic callbacks
//! 1. Trigger poll (edges become queued requests)
//! 2. Schedule resolution against current subsystem owners
//! 3. Execute running commands, retire finished ones
//! 4. Default commands for idle subsystems
//!
//! ## Determinism
//!
//! No threads, locks or blocking calls. Time is read once per tick from a
//! [`clock::Clock`]; every command body sees that timestamp through its
//! [`command::CommandContext`]. Requests made from inside a body apply on the
//! next tick.

pub mod clock;
pub mod command;
pub mod composition;
pub mod config;
pub mod cycle;
pub mod error;
pub mod scheduler;
pub mod testing;
pub mod trigger;

pub mod prelude {
    //! Common imports for scheduler users.

    pub use cadence_common::prelude::*;

    pub use crate::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::command::basic::{
        FunctionalCommand, PrintCommand, ScheduleCommand, instant, none, run, start_end,
    };
    pub use crate::command::ext::CommandExt;
    pub use crate::command::wait::{WaitCommand, WaitUntilCommand};
    pub use crate::command::wrapper::{ConditionalCommand, either};
    pub use crate::command::{Command, CommandContext, Request};
    pub use crate::composition::{DeadlineGroup, ParallelGroup, RaceGroup, SequentialGroup};
    pub use crate::cycle::{LoopError, LoopRunner, LoopStats, RtPlacement};
    pub use crate::error::{CompositionError, RegistrationError, ScheduleError};
    pub use crate::scheduler::CommandScheduler;
    pub use crate::scheduler::events::{CommandEvent, EventSink, TracingEventSink};
    pub use crate::trigger::{DebounceType, Trigger, TriggerId};
}
