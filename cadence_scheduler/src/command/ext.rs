//! Owned decorator builders.
//!
//! Each method consumes `self` (and any other input) by value, so a command
//! absorbed into a composition can no longer be scheduled or composed
//! elsewhere. For commands already registered with a scheduler use the
//! handle-based equivalents on `CommandScheduler`.

use std::time::Duration;

use cadence_common::command::InterruptionBehavior;

use super::Command;
use super::basic::none;
use super::wait::{WaitCommand, WaitUntilCommand};
use super::wrapper::{ConditionalCommand, Decorated, FinallyDo, RepeatCommand};
use crate::composition::{DeadlineGroup, ParallelGroup, RaceGroup, SequentialGroup};
use crate::error::CompositionError;

pub trait CommandExt: Command + Sized + 'static {
    fn boxed(self) -> Box<dyn Command> {
        Box::new(self)
    }

    /// Interrupt after `timeout` unless finished earlier.
    fn with_timeout(self, timeout: Duration) -> RaceGroup {
        RaceGroup::against_unconstrained(self.boxed(), WaitCommand::new(timeout).boxed())
    }

    /// Interrupt as soon as `condition` holds.
    fn until(self, condition: impl FnMut() -> bool + 'static) -> RaceGroup {
        RaceGroup::against_unconstrained(self.boxed(), WaitUntilCommand::new(condition).boxed())
    }

    /// Interrupt as soon as `condition` stops holding.
    fn only_while(self, mut condition: impl FnMut() -> bool + 'static) -> RaceGroup {
        self.until(move || !condition())
    }

    fn and_then(self, next: impl Command + 'static) -> SequentialGroup {
        SequentialGroup::new(vec![self.boxed(), Box::new(next)])
    }

    fn before_starting(self, first: impl Command + 'static) -> SequentialGroup {
        SequentialGroup::new(vec![Box::new(first), self.boxed()])
    }

    fn along_with(self, other: impl Command + 'static) -> Result<ParallelGroup, CompositionError> {
        ParallelGroup::new(vec![self.boxed(), Box::new(other)])
    }

    fn race_with(self, other: impl Command + 'static) -> Result<RaceGroup, CompositionError> {
        RaceGroup::new(vec![self.boxed(), Box::new(other)])
    }

    /// Run `others` alongside `self`, stopping them when `self` finishes.
    fn deadline_with(self, others: Vec<Box<dyn Command>>) -> Result<DeadlineGroup, CompositionError> {
        DeadlineGroup::new(self.boxed(), others)
    }

    fn ignoring_disable(self) -> Decorated<Self> {
        Decorated::new(self).with_runs_when_disabled(true)
    }

    fn with_interrupt_behavior(self, behavior: InterruptionBehavior) -> Decorated<Self> {
        Decorated::new(self).with_interruption(behavior)
    }

    fn with_name(self, name: impl Into<String>) -> Decorated<Self> {
        Decorated::new(self).with_name(name)
    }

    /// Skip the command (finish immediately) when `condition` holds at start.
    fn unless(self, condition: impl FnMut() -> bool + 'static) -> ConditionalCommand {
        ConditionalCommand::new(none().boxed(), self.boxed(), condition)
    }

    /// Run the command only when `condition` holds at start.
    fn only_if(self, condition: impl FnMut() -> bool + 'static) -> ConditionalCommand {
        ConditionalCommand::new(self.boxed(), none().boxed(), condition)
    }

    fn repeatedly(self) -> RepeatCommand<Self> {
        RepeatCommand::new(self)
    }

    fn finally_do(self, hook: impl FnMut(bool) + 'static) -> FinallyDo<Self> {
        FinallyDo::new(self, hook)
    }

    /// Run `hook` only when the command is interrupted.
    fn handle_interrupt(self, mut hook: impl FnMut() + 'static) -> FinallyDo<Self> {
        FinallyDo::new(self, move |interrupted| {
            if interrupted {
                hook();
            }
        })
    }
}

impl<C: Command + 'static> CommandExt for C {}
