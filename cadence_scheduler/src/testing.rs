//! Test doubles for command and scheduler tests.
//!
//! [`RecordingCommand`] appends one line per lifecycle call to a shared
//! [`CallLog`], so tests can assert exact call sequences across several
//! commands. [`RecordingSink`] does the same for scheduler events.
//!
//! ```
//! use cadence_scheduler::prelude::*;
//! use cadence_scheduler::testing::{RecordingCommand, call_log};
//!
//! let log = call_log();
//! let mut scheduler = CommandScheduler::with_clock(ManualClock::new());
//! let a = scheduler.register(RecordingCommand::new("A", &log).finish_after(1));
//!
//! scheduler.schedule(a).unwrap();
//! scheduler.run();
//! assert_eq!(*log.borrow(), ["A.initialize", "A.execute", "A.end(false)"]);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cadence_common::command::{CommandId, InterruptionBehavior, SubsystemSet};
use cadence_common::event::EventKind;

use crate::command::{Command, CommandContext};
use crate::scheduler::events::{CommandEvent, EventSink, SinkResult};

/// Shared, ordered record of lifecycle calls.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Command that records `Name.initialize`, `Name.execute` and
/// `Name.end(<interrupted>)` into a [`CallLog`].
///
/// Never finishes unless configured with [`finish_after`](Self::finish_after)
/// or [`finish_when`](Self::finish_when).
pub struct RecordingCommand {
    name: String,
    log: CallLog,
    requirements: SubsystemSet,
    behavior: InterruptionBehavior,
    runs_when_disabled: bool,
    finish_after: Option<u32>,
    finish_when: Option<Rc<Cell<bool>>>,
    executions: u32,
}

impl RecordingCommand {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            requirements: SubsystemSet::EMPTY,
            behavior: InterruptionBehavior::CancelSelf,
            runs_when_disabled: false,
            finish_after: None,
            finish_when: None,
            executions: 0,
        }
    }

    pub fn requiring(mut self, subsystems: impl Into<SubsystemSet>) -> Self {
        self.requirements = self.requirements.union(subsystems.into());
        self
    }

    pub fn interruption(mut self, behavior: InterruptionBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn run_when_disabled(mut self, runs: bool) -> Self {
        self.runs_when_disabled = runs;
        self
    }

    /// Finish after `n` executions per activation.
    pub fn finish_after(mut self, n: u32) -> Self {
        self.finish_after = Some(n);
        self
    }

    /// Finish whenever the flag is set.
    pub fn finish_when(mut self, flag: Rc<Cell<bool>>) -> Self {
        self.finish_when = Some(flag);
        self
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}.{call}", self.name));
    }
}

impl Command for RecordingCommand {
    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {
        self.executions = 0;
        self.record("initialize");
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {
        self.executions += 1;
        self.record("execute");
    }

    fn end(&mut self, interrupted: bool, _ctx: &mut CommandContext<'_>) {
        self.record(&format!("end({interrupted})"));
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        self.finish_after.is_some_and(|n| self.executions >= n)
            || self.finish_when.as_ref().is_some_and(|flag| flag.get())
    }

    fn requirements(&self) -> SubsystemSet {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One event as seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub command: CommandId,
    pub name: String,
    pub interruptor: Option<CommandId>,
}

/// Event sink that stores every event it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Recorded events of one kind, as `(command, interruptor)`.
    pub fn of_kind(&self, kind: EventKind) -> Vec<(CommandId, Option<CommandId>)> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.command, e.interruptor))
            .collect()
    }

    fn push(&self, event: &CommandEvent<'_>) -> SinkResult {
        self.events.borrow_mut().push(RecordedEvent {
            kind: event.kind,
            command: event.command,
            name: event.name.to_string(),
            interruptor: event.interruptor,
        });
        Ok(())
    }
}

impl EventSink for RecordingSink {
    fn on_initialize(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        self.push(event)
    }

    fn on_execute(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        self.push(event)
    }

    fn on_interrupt(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        self.push(event)
    }

    fn on_finish(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        self.push(event)
    }
}
