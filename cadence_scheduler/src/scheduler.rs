//! The command scheduler.
//!
//! One [`CommandScheduler::run`] call is one tick:
//!
//! ```text
//! 0. subsystem periodic callbacks   (registration order)
//! 1. trigger poll                   (edges → queued requests)
//! 2. schedule resolution            (queue order, arbitration)
//! 3. execute + retire               (scheduling order)
//! 4. default command fallback       (registration order)
//! ```
//!
//! Every mutation of the running set funnels through `start_command` and
//! `end_command`, which keep the ownership table, the running list and the
//! per-slot flags consistent. Requests issued from command bodies land in
//! the pending queue and are resolved on the following tick.

use std::mem;
use std::time::Duration;

use cadence_common::command::{CommandId, InterruptionBehavior, SubsystemId, SubsystemSet};
use cadence_common::event::EventKind;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::command::ext::CommandExt;
use crate::command::{Command, CommandContext, Request};
use crate::composition::{DeadlineGroup, ParallelGroup, RaceGroup, SequentialGroup, check_disjoint};
use crate::error::{CompositionError, RegistrationError, ScheduleError};
use crate::trigger::{Trigger, TriggerId};

pub mod arbitration;
pub mod events;
pub mod registry;

use arbitration::{Resolution, resolve};
use events::{CommandEvent, EventBus, EventSink};
use registry::{CommandSlot, SubsystemTable};

pub struct CommandScheduler {
    commands: Vec<CommandSlot>,
    subsystems: SubsystemTable,
    /// Scheduling order.
    running: Vec<CommandId>,
    /// Requests for the next resolution pass.
    pending: Vec<Request>,
    /// Requests being resolved right now.
    resolving: Vec<Request>,
    /// Snapshot of `running` for phase 3.
    scratch: Vec<CommandId>,
    triggers: Vec<Option<Trigger>>,
    events: EventBus,
    clock: Box<dyn Clock>,
    disabled: bool,
    now: Duration,
    tick: u64,
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandScheduler {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            commands: Vec::new(),
            subsystems: SubsystemTable::default(),
            running: Vec::new(),
            pending: Vec::new(),
            resolving: Vec::new(),
            scratch: Vec::new(),
            triggers: Vec::new(),
            events: EventBus::default(),
            clock: Box::new(clock),
            disabled: false,
            now: Duration::ZERO,
            tick: 0,
        }
    }

    // ─── Registration ───────────────────────────────────────────────

    pub fn register(&mut self, command: impl Command + 'static) -> CommandId {
        self.register_boxed(Box::new(command))
    }

    pub fn register_boxed(&mut self, command: Box<dyn Command>) -> CommandId {
        let id = CommandId::from_index(self.commands.len());
        self.commands.push(CommandSlot::new(command));
        id
    }

    pub fn register_subsystem(&mut self, name: impl Into<String>) -> Result<SubsystemId, RegistrationError> {
        self.subsystems.register(name.into())
    }

    /// Callback run at the start of every tick, before triggers are polled.
    pub fn set_periodic(
        &mut self,
        subsystem: SubsystemId,
        periodic: impl FnMut() + 'static,
    ) -> Result<(), RegistrationError> {
        let entry = self
            .subsystems
            .get_mut(subsystem)
            .ok_or(RegistrationError::UnknownSubsystem(subsystem))?;
        entry.periodic = Some(Box::new(periodic));
        Ok(())
    }

    /// Bind the command the subsystem falls back to whenever it is idle.
    ///
    /// The command must require exactly `{subsystem}`. Replacing a default
    /// does not cancel the previous one if it is running.
    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        command: CommandId,
    ) -> Result<(), RegistrationError> {
        let slot = self
            .commands
            .get(command.index())
            .ok_or(RegistrationError::UnknownCommand(command))?;
        let entry = self
            .subsystems
            .get_mut(subsystem)
            .ok_or(RegistrationError::UnknownSubsystem(subsystem))?;
        if slot.grouped {
            return Err(RegistrationError::GroupedDefaultCommand(slot.name.clone()));
        }
        if slot.requirements != SubsystemSet::of(subsystem) {
            return Err(RegistrationError::InvalidDefaultCommand {
                command: slot.name.clone(),
                subsystem: entry.name.clone(),
                requirements: slot.requirements,
            });
        }
        entry.default_command = Some(command);
        Ok(())
    }

    /// Unbind the default command, returning the previous binding.
    pub fn clear_default_command(
        &mut self,
        subsystem: SubsystemId,
    ) -> Result<Option<CommandId>, RegistrationError> {
        let entry = self
            .subsystems
            .get_mut(subsystem)
            .ok_or(RegistrationError::UnknownSubsystem(subsystem))?;
        Ok(entry.default_command.take())
    }

    pub fn register_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let id = TriggerId(self.triggers.len() as u32);
        self.triggers.push(Some(trigger));
        id
    }

    /// Remove a trigger. Commands it already scheduled keep running.
    pub fn unregister_trigger(&mut self, id: TriggerId) -> Option<Trigger> {
        self.triggers.get_mut(id.index()).and_then(Option::take)
    }

    pub fn add_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.events.push(Box::new(sink));
    }

    // ─── Requests ───────────────────────────────────────────────────

    /// Queue a schedule request for the next `run()`.
    ///
    /// Losing arbitration later is not an error; only requests that can
    /// never succeed are rejected here.
    pub fn schedule(&mut self, command: CommandId) -> Result<(), ScheduleError> {
        self.enqueue_schedule(command, None)
    }

    /// Like [`schedule`](Self::schedule) but overriding the interruption
    /// behavior for this activation. If the command is already running
    /// with a different behavior it is restarted.
    pub fn schedule_with_behavior(
        &mut self,
        command: CommandId,
        behavior: InterruptionBehavior,
    ) -> Result<(), ScheduleError> {
        self.enqueue_schedule(command, Some(behavior))
    }

    fn enqueue_schedule(
        &mut self,
        command: CommandId,
        behavior: Option<InterruptionBehavior>,
    ) -> Result<(), ScheduleError> {
        let slot = self
            .commands
            .get(command.index())
            .ok_or(ScheduleError::UnknownCommand(command))?;
        if slot.grouped {
            return Err(ScheduleError::Grouped {
                id: command,
                name: slot.name.clone(),
            });
        }
        self.pending.push(Request::Schedule { command, behavior });
        Ok(())
    }

    /// Queue an interrupt. A no-op at resolution if the command is idle.
    pub fn cancel(&mut self, command: CommandId) {
        self.pending.push(Request::Cancel(command));
    }

    /// Queue a cancel for every currently running command.
    pub fn cancel_all(&mut self) {
        self.pending
            .extend(self.running.iter().copied().map(Request::Cancel));
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one tick.
    ///
    /// Panics raised by command bodies propagate to the caller.
    pub fn run(&mut self) {
        self.now = self.clock.now();
        self.tick += 1;

        self.run_periodics();
        self.poll_triggers();
        self.resolve_pending();
        self.execute_running();
        self.schedule_defaults();
    }

    fn run_periodics(&mut self) {
        for entry in self.subsystems.entries_mut() {
            if let Some(periodic) = entry.periodic.as_mut() {
                periodic();
            }
        }
    }

    fn poll_triggers(&mut self) {
        let commands = &self.commands;
        let is_running = |id: CommandId| commands.get(id.index()).is_some_and(|s| s.running);
        for trigger in self.triggers.iter_mut().flatten() {
            trigger.poll(self.now, is_running, &mut self.pending);
        }
    }

    fn resolve_pending(&mut self) {
        mem::swap(&mut self.pending, &mut self.resolving);
        for index in 0..self.resolving.len() {
            match self.resolving[index] {
                Request::Schedule { command, behavior } => self.start_command(command, behavior),
                Request::Cancel(command) => self.end_command(command, true, None),
            }
        }
        self.resolving.clear();
    }

    fn execute_running(&mut self) {
        let mut snapshot = mem::take(&mut self.scratch);
        snapshot.clear();
        snapshot.extend_from_slice(&self.running);

        for &id in &snapshot {
            let Some(slot) = self.commands.get_mut(id.index()) else {
                continue;
            };
            if !slot.running {
                continue;
            }
            if self.disabled && !slot.runs_when_disabled {
                self.end_command(id, true, None);
                continue;
            }

            let Some(command) = slot.command.as_mut() else {
                continue;
            };
            let mut ctx = CommandContext::new(self.now, self.disabled, &mut self.pending);
            command.execute(&mut ctx);
            let finished = command.is_finished(&mut ctx);

            self.emit(EventKind::Execute, id, None);
            if finished {
                self.end_command(id, false, None);
            }
        }

        self.scratch = snapshot;
    }

    fn schedule_defaults(&mut self) {
        for index in 0..self.subsystems.len() {
            let Some(subsystem) = SubsystemId::from_index(index) else {
                break;
            };
            if self.subsystems.owner(subsystem).is_some() {
                continue;
            }
            let default = self.subsystems.get(subsystem).and_then(|e| e.default_command);
            if let Some(command) = default {
                self.start_command(command, None);
            }
        }
    }

    // ─── Transitions ────────────────────────────────────────────────

    fn start_command(&mut self, command: CommandId, behavior: Option<InterruptionBehavior>) {
        match resolve(&self.commands, &self.subsystems, command, behavior, self.disabled) {
            Resolution::Start { interrupt, behavior } => {
                for holder in interrupt {
                    self.end_command(holder, true, Some(command));
                }
                self.initialize_command(command, behavior);
            }
            Resolution::Restart { behavior } => {
                self.end_command(command, true, Some(command));
                self.initialize_command(command, behavior);
            }
            Resolution::Rejected { held_by } => {
                debug!(
                    "Schedule of {} dropped: {} holds a required subsystem and cancels incoming",
                    self.describe(command),
                    self.describe(held_by)
                );
            }
            Resolution::AlreadyRunning => {
                trace!("{} already running", self.describe(command));
            }
            Resolution::Ineligible => {
                trace!("{} not eligible while disabled", self.describe(command));
            }
            Resolution::Grouped => {
                warn!(
                    "Skipping schedule of {}: it belongs to a composition",
                    self.describe(command)
                );
            }
            Resolution::Unknown => {
                warn!("Skipping schedule of unknown command {command}");
            }
        }
    }

    fn initialize_command(&mut self, id: CommandId, behavior: InterruptionBehavior) {
        let Some(slot) = self.commands.get_mut(id.index()) else {
            return;
        };
        let Some(command) = slot.command.as_mut() else {
            return;
        };
        slot.running = true;
        slot.active_behavior = behavior;
        self.subsystems.claim(slot.requirements, id);
        self.running.push(id);

        let mut ctx = CommandContext::new(self.now, self.disabled, &mut self.pending);
        command.initialize(&mut ctx);
        self.emit(EventKind::Initialize, id, None);
    }

    /// Stop a running command; no-op if it is idle.
    fn end_command(&mut self, id: CommandId, interrupted: bool, interruptor: Option<CommandId>) {
        let Some(slot) = self.commands.get_mut(id.index()) else {
            return;
        };
        if !slot.running {
            return;
        }
        if let Some(command) = slot.command.as_mut() {
            let mut ctx = CommandContext::new(self.now, self.disabled, &mut self.pending);
            command.end(interrupted, &mut ctx);
        }
        slot.running = false;
        self.subsystems.release(slot.requirements, id);
        if let Some(position) = self.running.iter().position(|c| *c == id) {
            self.running.remove(position);
        }

        if interrupted {
            self.emit(EventKind::Interrupt, id, interruptor);
        } else {
            self.emit(EventKind::Finish, id, None);
        }
    }

    fn emit(&mut self, kind: EventKind, command: CommandId, interruptor: Option<CommandId>) {
        if self.events.is_empty() {
            return;
        }
        let name = self
            .commands
            .get(command.index())
            .map_or("", |slot| slot.name.as_str());
        self.events.emit(&CommandEvent {
            kind,
            command,
            name,
            interruptor,
            timestamp: self.now,
        });
    }

    fn describe(&self, command: CommandId) -> String {
        match self.command_name(command) {
            Some(name) => format!("'{name}' ({command})"),
            None => command.to_string(),
        }
    }

    // ─── Handle composition ─────────────────────────────────────────

    /// Take registered commands out of the arena for a new composition.
    ///
    /// Every id is validated (and, when the children will run together,
    /// checked for overlap) before any slot is touched, so a failed call
    /// leaves the scheduler unchanged.
    fn take_children(
        &mut self,
        ids: &[CommandId],
        disjoint: bool,
    ) -> Result<Vec<Box<dyn Command>>, CompositionError> {
        for (position, &id) in ids.iter().enumerate() {
            let slot = self
                .commands
                .get(id.index())
                .ok_or(CompositionError::UnknownCommand(id))?;
            if slot.grouped {
                return Err(CompositionError::AlreadyGrouped {
                    id,
                    name: slot.name.clone(),
                });
            }
            if slot.running {
                return Err(CompositionError::Running {
                    id,
                    name: slot.name.clone(),
                });
            }
            if self.subsystems.is_default(id) {
                return Err(CompositionError::DefaultCommand {
                    id,
                    name: slot.name.clone(),
                });
            }
            if ids[..position].contains(&id) {
                return Err(CompositionError::DuplicateCommand(id));
            }
        }

        if disjoint {
            check_disjoint(ids.iter().map(|id| {
                let slot = &self.commands[id.index()];
                (slot.name.as_str(), slot.requirements)
            }))?;
        }

        let mut children = Vec::with_capacity(ids.len());
        for &id in ids {
            let slot = &mut self.commands[id.index()];
            let command = slot
                .command
                .take()
                .ok_or(CompositionError::UnknownCommand(id))?;
            slot.grouped = true;
            children.push(command);
        }
        Ok(children)
    }

    /// Compose registered commands into a [`SequentialGroup`].
    pub fn sequence(&mut self, ids: &[CommandId]) -> Result<CommandId, CompositionError> {
        let children = self.take_children(ids, false)?;
        Ok(self.register(SequentialGroup::new(children)))
    }

    pub fn parallel(&mut self, ids: &[CommandId]) -> Result<CommandId, CompositionError> {
        let children = self.take_children(ids, true)?;
        let group = ParallelGroup::new(children)?;
        Ok(self.register(group))
    }

    pub fn race(&mut self, ids: &[CommandId]) -> Result<CommandId, CompositionError> {
        let children = self.take_children(ids, true)?;
        let group = RaceGroup::new(children)?;
        Ok(self.register(group))
    }

    /// `deadline` ends the group; `others` run alongside it.
    pub fn deadline(
        &mut self,
        deadline: CommandId,
        others: &[CommandId],
    ) -> Result<CommandId, CompositionError> {
        let mut ids = Vec::with_capacity(others.len() + 1);
        ids.push(deadline);
        ids.extend_from_slice(others);
        let children = self.take_children(&ids, true)?;
        let group = DeadlineGroup::with_index(children, 0)?;
        Ok(self.register(group))
    }

    /// Wrap one registered command with any owned decorator.
    pub fn decorate<C: Command + 'static>(
        &mut self,
        id: CommandId,
        wrap: impl FnOnce(Box<dyn Command>) -> C,
    ) -> Result<CommandId, CompositionError> {
        let mut children = self.take_children(&[id], false)?;
        let inner = children.pop().ok_or(CompositionError::UnknownCommand(id))?;
        Ok(self.register(wrap(inner)))
    }

    pub fn with_timeout(&mut self, id: CommandId, timeout: Duration) -> Result<CommandId, CompositionError> {
        self.decorate(id, |c| c.with_timeout(timeout))
    }

    pub fn until(
        &mut self,
        id: CommandId,
        condition: impl FnMut() -> bool + 'static,
    ) -> Result<CommandId, CompositionError> {
        self.decorate(id, |c| c.until(condition))
    }

    pub fn and_then(&mut self, id: CommandId, next: CommandId) -> Result<CommandId, CompositionError> {
        self.sequence(&[id, next])
    }

    pub fn along_with(&mut self, id: CommandId, other: CommandId) -> Result<CommandId, CompositionError> {
        self.parallel(&[id, other])
    }

    pub fn race_with(&mut self, id: CommandId, other: CommandId) -> Result<CommandId, CompositionError> {
        self.race(&[id, other])
    }

    pub fn deadline_with(
        &mut self,
        id: CommandId,
        others: &[CommandId],
    ) -> Result<CommandId, CompositionError> {
        self.deadline(id, others)
    }

    pub fn ignoring_disable(&mut self, id: CommandId) -> Result<CommandId, CompositionError> {
        self.decorate(id, |c| c.ignoring_disable())
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn is_running(&self, id: CommandId) -> bool {
        self.commands.get(id.index()).is_some_and(|s| s.running)
    }

    pub fn is_grouped(&self, id: CommandId) -> bool {
        self.commands.get(id.index()).is_some_and(|s| s.grouped)
    }

    /// Running commands in scheduling order.
    pub fn running_commands(&self) -> &[CommandId] {
        &self.running
    }

    /// Requests waiting for the next resolution pass.
    pub fn pending_requests(&self) -> &[Request] {
        &self.pending
    }

    pub fn owner_of(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems.owner(subsystem)
    }

    pub fn command_name(&self, id: CommandId) -> Option<&str> {
        self.commands.get(id.index()).map(|s| s.name.as_str())
    }

    pub fn requirements_of(&self, id: CommandId) -> Option<SubsystemSet> {
        self.commands.get(id.index()).map(|s| s.requirements)
    }

    /// Interruption behavior of the current activation, if running.
    pub fn active_behavior(&self, id: CommandId) -> Option<InterruptionBehavior> {
        self.commands
            .get(id.index())
            .filter(|s| s.running)
            .map(|s| s.active_behavior)
    }

    pub fn default_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems.get(subsystem).and_then(|e| e.default_command)
    }

    pub fn subsystem_name(&self, subsystem: SubsystemId) -> Option<&str> {
        self.subsystems.get(subsystem).map(|e| e.name.as_str())
    }

    pub fn subsystem_by_name(&self, name: &str) -> Option<SubsystemId> {
        self.subsystems.find(name)
    }

    pub fn subsystem_count(&self) -> usize {
        self.subsystems.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Number of completed `run()` calls.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Timestamp sampled by the most recent `run()`.
    pub fn now(&self) -> Duration {
        self.now
    }
}
