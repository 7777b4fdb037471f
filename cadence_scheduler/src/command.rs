//! Command model root.
//!
//! A [`Command`] is one behavior unit polled by the scheduler:
//! `initialize` once when it starts, `execute` + `is_finished` once per tick
//! while running, and `end` exactly once when it stops. Compositions
//! implement the same trait, so commands nest freely.
//!
//! Command bodies never touch the scheduler directly. Every body receives a
//! [`CommandContext`] carrying the tick timestamp and a request queue;
//! schedule/cancel requests pushed there are applied on the next tick.

use std::time::Duration;

use cadence_common::command::{CommandId, InterruptionBehavior, SubsystemSet};

pub mod basic;
pub mod ext;
pub mod wait;
pub mod wrapper;

/// A queued mutation of the running set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Start the command, optionally overriding its interruption behavior
    /// for this activation.
    Schedule {
        command: CommandId,
        behavior: Option<InterruptionBehavior>,
    },
    /// Interrupt the command if it is running.
    Cancel(CommandId),
}

impl Request {
    #[inline]
    pub const fn command(&self) -> CommandId {
        match self {
            Self::Schedule { command, .. } => *command,
            Self::Cancel(command) => *command,
        }
    }
}

/// Per-call view of the scheduler handed to command bodies.
pub struct CommandContext<'a> {
    now: Duration,
    disabled: bool,
    requests: &'a mut Vec<Request>,
}

impl<'a> CommandContext<'a> {
    pub fn new(now: Duration, disabled: bool, requests: &'a mut Vec<Request>) -> Self {
        Self {
            now,
            disabled,
            requests,
        }
    }

    /// Timestamp sampled at the start of the current tick.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Queue a schedule request for the next tick.
    pub fn schedule(&mut self, command: CommandId) {
        self.requests.push(Request::Schedule {
            command,
            behavior: None,
        });
    }

    /// Queue a cancel request for the next tick.
    pub fn cancel(&mut self, command: CommandId) {
        self.requests.push(Request::Cancel(command));
    }
}

/// Capability set of one behavior unit.
///
/// Structure (requirements, interruption behavior, disabled eligibility,
/// name) must not change after the command is handed to a scheduler or a
/// composition; the scheduler caches it at registration.
pub trait Command {
    /// Called once when the command transitions Idle → Running.
    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {}

    /// Called once per tick while running.
    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {}

    /// Called once when the command stops. `interrupted` is false only for
    /// natural completion.
    fn end(&mut self, _interrupted: bool, _ctx: &mut CommandContext<'_>) {}

    /// Polled after every `execute`.
    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        false
    }

    fn requirements(&self) -> SubsystemSet {
        SubsystemSet::EMPTY
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        InterruptionBehavior::CancelSelf
    }

    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        (**self).initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        (**self).execute(ctx);
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        (**self).end(interrupted, ctx);
    }

    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        (**self).is_finished(ctx)
    }

    fn requirements(&self) -> SubsystemSet {
        (**self).requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        (**self).interruption_behavior()
    }

    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// `a::b::Foo<c::Bar>` → `Foo`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
