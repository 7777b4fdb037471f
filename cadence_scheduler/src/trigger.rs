//! Edge-detecting condition bindings.
//!
//! A [`Trigger`] samples its condition once per tick, compares it with the
//! previous sample and turns edges into schedule/cancel requests for the
//! commands bound to it. The previous sample starts out `false`, so a
//! condition that is already true on the first poll produces a rising edge.

use std::fmt;
use std::time::Duration;

use cadence_common::command::CommandId;

use crate::command::Request;

pub mod debounce;

pub use debounce::{DebounceType, Debouncer};

/// Handle to a trigger registered with a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(pub(crate) u32);

impl TriggerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

/// What a binding does on each edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Schedule on rising edge.
    OnTrue(CommandId),
    /// Schedule on falling edge.
    OnFalse(CommandId),
    /// Schedule on rising edge, cancel on falling edge.
    WhileTrue(CommandId),
    /// Schedule on falling edge, cancel on rising edge.
    WhileFalse(CommandId),
    /// On rising edge: cancel if running, else schedule.
    ToggleOnTrue(CommandId),
    /// On falling edge: cancel if running, else schedule.
    ToggleOnFalse(CommandId),
}

impl Binding {
    pub const fn command(&self) -> CommandId {
        match *self {
            Self::OnTrue(c)
            | Self::OnFalse(c)
            | Self::WhileTrue(c)
            | Self::WhileFalse(c)
            | Self::ToggleOnTrue(c)
            | Self::ToggleOnFalse(c) => c,
        }
    }
}

type Condition = Box<dyn FnMut(Duration) -> bool>;

/// Boolean condition plus the commands bound to its edges.
///
/// Combinators (`and`, `or`, `negate`, `debounce`) rewrite the condition and
/// keep any bindings already attached.
pub struct Trigger {
    condition: Condition,
    previous: bool,
    bindings: Vec<Binding>,
}

impl Trigger {
    pub fn new(mut condition: impl FnMut() -> bool + 'static) -> Self {
        Self {
            condition: Box::new(move |_| condition()),
            previous: false,
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn on_true(self, command: CommandId) -> Self {
        self.bind(Binding::OnTrue(command))
    }

    pub fn on_false(self, command: CommandId) -> Self {
        self.bind(Binding::OnFalse(command))
    }

    pub fn while_true(self, command: CommandId) -> Self {
        self.bind(Binding::WhileTrue(command))
    }

    pub fn while_false(self, command: CommandId) -> Self {
        self.bind(Binding::WhileFalse(command))
    }

    pub fn toggle_on_true(self, command: CommandId) -> Self {
        self.bind(Binding::ToggleOnTrue(command))
    }

    pub fn toggle_on_false(self, command: CommandId) -> Self {
        self.bind(Binding::ToggleOnFalse(command))
    }

    pub fn and(mut self, mut other: impl FnMut() -> bool + 'static) -> Self {
        let mut inner = self.condition;
        self.condition = Box::new(move |now| inner(now) && other());
        self
    }

    pub fn or(mut self, mut other: impl FnMut() -> bool + 'static) -> Self {
        let mut inner = self.condition;
        self.condition = Box::new(move |now| inner(now) || other());
        self
    }

    pub fn negate(mut self) -> Self {
        let mut inner = self.condition;
        self.condition = Box::new(move |now| !inner(now));
        self
    }

    /// Filter the condition so changes must persist for `period` of tick
    /// time before they count.
    pub fn debounce(mut self, period: Duration, kind: DebounceType) -> Self {
        let mut inner = self.condition;
        let mut debouncer = Debouncer::new(period, kind);
        self.condition = Box::new(move |now| debouncer.calculate(inner(now), now));
        self
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Last sampled condition value.
    pub fn last_value(&self) -> bool {
        self.previous
    }

    /// Sample the condition once and append the resulting requests in
    /// binding order.
    pub(crate) fn poll(
        &mut self,
        now: Duration,
        is_running: impl Fn(CommandId) -> bool,
        out: &mut Vec<Request>,
    ) {
        let current = (self.condition)(now);
        let rising = current && !self.previous;
        let falling = !current && self.previous;
        self.previous = current;
        if !rising && !falling {
            return;
        }

        let schedule = |command| Request::Schedule {
            command,
            behavior: None,
        };
        let toggle = |command| {
            if is_running(command) {
                Request::Cancel(command)
            } else {
                schedule(command)
            }
        };

        for binding in &self.bindings {
            let request = match *binding {
                Binding::OnTrue(c) if rising => schedule(c),
                Binding::OnFalse(c) if falling => schedule(c),
                Binding::WhileTrue(c) if rising => schedule(c),
                Binding::WhileTrue(c) => Request::Cancel(c),
                Binding::WhileFalse(c) if falling => schedule(c),
                Binding::WhileFalse(c) => Request::Cancel(c),
                Binding::ToggleOnTrue(c) if rising => toggle(c),
                Binding::ToggleOnFalse(c) if falling => toggle(c),
                _ => continue,
            };
            out.push(request);
        }
    }
}
