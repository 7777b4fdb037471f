//! Children run together; the first to finish ends the group.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use super::{Concurrent, GroupInfo, check_disjoint};
use crate::command::{Command, CommandContext};
use crate::error::CompositionError;

/// Finished as soon as any child finishes.
///
/// Every child still running is executed in the pass where the first one
/// finishes; those finishing in that pass end naturally, the rest are
/// interrupted when the group ends. An empty race finishes immediately.
pub struct RaceGroup {
    set: Concurrent,
    finished: bool,
    info: GroupInfo,
}

impl RaceGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, CompositionError> {
        let requirements = check_disjoint(children.iter().map(|c| (c.name(), c.requirements())))?;
        Ok(Self::assemble(children, requirements))
    }

    /// Pairs a command with a requirement-free companion (timers, waits).
    pub(crate) fn against_unconstrained(command: Box<dyn Command>, companion: Box<dyn Command>) -> Self {
        let requirements = command.requirements().union(companion.requirements());
        Self::assemble(vec![command, companion], requirements)
    }

    fn assemble(children: Vec<Box<dyn Command>>, requirements: SubsystemSet) -> Self {
        let info = GroupInfo::new("Race", &children, requirements);
        Self {
            set: Concurrent::new(children),
            finished: false,
            info,
        }
    }
}

impl Command for RaceGroup {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.finished = self.set.children.is_empty();
        self.set.initialize_all(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        if !self.set.execute_running(ctx).is_empty() {
            self.finished = true;
        }
    }

    fn end(&mut self, _interrupted: bool, ctx: &mut CommandContext<'_>) {
        self.set.interrupt_running(ctx);
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        self.finished
    }

    fn requirements(&self) -> SubsystemSet {
        self.info.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.info.behavior
    }

    fn runs_when_disabled(&self) -> bool {
        self.info.runs_when_disabled
    }

    fn name(&self) -> &str {
        &self.info.name
    }
}
