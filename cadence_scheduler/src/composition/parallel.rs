//! Children run together; the group waits for all of them.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use super::{Concurrent, GroupInfo, check_disjoint};
use crate::command::{Command, CommandContext};
use crate::error::CompositionError;

/// Finished when every child has finished.
///
/// Children that finish early are ended naturally while the rest keep
/// running.
pub struct ParallelGroup {
    set: Concurrent,
    info: GroupInfo,
}

impl ParallelGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, CompositionError> {
        let requirements = check_disjoint(children.iter().map(|c| (c.name(), c.requirements())))?;
        let info = GroupInfo::new("Parallel", &children, requirements);
        Ok(Self {
            set: Concurrent::new(children),
            info,
        })
    }
}

impl Command for ParallelGroup {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.set.initialize_all(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        self.set.execute_running(ctx);
    }

    fn end(&mut self, _interrupted: bool, ctx: &mut CommandContext<'_>) {
        self.set.interrupt_running(ctx);
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        !self.set.any_running()
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
