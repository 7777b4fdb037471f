//! Children run together until one designated child finishes.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use super::{Concurrent, GroupInfo, check_disjoint};
use crate::command::{Command, CommandContext};
use crate::error::CompositionError;

/// Finished exactly when the deadline child finishes.
///
/// Other children that finish first end naturally; any still running when
/// the deadline child finishes are interrupted.
pub struct DeadlineGroup {
    set: Concurrent,
    deadline: usize,
    info: GroupInfo,
}

impl DeadlineGroup {
    /// `deadline` becomes child 0, followed by `others` in order.
    pub fn new(
        deadline: Box<dyn Command>,
        others: Vec<Box<dyn Command>>,
    ) -> Result<Self, CompositionError> {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(deadline);
        children.extend(others);
        Self::with_index(children, 0)
    }

    /// Designates `children[index]` as the deadline.
    pub fn with_index(children: Vec<Box<dyn Command>>, index: usize) -> Result<Self, CompositionError> {
        if index >= children.len() {
            return Err(CompositionError::MissingDeadline {
                index,
                len: children.len(),
            });
        }
        let requirements = check_disjoint(children.iter().map(|c| (c.name(), c.requirements())))?;
        let info = GroupInfo::new("Deadline", &children, requirements);
        Ok(Self {
            set: Concurrent::new(children),
            deadline: index,
            info,
        })
    }

    pub fn deadline_index(&self) -> usize {
        self.deadline
    }
}

impl Command for DeadlineGroup {
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
        !self.set.running[self.deadline]
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
