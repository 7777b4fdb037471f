//! Children run one after another.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use super::{GroupInfo, union_requirements};
use crate::command::{Command, CommandContext};

/// Runs its children in order; finished after the last child finishes.
///
/// A child that finishes is ended in the same tick, but its successor is
/// only initialized at the start of the next `execute`. Sequential children
/// never run simultaneously, so their requirements may overlap.
pub struct SequentialGroup {
    children: Vec<Box<dyn Command>>,
    current: usize,
    started: bool,
    info: GroupInfo,
}

impl SequentialGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> Self {
        let requirements = union_requirements(children.iter().map(|c| c.as_ref()));
        let info = GroupInfo::new("Sequential", &children, requirements);
        Self {
            children,
            current: 0,
            started: false,
            info,
        }
    }

    /// Index of the child currently running (or about to start).
    pub fn current_index(&self) -> usize {
        self.current
    }
}

impl Command for SequentialGroup {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.current = 0;
        self.started = false;
        if let Some(first) = self.children.first_mut() {
            first.initialize(ctx);
            self.started = true;
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        let Some(child) = self.children.get_mut(self.current) else {
            return;
        };
        if !self.started {
            child.initialize(ctx);
            self.started = true;
        }
        child.execute(ctx);
        if child.is_finished(ctx) {
            child.end(false, ctx);
            self.current += 1;
            self.started = false;
        }
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        if self.started {
            if let Some(child) = self.children.get_mut(self.current) {
                child.end(interrupted, ctx);
            }
        }
        self.started = false;
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        self.current >= self.children.len()
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
