//! Command compositions.
//!
//! Every group owns its children as boxed commands and is itself a
//! [`Command`], so groups nest without limit. Requirement sets are the union
//! of the children; groups whose children run simultaneously (parallel, race,
//! deadline) reject overlapping sibling requirements at construction.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use crate::command::{Command, CommandContext};
use crate::error::CompositionError;

pub mod deadline;
pub mod parallel;
pub mod race;
pub mod sequential;

pub use deadline::DeadlineGroup;
pub use parallel::ParallelGroup;
pub use race::RaceGroup;
pub use sequential::SequentialGroup;

/// Union of every child's requirements.
pub fn union_requirements<'a>(children: impl IntoIterator<Item = &'a dyn Command>) -> SubsystemSet {
    children
        .into_iter()
        .fold(SubsystemSet::EMPTY, |acc, child| acc.union(child.requirements()))
}

/// Checks that no two `(name, requirements)` entries share a subsystem.
///
/// Returns the union on success. The first clash found, in list order, is
/// reported.
pub fn check_disjoint<'a>(
    entries: impl IntoIterator<Item = (&'a str, SubsystemSet)>,
) -> Result<SubsystemSet, CompositionError> {
    let mut seen: Vec<(&str, SubsystemSet)> = Vec::new();
    let mut union = SubsystemSet::EMPTY;
    for (name, requirements) in entries {
        if union.intersects(requirements) {
            if let Some((first, held)) = seen.iter().find(|(_, held)| held.intersects(requirements)) {
                return Err(CompositionError::OverlappingRequirements {
                    first: (*first).to_string(),
                    second: name.to_string(),
                    shared: held.intersection(requirements),
                });
            }
        }
        union = union.union(requirements);
        seen.push((name, requirements));
    }
    Ok(union)
}

/// `CancelSelf` if any member is `CancelSelf`, else `CancelIncoming`.
///
/// An empty group yields `CancelIncoming`.
pub fn combined_interruption(
    behaviors: impl IntoIterator<Item = InterruptionBehavior>,
) -> InterruptionBehavior {
    if behaviors
        .into_iter()
        .any(|b| b == InterruptionBehavior::CancelSelf)
    {
        InterruptionBehavior::CancelSelf
    } else {
        InterruptionBehavior::CancelIncoming
    }
}

/// True when every child runs while disabled (vacuously true when empty).
pub fn all_run_when_disabled<'a>(children: impl IntoIterator<Item = &'a dyn Command>) -> bool {
    children.into_iter().all(|child| child.runs_when_disabled())
}

/// `Kind[A, B, C]`.
pub(crate) fn group_name(kind: &str, children: &[Box<dyn Command>]) -> String {
    let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
    format!("{kind}[{}]", names.join(", "))
}

/// Cached structural properties shared by all group kinds.
pub(crate) struct GroupInfo {
    pub name: String,
    pub requirements: SubsystemSet,
    pub behavior: InterruptionBehavior,
    pub runs_when_disabled: bool,
}

impl GroupInfo {
    pub fn new(kind: &str, children: &[Box<dyn Command>], requirements: SubsystemSet) -> Self {
        Self {
            name: group_name(kind, children),
            requirements,
            behavior: combined_interruption(children.iter().map(|c| c.interruption_behavior())),
            runs_when_disabled: all_run_when_disabled(children.iter().map(|c| c.as_ref())),
        }
    }
}

/// Children that start together and are tracked individually.
pub(crate) struct Concurrent {
    pub children: Vec<Box<dyn Command>>,
    pub running: Vec<bool>,
}

impl Concurrent {
    pub fn new(children: Vec<Box<dyn Command>>) -> Self {
        let running = vec![false; children.len()];
        Self { children, running }
    }

    pub fn initialize_all(&mut self, ctx: &mut CommandContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            child.initialize(ctx);
            *running = true;
        }
    }

    /// Executes every running child once; children that report finished
    /// are ended naturally. Returns the indices that finished this pass.
    pub fn execute_running(&mut self, ctx: &mut CommandContext<'_>) -> Vec<usize> {
        let mut finished = Vec::new();
        for (index, (child, running)) in self
            .children
            .iter_mut()
            .zip(self.running.iter_mut())
            .enumerate()
        {
            if !*running {
                continue;
            }
            child.execute(ctx);
            if child.is_finished(ctx) {
                child.end(false, ctx);
                *running = false;
                finished.push(index);
            }
        }
        finished
    }

    pub fn interrupt_running(&mut self, ctx: &mut CommandContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                child.end(true, ctx);
                *running = false;
            }
        }
    }

    pub fn any_running(&self) -> bool {
        self.running.iter().any(|r| *r)
    }
}
