//! Closure-backed leaf commands.
//!
//! [`FunctionalCommand`] is the general form; [`instant`], [`run`],
//! [`start_end`] and [`none`] are the common shapes built from it.

use cadence_common::command::{CommandId, SubsystemSet};
use tracing::info;

use super::{Command, CommandContext};

type Action = Box<dyn FnMut()>;
type EndAction = Box<dyn FnMut(bool)>;
type Predicate = Box<dyn FnMut() -> bool>;

/// Command assembled from four closures.
pub struct FunctionalCommand {
    name: String,
    requirements: SubsystemSet,
    runs_when_disabled: bool,
    on_init: Action,
    on_execute: Action,
    on_end: EndAction,
    is_finished: Predicate,
}

impl FunctionalCommand {
    pub fn new(
        on_init: impl FnMut() + 'static,
        on_execute: impl FnMut() + 'static,
        on_end: impl FnMut(bool) + 'static,
        is_finished: impl FnMut() -> bool + 'static,
    ) -> Self {
        Self {
            name: "Functional".to_string(),
            requirements: SubsystemSet::EMPTY,
            runs_when_disabled: false,
            on_init: Box::new(on_init),
            on_execute: Box::new(on_execute),
            on_end: Box::new(on_end),
            is_finished: Box::new(is_finished),
        }
    }

    /// Add subsystems to the requirement set.
    pub fn requiring(mut self, subsystems: impl Into<SubsystemSet>) -> Self {
        self.requirements = self.requirements.union(subsystems.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Keep running (and allow scheduling) while the loop is disabled.
    pub fn run_when_disabled(mut self, runs: bool) -> Self {
        self.runs_when_disabled = runs;
        self
    }
}

impl Command for FunctionalCommand {
    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {
        (self.on_init)();
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) {
        (self.on_execute)();
    }

    fn end(&mut self, interrupted: bool, _ctx: &mut CommandContext<'_>) {
        (self.on_end)(interrupted);
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        (self.is_finished)()
    }

    fn requirements(&self) -> SubsystemSet {
        self.requirements
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs `action` once on initialize and finishes in the same tick.
pub fn instant(action: impl FnMut() + 'static) -> FunctionalCommand {
    FunctionalCommand::new(action, || {}, |_| {}, || true).named("Instant")
}

/// Runs `action` every tick until interrupted.
pub fn run(action: impl FnMut() + 'static) -> FunctionalCommand {
    FunctionalCommand::new(|| {}, action, |_| {}, || false).named("Run")
}

/// Runs `start` on initialize and `stop` on end; never finishes by itself.
pub fn start_end(
    start: impl FnMut() + 'static,
    mut stop: impl FnMut() + 'static,
) -> FunctionalCommand {
    FunctionalCommand::new(start, || {}, move |_| stop(), || false).named("StartEnd")
}

/// Does nothing and finishes immediately.
pub fn none() -> FunctionalCommand {
    instant(|| {}).named("None").run_when_disabled(true)
}

/// Logs a message at info level and finishes immediately.
pub struct PrintCommand {
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Command for PrintCommand {
    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) {
        info!(target: "cadence::print", "{}", self.message);
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        true
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "Print"
    }
}

/// Queues schedule requests for other registered commands and finishes.
///
/// The targets run independently of this command; they start on the tick
/// after this command initializes.
pub struct ScheduleCommand {
    targets: Vec<CommandId>,
}

impl ScheduleCommand {
    pub fn new(targets: impl IntoIterator<Item = CommandId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl Command for ScheduleCommand {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        for target in &self.targets {
            ctx.schedule(*target);
        }
    }

    fn is_finished(&mut self, _ctx: &mut CommandContext<'_>) -> bool {
        true
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "Schedule"
    }
}
