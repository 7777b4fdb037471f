//! Single-child wrappers: property overrides, end hooks, conditionals and
//! repetition.
//!
//! Every wrapper owns its child, so a wrapped command cannot be scheduled or
//! composed anywhere else.

use cadence_common::command::{InterruptionBehavior, SubsystemSet};

use super::{Command, CommandContext};

/// Delegating shell that overrides name, disabled eligibility or
/// interruption behavior.
pub struct Decorated<C> {
    inner: C,
    name: Option<String>,
    runs_when_disabled: Option<bool>,
    interruption: Option<InterruptionBehavior>,
}

impl<C: Command> Decorated<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            name: None,
            runs_when_disabled: None,
            interruption: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_runs_when_disabled(mut self, runs: bool) -> Self {
        self.runs_when_disabled = Some(runs);
        self
    }

    pub fn with_interruption(mut self, behavior: InterruptionBehavior) -> Self {
        self.interruption = Some(behavior);
        self
    }
}

impl<C: Command> Command for Decorated<C> {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.inner.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        self.inner.execute(ctx);
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        self.inner.end(interrupted, ctx);
    }

    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn requirements(&self) -> SubsystemSet {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.interruption
            .unwrap_or_else(|| self.inner.interruption_behavior())
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
            .unwrap_or_else(|| self.inner.runs_when_disabled())
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.name())
    }
}

/// Runs a hook after the child's `end`, receiving the interrupted flag.
pub struct FinallyDo<C> {
    inner: C,
    hook: Box<dyn FnMut(bool)>,
}

impl<C: Command> FinallyDo<C> {
    pub fn new(inner: C, hook: impl FnMut(bool) + 'static) -> Self {
        Self {
            inner,
            hook: Box::new(hook),
        }
    }
}

impl<C: Command> Command for FinallyDo<C> {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.inner.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        self.inner.execute(ctx);
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        self.inner.end(interrupted, ctx);
        (self.hook)(interrupted);
    }

    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn requirements(&self) -> SubsystemSet {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Picks one of two commands when initialized and runs only that one.
///
/// Requires the union of both branches so the selected branch can always
/// claim what it needs.
pub struct ConditionalCommand {
    on_true: Box<dyn Command>,
    on_false: Box<dyn Command>,
    selector: Box<dyn FnMut() -> bool>,
    selected: Option<bool>,
    requirements: SubsystemSet,
}

impl ConditionalCommand {
    pub fn new(
        on_true: Box<dyn Command>,
        on_false: Box<dyn Command>,
        selector: impl FnMut() -> bool + 'static,
    ) -> Self {
        let requirements = on_true.requirements().union(on_false.requirements());
        Self {
            on_true,
            on_false,
            selector: Box::new(selector),
            selected: None,
            requirements,
        }
    }

    fn active(&mut self) -> Option<&mut Box<dyn Command>> {
        match self.selected? {
            true => Some(&mut self.on_true),
            false => Some(&mut self.on_false),
        }
    }
}

impl Command for ConditionalCommand {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.selected = Some((self.selector)());
        if let Some(branch) = self.active() {
            branch.initialize(ctx);
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        if let Some(branch) = self.active() {
            branch.execute(ctx);
        }
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        if let Some(branch) = self.active() {
            branch.end(interrupted, ctx);
        }
        self.selected = None;
    }

    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        self.active().is_none_or(|branch| branch.is_finished(ctx))
    }

    fn requirements(&self) -> SubsystemSet {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        crate::composition::combined_interruption([
            self.on_true.interruption_behavior(),
            self.on_false.interruption_behavior(),
        ])
    }

    fn runs_when_disabled(&self) -> bool {
        self.on_true.runs_when_disabled() && self.on_false.runs_when_disabled()
    }

    fn name(&self) -> &str {
        "Conditional"
    }
}

/// Run `on_true` if `selector` holds when started, else `on_false`.
pub fn either(
    on_true: impl Command + 'static,
    on_false: impl Command + 'static,
    selector: impl FnMut() -> bool + 'static,
) -> ConditionalCommand {
    ConditionalCommand::new(Box::new(on_true), Box::new(on_false), selector)
}

/// Restarts its child every time the child finishes; never finishes itself.
pub struct RepeatCommand<C> {
    inner: C,
    child_ended: bool,
}

impl<C: Command> RepeatCommand<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            child_ended: true,
        }
    }
}

impl<C: Command> Command for RepeatCommand<C> {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.inner.initialize(ctx);
        self.child_ended = false;
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) {
        if self.child_ended {
            self.inner.initialize(ctx);
            self.child_ended = false;
        }
        self.inner.execute(ctx);
        if self.inner.is_finished(ctx) {
            self.inner.end(false, ctx);
            self.child_ended = true;
        }
    }

    fn end(&mut self, interrupted: bool, ctx: &mut CommandContext<'_>) {
        if !self.child_ended {
            self.inner.end(interrupted, ctx);
            self.child_ended = true;
        }
    }

    fn requirements(&self) -> SubsystemSet {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
