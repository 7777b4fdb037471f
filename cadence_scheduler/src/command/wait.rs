//! Clock- and condition-driven waiting commands.
//!
//! These are the only time-aware pieces of the core; timeouts are built by
//! racing a command against a [`WaitCommand`].

use std::time::Duration;

use super::{Command, CommandContext};

/// Finishes once `duration` has elapsed since it was initialized.
pub struct WaitCommand {
    duration: Duration,
    started_at: Duration,
    name: String,
}

impl WaitCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: Duration::ZERO,
            name: format!("Wait({duration:?})"),
        }
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl Command for WaitCommand {
    fn initialize(&mut self, ctx: &mut CommandContext<'_>) {
        self.started_at = ctx.now();
    }

    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        ctx.now().saturating_sub(self.started_at) >= self.duration
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}

enum Until {
    Condition(Box<dyn FnMut() -> bool>),
    Time(Duration),
}

/// Finishes once a condition holds, or once the clock reaches a fixed time.
pub struct WaitUntilCommand {
    until: Until,
}

impl WaitUntilCommand {
    pub fn new(condition: impl FnMut() -> bool + 'static) -> Self {
        Self {
            until: Until::Condition(Box::new(condition)),
        }
    }

    /// Finish at the first tick whose timestamp is at or past `time`.
    pub fn at(time: Duration) -> Self {
        Self {
            until: Until::Time(time),
        }
    }
}

impl Command for WaitUntilCommand {
    fn is_finished(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        match &mut self.until {
            Until::Condition(condition) => condition(),
            Until::Time(time) => ctx.now() >= *time,
        }
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "WaitUntil"
    }
}
