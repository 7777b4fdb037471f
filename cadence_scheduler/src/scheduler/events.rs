//! Lifecycle event fan-out.
//!
//! Sinks observe transitions; they never influence scheduling. A failing or
//! panicking sink is logged at warn and skipped for that event.

use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use cadence_common::command::CommandId;
use cadence_common::event::{EventKind, EventMask};
use tracing::{debug, info, warn};

/// One lifecycle transition.
#[derive(Debug, Clone, Copy)]
pub struct CommandEvent<'a> {
    pub kind: EventKind,
    pub command: CommandId,
    pub name: &'a str,
    /// Command whose schedule request caused an interrupt, if any.
    pub interruptor: Option<CommandId>,
    /// Tick timestamp.
    pub timestamp: Duration,
}

pub type SinkResult = Result<(), Box<dyn Error>>;

/// Observer of command lifecycle transitions.
pub trait EventSink {
    fn on_initialize(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        Ok(())
    }

    fn on_execute(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        Ok(())
    }

    fn on_interrupt(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        Ok(())
    }

    fn on_finish(&mut self, _event: &CommandEvent<'_>) -> SinkResult {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn push(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn emit(&mut self, event: &CommandEvent<'_>) {
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| match event.kind {
                EventKind::Initialize => sink.on_initialize(event),
                EventKind::Execute => sink.on_execute(event),
                EventKind::Interrupt => sink.on_interrupt(event),
                EventKind::Finish => sink.on_finish(event),
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "Event sink {index} failed on {:?} of '{}': {e}",
                    event.kind, event.name
                ),
                Err(_) => warn!(
                    "Event sink {index} panicked on {:?} of '{}'",
                    event.kind, event.name
                ),
            }
        }
    }
}

/// Writes lifecycle events to the `tracing` log.
///
/// Transitions go out at info, per-tick executes at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink {
    mask: EventMask,
}

impl TracingEventSink {
    pub const fn new(mask: EventMask) -> Self {
        Self { mask }
    }

    pub const fn mask(&self) -> EventMask {
        self.mask
    }
}

impl EventSink for TracingEventSink {
    fn on_initialize(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        if self.mask.records(event.kind) {
            info!(command = %event.command, at = ?event.timestamp, "{} initialized", event.name);
        }
        Ok(())
    }

    fn on_execute(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        if self.mask.records(event.kind) {
            debug!(command = %event.command, at = ?event.timestamp, "{} executed", event.name);
        }
        Ok(())
    }

    fn on_interrupt(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        if self.mask.records(event.kind) {
            match event.interruptor {
                Some(by) => info!(command = %event.command, at = ?event.timestamp, "{} interrupted by {by}", event.name),
                None => info!(command = %event.command, at = ?event.timestamp, "{} interrupted", event.name),
            }
        }
        Ok(())
    }

    fn on_finish(&mut self, event: &CommandEvent<'_>) -> SinkResult {
        if self.mask.records(event.kind) {
            info!(command = %event.command, at = ?event.timestamp, "{} finished", event.name);
        }
        Ok(())
    }
}
