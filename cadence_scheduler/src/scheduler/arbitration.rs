//! Schedule request arbitration.
//!
//! Pure decision step: given the arena, the ownership table and one
//! request, decide what phase 2 must do. Applying the decision (ending
//! holders, initializing the newcomer) is the scheduler's job.

use cadence_common::command::{CommandId, InterruptionBehavior};

use super::registry::{CommandSlot, SubsystemTable};

/// Outcome of resolving one schedule request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Interrupt `interrupt` (in order), then start with `behavior`.
    Start {
        interrupt: Vec<CommandId>,
        behavior: InterruptionBehavior,
    },
    /// A holder refuses to yield.
    Rejected { held_by: CommandId },
    /// Already running with compatible behavior.
    AlreadyRunning,
    /// Running, but the request overrides the active behavior.
    Restart { behavior: InterruptionBehavior },
    /// Not allowed to run in the current mode.
    Ineligible,
    /// Absorbed into a composition.
    Grouped,
    Unknown,
}

pub(crate) fn resolve(
    slots: &[CommandSlot],
    table: &SubsystemTable,
    command: CommandId,
    behavior: Option<InterruptionBehavior>,
    disabled: bool,
) -> Resolution {
    let Some(slot) = slots.get(command.index()) else {
        return Resolution::Unknown;
    };
    if slot.grouped {
        return Resolution::Grouped;
    }

    if disabled && !slot.runs_when_disabled {
        return Resolution::Ineligible;
    }

    if slot.running {
        return match behavior {
            Some(b) if b != slot.active_behavior => Resolution::Restart { behavior: b },
            _ => Resolution::AlreadyRunning,
        };
    }

    let interrupt = table.holders(slot.requirements);
    for holder in &interrupt {
        let refuses = slots
            .get(holder.index())
            .is_some_and(|h| h.active_behavior == InterruptionBehavior::CancelIncoming);
        if refuses {
            return Resolution::Rejected { held_by: *holder };
        }
    }

    Resolution::Start {
        interrupt,
        behavior: behavior.unwrap_or(slot.behavior),
    }
}
