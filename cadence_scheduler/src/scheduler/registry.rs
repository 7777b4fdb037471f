//! Command arena slots and the subsystem ownership table.

use cadence_common::command::{CommandId, InterruptionBehavior, SubsystemId, SubsystemSet};
use cadence_common::consts::MAX_SUBSYSTEMS;

use crate::command::Command;
use crate::error::RegistrationError;

/// One registered command plus scheduler bookkeeping.
///
/// Structural properties are cached at registration so arbitration and
/// composition checks work even after the command moved into a group.
pub(crate) struct CommandSlot {
    /// `None` once absorbed into a composition.
    pub command: Option<Box<dyn Command>>,
    pub name: String,
    pub requirements: SubsystemSet,
    pub behavior: InterruptionBehavior,
    pub runs_when_disabled: bool,
    pub grouped: bool,
    pub running: bool,
    /// Behavior of the current (or last) activation.
    pub active_behavior: InterruptionBehavior,
}

impl CommandSlot {
    pub fn new(command: Box<dyn Command>) -> Self {
        let behavior = command.interruption_behavior();
        Self {
            name: command.name().to_string(),
            requirements: command.requirements(),
            behavior,
            runs_when_disabled: command.runs_when_disabled(),
            grouped: false,
            running: false,
            active_behavior: behavior,
            command: Some(command),
        }
    }
}

pub(crate) struct SubsystemEntry {
    pub name: String,
    pub default_command: Option<CommandId>,
    pub periodic: Option<Box<dyn FnMut()>>,
}

/// Registered subsystems and the current owner of every subsystem bit.
pub(crate) struct SubsystemTable {
    entries: Vec<SubsystemEntry>,
    owners: [Option<CommandId>; MAX_SUBSYSTEMS],
}

impl Default for SubsystemTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            owners: [None; MAX_SUBSYSTEMS],
        }
    }
}

impl SubsystemTable {
    pub fn register(&mut self, name: String) -> Result<SubsystemId, RegistrationError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(RegistrationError::DuplicateSubsystem(name));
        }
        let id = SubsystemId::from_index(self.entries.len()).ok_or(
            RegistrationError::TooManySubsystems {
                max: MAX_SUBSYSTEMS,
            },
        )?;
        self.entries.push(SubsystemEntry {
            name,
            default_command: None,
            periodic: None,
        });
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: SubsystemId) -> Option<&SubsystemEntry> {
        self.entries.get(id.index())
    }

    pub fn get_mut(&mut self, id: SubsystemId) -> Option<&mut SubsystemEntry> {
        self.entries.get_mut(id.index())
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut SubsystemEntry> {
        self.entries.iter_mut()
    }

    pub fn find(&self, name: &str) -> Option<SubsystemId> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .and_then(SubsystemId::from_index)
    }

    pub fn is_default(&self, command: CommandId) -> bool {
        self.entries
            .iter()
            .any(|e| e.default_command == Some(command))
    }

    #[inline]
    pub fn owner(&self, id: SubsystemId) -> Option<CommandId> {
        self.owners[id.index()]
    }

    pub fn claim(&mut self, requirements: SubsystemSet, command: CommandId) {
        for id in requirements.iter() {
            self.owners[id.index()] = Some(command);
        }
    }

    /// Clears only the bits still held by `command`.
    pub fn release(&mut self, requirements: SubsystemSet, command: CommandId) {
        for id in requirements.iter() {
            let owner = &mut self.owners[id.index()];
            if *owner == Some(command) {
                *owner = None;
            }
        }
    }

    /// Distinct holders of any subsystem in `requirements`, in subsystem
    /// order.
    pub fn holders(&self, requirements: SubsystemSet) -> Vec<CommandId> {
        let mut holders = Vec::new();
        for id in requirements.iter() {
            if let Some(owner) = self.owners[id.index()] {
                if !holders.contains(&owner) {
                    holders.push(owner);
                }
            }
        }
        holders
    }
}
