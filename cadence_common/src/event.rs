//! Lifecycle event kinds and the bitflag mask used to filter them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One command lifecycle transition observed by event sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum EventKind {
    /// `initialize()` was called (Idle → Running).
    Initialize = 0,
    /// `execute()` was called.
    Execute = 1,
    /// `end(true)` was called.
    Interrupt = 2,
    /// `end(false)` was called.
    Finish = 3,
}

impl EventKind {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Initialize),
            1 => Some(Self::Execute),
            2 => Some(Self::Interrupt),
            3 => Some(Self::Finish),
            _ => None,
        }
    }

    /// Mask bit for this kind.
    #[inline]
    pub const fn mask(self) -> EventMask {
        match self {
            Self::Initialize => EventMask::INITIALIZE,
            Self::Execute => EventMask::EXECUTE,
            Self::Interrupt => EventMask::INTERRUPT,
            Self::Finish => EventMask::FINISH,
        }
    }
}

bitflags! {
    /// Selects which lifecycle events a sink records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const INITIALIZE = 0x01;
        const EXECUTE    = 0x02;
        const INTERRUPT  = 0x04;
        const FINISH     = 0x08;
    }
}

impl EventMask {
    /// Every transition except the per-tick `execute` noise.
    pub const TRANSITIONS: Self = Self::from_bits_truncate(
        Self::INITIALIZE.bits() | Self::INTERRUPT.bits() | Self::FINISH.bits(),
    );

    #[inline]
    pub const fn records(&self, kind: EventKind) -> bool {
        self.contains(kind.mask())
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::TRANSITIONS
    }
}

impl FromIterator<EventKind> for EventMask {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |mask, kind| mask | kind.mask())
    }
}
