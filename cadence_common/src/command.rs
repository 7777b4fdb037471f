//! Identifier and resource types shared by the scheduler and its callers.
//!
//! Defines `CommandId`, `SubsystemId`, `SubsystemSet` and
//! `InterruptionBehavior`.

use core::fmt;

use serde::{Deserialize, Serialize};
use static_assertions::{assert_impl_all, const_assert};

use crate::consts::MAX_SUBSYSTEMS;

/// Opaque handle to a command registered with a scheduler.
///
/// Handles are only meaningful for the scheduler instance that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u32);

impl CommandId {
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Handle to a subsystem registered with a scheduler (0..MAX_SUBSYSTEMS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsystemId(u8);

impl SubsystemId {
    /// Build an id from a registration index. Returns `None` past capacity.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < MAX_SUBSYSTEMS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subsystem#{}", self.0)
    }
}

/// Fixed-size set of subsystems, one bit per `SubsystemId`.
///
/// Intersection and union are single word operations, so arbitration never
/// allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SubsystemSet(u64);

impl SubsystemSet {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    #[inline]
    pub const fn of(subsystem: SubsystemId) -> Self {
        Self(subsystem.bit())
    }

    #[inline]
    pub const fn with(self, subsystem: SubsystemId) -> Self {
        Self(self.0 | subsystem.bit())
    }

    #[inline]
    pub fn insert(&mut self, subsystem: SubsystemId) {
        self.0 |= subsystem.bit();
    }

    #[inline]
    pub const fn contains(self, subsystem: SubsystemId) -> bool {
        self.0 & subsystem.bit() != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = SubsystemId> {
        let bits = self.0;
        (0..MAX_SUBSYSTEMS)
            .filter(move |i| bits & (1u64 << i) != 0)
            .filter_map(SubsystemId::from_index)
    }
}

impl FromIterator<SubsystemId> for SubsystemSet {
    fn from_iter<I: IntoIterator<Item = SubsystemId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<SubsystemId> for SubsystemSet {
    fn from(subsystem: SubsystemId) -> Self {
        Self::of(subsystem)
    }
}

impl fmt::Debug for SubsystemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(SubsystemId::index)).finish()
    }
}

/// What happens when a new command requests a subsystem held by a running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum InterruptionBehavior {
    /// The running command is interrupted and the new one starts.
    CancelSelf = 0,
    /// The new request is dropped and the running command continues.
    CancelIncoming = 1,
}

impl InterruptionBehavior {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::CancelSelf),
            1 => Some(Self::CancelIncoming),
            _ => None,
        }
    }
}

impl Default for InterruptionBehavior {
    fn default() -> Self {
        Self::CancelSelf
    }
}

const_assert!(MAX_SUBSYSTEMS <= u64::BITS as usize);
assert_impl_all!(CommandId: Copy, Eq, core::hash::Hash, Send, Sync);
assert_impl_all!(SubsystemSet: Copy, Eq, Send, Sync);
