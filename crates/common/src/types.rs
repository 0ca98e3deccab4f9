use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::Orientation;

/// Integer coordinates of a grid cell.
pub type BlockPos = IVec3;

/// Stable identifier of a registered cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u16);

impl TypeId {
    /// The empty cell ("air").
    pub const EMPTY: Self = Self(0);

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Occupant of one grid cell: its type plus a byte of per-cell metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub type_id: TypeId,
    pub data: u8,
}

impl Cell {
    pub const EMPTY: Self = Self {
        type_id: TypeId::EMPTY,
        data: 0,
    };

    pub fn new(type_id: TypeId, data: u8) -> Self {
        Self { type_id, data }
    }

    pub fn is_empty(&self) -> bool {
        self.type_id.is_empty()
    }
}

/// Who hears about a cell write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotifyFlags(u8);

impl NotifyFlags {
    /// Silent write: nobody is told.
    pub const NONE: Self = Self(0);
    /// Queue a neighbor-changed update for each of the six adjacent cells.
    pub const NEIGHBORS: Self = Self(1);
    /// Mark the write for client broadcast.
    pub const CLIENTS: Self = Self(2);
    pub const ALL: Self = Self(3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for NotifyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A deferred instruction delivered back to the cell that scheduled it on a
/// later simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    Extend { orientation: Orientation },
    Retract { orientation: Orientation },
}

impl TriggerEvent {
    pub fn orientation(&self) -> Orientation {
        match self {
            Self::Extend { orientation } | Self::Retract { orientation } => *orientation,
        }
    }
}
