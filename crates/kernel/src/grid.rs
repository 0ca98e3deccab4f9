use mechworks_common::{BlockPos, Cell, NotifyFlags, Orientation, TriggerEvent, TypeId};
use serde::{Deserialize, Serialize};

/// Auxiliary per-cell state (containers, signs, ...) that pins a cell in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntity {
    pub kind: String,
}

impl TileEntity {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// The capabilities cell behaviors need from the grid that hosts them.
///
/// Writes are individually atomic and immediately visible to later reads in
/// the same callback. Anything that reacts to a write (neighbor updates,
/// scheduled triggers) is queued and delivered after the callback returns.
pub trait Grid {
    /// Occupant of `pos`; `Cell::EMPTY` when nothing is there.
    fn cell(&self, pos: BlockPos) -> Cell;

    fn type_id(&self, pos: BlockPos) -> TypeId {
        self.cell(pos).type_id
    }

    fn data(&self, pos: BlockPos) -> u8 {
        self.cell(pos).data
    }

    fn set_cell(&mut self, pos: BlockPos, cell: Cell, flags: NotifyFlags);

    /// Whether `pos` is driven by a power source, probed from `face`.
    fn indirect_power(&self, pos: BlockPos, face: Orientation) -> bool;

    /// Queue `event` for delivery to the occupant of `pos` on the next step.
    fn schedule_trigger(&mut self, pos: BlockPos, event: TriggerEvent);

    fn tile_entity(&self, pos: BlockPos) -> Option<&TileEntity>;

    /// Queue a neighbor-changed update for `pos`, as if `source` had changed.
    fn notify(&mut self, pos: BlockPos, source: BlockPos);
}
