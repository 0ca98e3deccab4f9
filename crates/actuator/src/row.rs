use mechworks_common::{BlockPos, Orientation};
use mechworks_kernel::{Grid, TypeRegistry};

use crate::ActuatorTypes;
use crate::config::ActuatorConfig;
use crate::state::ActuatorState;

/// How a cell in front of an actuator reacts to being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCell {
    /// Empty, unregistered, or outside the height limits. Ends the row.
    Absent,
    /// Replaceable; ends the row and is overwritten rather than moved.
    AnchorStop,
    /// Cannot move; the whole push is refused.
    Immovable,
    /// Moves one step along with the row.
    Movable,
}

/// Why a row cannot be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Immovable,
    TooLong,
}

/// Outcome of walking the row in front of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowScan {
    /// `len` movable cells followed by the terminator at `end`.
    Pushable { len: usize, end: BlockPos },
    Blocked { at: BlockPos, reason: BlockReason },
}

impl RowScan {
    pub fn is_pushable(&self) -> bool {
        matches!(self, RowScan::Pushable { .. })
    }
}

/// Classifies cells and walks rows. Used by both the feasibility check and
/// the push itself so the two can never disagree.
pub struct RowScanner<'a> {
    registry: &'a TypeRegistry,
    types: &'a ActuatorTypes,
    config: &'a ActuatorConfig,
}

impl<'a> RowScanner<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        types: &'a ActuatorTypes,
        config: &'a ActuatorConfig,
    ) -> Self {
        Self {
            registry,
            types,
            config,
        }
    }

    pub fn classify(&self, grid: &dyn Grid, pos: BlockPos) -> RowCell {
        if !self.config.contains_height(pos.y) {
            return RowCell::Absent;
        }
        let cell = grid.cell(pos);
        if cell.is_empty() {
            return RowCell::Absent;
        }
        let Some(props) = self.registry.get(cell.type_id) else {
            tracing::trace!(?pos, type_id = ?cell.type_id, "unregistered cell ends row");
            return RowCell::Absent;
        };
        if props.replaceable {
            return RowCell::AnchorStop;
        }
        if props.pinned || cell.type_id == self.types.arm {
            return RowCell::Immovable;
        }
        if self.types.is_base(cell.type_id) {
            let busy = ActuatorState::decode(cell.data).is_none_or(|s| s.holds_arm());
            if busy {
                return RowCell::Immovable;
            }
        }
        if grid.tile_entity(pos).is_some() {
            return RowCell::Immovable;
        }
        RowCell::Movable
    }

    /// Walk from the cell ahead of `origin` along `orientation`.
    ///
    /// The terminator at `end` is overwritten by a push, whatever it holds
    /// when it lies outside the height limits.
    pub fn scan(&self, grid: &dyn Grid, origin: BlockPos, orientation: Orientation) -> RowScan {
        let mut pos = orientation.offset(origin, 1);
        let mut len = 0;
        loop {
            match self.classify(grid, pos) {
                RowCell::Absent | RowCell::AnchorStop => {
                    return RowScan::Pushable { len, end: pos };
                }
                RowCell::Immovable => {
                    return RowScan::Blocked {
                        at: pos,
                        reason: BlockReason::Immovable,
                    };
                }
                RowCell::Movable => {
                    if len == self.config.push_limit {
                        return RowScan::Blocked {
                            at: pos,
                            reason: BlockReason::TooLong,
                        };
                    }
                    len += 1;
                    pos = orientation.offset(pos, 1);
                }
            }
        }
    }
}
