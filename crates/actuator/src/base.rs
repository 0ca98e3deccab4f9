use std::sync::Arc;

use mechworks_common::{
    Aabb, BlockPos, Cell, NotifyFlags, Orientation, Placer, TriggerEvent, TypeId,
};
use mechworks_kernel::{CellBehavior, Grid, TypeRegistry};

use crate::row::{RowCell, RowScan, RowScanner};
use crate::state::{ActuatorState, ArmState};
use crate::texture::ActuatorTexture;
use crate::{ActuatorConfig, ActuatorTypes};

/// Visual shape of an extended base: the unit cube with the pushing face
/// recessed by a quarter, indexed by orientation.
const EXTENDED_SHAPES: [Aabb; 6] = [
    Aabb::new(0.0, 0.25, 0.0, 1.0, 1.0, 1.0),
    Aabb::new(0.0, 0.0, 0.0, 1.0, 0.75, 1.0),
    Aabb::new(0.0, 0.0, 0.25, 1.0, 1.0, 1.0),
    Aabb::new(0.0, 0.0, 0.0, 1.0, 1.0, 0.75),
    Aabb::new(0.25, 0.0, 0.0, 1.0, 1.0, 1.0),
    Aabb::new(0.0, 0.0, 0.0, 0.75, 1.0, 1.0),
];

/// The stationary half of an actuator.
///
/// Watches for power on neighbor changes, commits to extending or retracting
/// by writing its metadata and scheduling a trigger, and performs the push or
/// pull when the trigger comes back on a later step.
pub struct ActuatorBase {
    registry: Arc<TypeRegistry>,
    types: ActuatorTypes,
    sticky: bool,
    config: ActuatorConfig,
}

impl ActuatorBase {
    pub fn new(
        registry: Arc<TypeRegistry>,
        types: ActuatorTypes,
        sticky: bool,
        config: ActuatorConfig,
    ) -> Self {
        Self {
            registry,
            types,
            sticky,
            config,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.types.base(self.sticky)
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    fn scanner(&self) -> RowScanner<'_> {
        RowScanner::new(&self.registry, &self.types, &self.config)
    }

    fn write_state(&self, grid: &mut dyn Grid, pos: BlockPos, state: ActuatorState, flags: NotifyFlags) {
        grid.set_cell(pos, Cell::new(self.type_id(), state.encode()), flags);
    }

    /// Cell to write when a placer puts this base down at `pos`.
    pub fn placement_cell(&self, placer: &Placer, pos: BlockPos) -> Cell {
        let orientation = Orientation::from_placer(placer, pos);
        Cell::new(
            self.type_id(),
            ActuatorState::retracted(orientation).encode(),
        )
    }

    /// Re-evaluate power and schedule an extend or retract if it changed.
    pub fn update_state(&self, grid: &mut dyn Grid, pos: BlockPos) {
        let cell = grid.cell(pos);
        if cell.type_id != self.type_id() {
            return;
        }
        let Some(state) = ActuatorState::decode(cell.data) else {
            tracing::trace!(?pos, data = cell.data, "undecodable actuator metadata");
            return;
        };
        if state.pending {
            tracing::trace!(?pos, "transition in flight; skipping update");
            return;
        }

        let orientation = state.orientation;
        let should_be_powered = self.has_power(&*grid, pos, orientation);
        if should_be_powered && !state.powered {
            if !self.can_push_row(&*grid, pos, orientation) {
                tracing::debug!(?pos, ?orientation, "row blocked; staying retracted");
                return;
            }
            let next = state.with_powered(true).with_pending(true);
            self.write_state(grid, pos, next, NotifyFlags::NONE);
            grid.schedule_trigger(pos, TriggerEvent::Extend { orientation });
            tracing::debug!(?pos, ?orientation, "extend scheduled");
        } else if !should_be_powered && state.powered {
            let next = state.with_powered(false).with_pending(true);
            self.write_state(grid, pos, next, NotifyFlags::NONE);
            grid.schedule_trigger(pos, TriggerEvent::Retract { orientation });
            tracing::debug!(?pos, ?orientation, "retract scheduled");
        }
    }

    /// Whether any of the eleven probe positions around `pos` carries power.
    ///
    /// The neighbor on the pushing face is never probed.
    pub fn has_power(&self, grid: &dyn Grid, pos: BlockPos, orientation: Orientation) -> bool {
        let direct = Orientation::ALL
            .into_iter()
            .filter(|face| *face != orientation)
            .any(|face| grid.indirect_power(face.offset(pos, 1), face));
        if direct {
            return true;
        }

        // Ring one level up, so updates above the base can switch it.
        let above = Orientation::Up.offset(pos, 1);
        let ring = [
            (pos, Orientation::Down),
            (Orientation::Up.offset(above, 1), Orientation::Up),
            (Orientation::North.offset(above, 1), Orientation::North),
            (Orientation::South.offset(above, 1), Orientation::South),
            (Orientation::West.offset(above, 1), Orientation::West),
            (Orientation::East.offset(above, 1), Orientation::East),
        ];
        ring.into_iter()
            .any(|(probe, face)| grid.indirect_power(probe, face))
    }

    /// Read-only check that the row ahead could be pushed right now.
    pub fn can_push_row(&self, grid: &dyn Grid, pos: BlockPos, orientation: Orientation) -> bool {
        self.scanner().scan(grid, pos, orientation).is_pushable()
    }

    /// Shift the row ahead one step and put an arm in the freed cell.
    ///
    /// Cells are written from the far end back toward the base so nothing is
    /// overwritten before it has been copied. Returns false, touching
    /// nothing, when the row is blocked.
    pub fn push_row(&self, grid: &mut dyn Grid, pos: BlockPos, orientation: Orientation) -> bool {
        let scan = self.scanner().scan(&*grid, pos, orientation);
        let RowScan::Pushable { len, end } = scan else {
            tracing::debug!(?pos, ?scan, "push refused");
            return false;
        };

        let step = orientation.step();
        let arm = ArmState {
            orientation,
            sticky: self.sticky,
        };
        let mut cursor = end;
        while cursor != pos {
            let from = cursor - step;
            let moved = if from == pos {
                Cell::new(self.types.arm, arm.encode())
            } else {
                grid.cell(from)
            };
            grid.set_cell(cursor, moved, NotifyFlags::ALL);
            cursor = from;
        }
        tracing::debug!(?pos, ?orientation, moved = len, "row pushed");
        true
    }

    fn retract(&self, grid: &mut dyn Grid, pos: BlockPos, orientation: Orientation) {
        let arm_pos = orientation.offset(pos, 1);
        let arm_present = grid.type_id(arm_pos) == self.types.arm;

        if self.sticky && (arm_present || grid.cell(arm_pos).is_empty()) {
            let pull_pos = orientation.offset(pos, 2);
            let pulled = grid.cell(pull_pos);
            if self.scanner().classify(&*grid, pull_pos) == RowCell::Movable {
                grid.set_cell(arm_pos, pulled, NotifyFlags::ALL);
                grid.set_cell(pull_pos, Cell::EMPTY, NotifyFlags::ALL);
                tracing::debug!(?pos, from = ?pull_pos, "pulled cell back");
                return;
            }
            tracing::trace!(?pos, at = ?pull_pos, "nothing to pull");
        }
        if arm_present {
            grid.set_cell(arm_pos, Cell::EMPTY, NotifyFlags::ALL);
        }
    }

    /// Texture for `face` of a placed base.
    pub fn texture(&self, state: ActuatorState, face: Orientation) -> ActuatorTexture {
        if face == state.orientation {
            if state.powered {
                ActuatorTexture::Inner
            } else {
                ActuatorTexture::top(self.sticky)
            }
        } else if face == state.orientation.opposite() {
            ActuatorTexture::Bottom
        } else {
            ActuatorTexture::Side
        }
    }

    /// Texture for `face` of the base as an item (cap facing up).
    pub fn item_texture(&self, face: Orientation) -> ActuatorTexture {
        if face == Orientation::Up {
            ActuatorTexture::top(self.sticky)
        } else {
            ActuatorTexture::Side
        }
    }

    /// Visual bounding shape of a placed base.
    pub fn visual_shape(state: ActuatorState) -> Aabb {
        if state.powered {
            EXTENDED_SHAPES[state.orientation as usize]
        } else {
            Aabb::UNIT
        }
    }
}

impl CellBehavior for ActuatorBase {
    fn on_place(&self, grid: &mut dyn Grid, pos: BlockPos) {
        self.update_state(grid, pos);
    }

    fn on_neighbor_changed(&self, grid: &mut dyn Grid, pos: BlockPos, _source: BlockPos) {
        self.update_state(grid, pos);
    }

    fn on_trigger(&self, grid: &mut dyn Grid, pos: BlockPos, event: TriggerEvent) {
        let extending = matches!(event, TriggerEvent::Extend { .. });
        let committed = ActuatorState::decode(grid.data(pos)).is_some_and(|s| {
            s.pending && s.orientation == event.orientation() && s.powered == extending
        });
        if !committed {
            tracing::debug!(?pos, ?event, "trigger does not match cell state; dropped");
            return;
        }
        match event {
            TriggerEvent::Extend { orientation } => {
                let pushed = self.push_row(grid, pos, orientation);
                let state = if pushed {
                    ActuatorState::extended(orientation)
                } else {
                    ActuatorState::retracted(orientation)
                };
                self.write_state(grid, pos, state, NotifyFlags::ALL);
            }
            TriggerEvent::Retract { orientation } => {
                self.retract(grid, pos, orientation);
                self.write_state(
                    grid,
                    pos,
                    ActuatorState::retracted(orientation),
                    NotifyFlags::NONE,
                );
            }
        }
    }
}
