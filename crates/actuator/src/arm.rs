use glam::Vec3;
use mechworks_common::{Aabb, BlockPos, Cell, NotifyFlags, Orientation};
use mechworks_kernel::{CellBehavior, Grid};

use crate::ActuatorTypes;
use crate::state::{ActuatorState, ArmState};
use crate::texture::ActuatorTexture;

/// Head plate of the arm, on the face it travels toward. Indexed by orientation.
const HEAD: [Aabb; 6] = [
    Aabb::new(0.0, 0.0, 0.0, 1.0, 0.25, 1.0),
    Aabb::new(0.0, 0.75, 0.0, 1.0, 1.0, 1.0),
    Aabb::new(0.0, 0.0, 0.0, 1.0, 1.0, 0.25),
    Aabb::new(0.0, 0.0, 0.75, 1.0, 1.0, 1.0),
    Aabb::new(0.0, 0.0, 0.0, 0.25, 1.0, 1.0),
    Aabb::new(0.75, 0.0, 0.0, 1.0, 1.0, 1.0),
];

/// Shaft running from the head plate back to the base.
const SHAFT: [Aabb; 6] = [
    Aabb::new(0.375, 0.25, 0.375, 0.625, 1.0, 0.625),
    Aabb::new(0.375, 0.0, 0.375, 0.625, 0.75, 0.625),
    Aabb::new(0.25, 0.375, 0.25, 0.75, 0.625, 1.0),
    Aabb::new(0.25, 0.375, 0.0, 0.75, 0.625, 0.75),
    Aabb::new(0.25, 0.375, 0.25, 1.0, 0.625, 0.75),
    Aabb::new(0.0, 0.375, 0.25, 0.75, 0.625, 0.75),
];

/// The moving half of an actuator. Holds no state of its own beyond its
/// metadata and only lives while the base behind it is extended.
pub struct ActuatorArm {
    types: ActuatorTypes,
}

impl ActuatorArm {
    pub fn new(types: ActuatorTypes) -> Self {
        Self { types }
    }

    /// Items dropped when the arm is broken.
    pub fn drop_count(&self) -> u32 {
        0
    }

    pub fn visual_shape(orientation: Orientation) -> Aabb {
        HEAD[orientation as usize]
    }

    /// Head plate and shaft, in cell-local coordinates.
    pub fn collision_shapes(orientation: Orientation) -> [Aabb; 2] {
        [HEAD[orientation as usize], SHAFT[orientation as usize]]
    }

    /// Append the boxes of an arm at `pos` that overlap `query`.
    pub fn add_collision_shapes(
        orientation: Orientation,
        pos: BlockPos,
        query: &Aabb,
        out: &mut Vec<Aabb>,
    ) {
        let offset: Vec3 = pos.as_vec3();
        out.extend(
            Self::collision_shapes(orientation)
                .into_iter()
                .map(|b| b.translated(offset))
                .filter(|b| b.intersects(query)),
        );
    }

    pub fn texture(state: ArmState, face: Orientation) -> ActuatorTexture {
        if face == state.orientation {
            ActuatorTexture::top(state.sticky)
        } else {
            ActuatorTexture::Side
        }
    }

    /// Position of the base an arm at `pos` hangs off.
    pub fn base_pos(state: ArmState, pos: BlockPos) -> BlockPos {
        state.orientation.opposite().offset(pos, 1)
    }

    /// Whether the cell behind holds a base this arm belongs to.
    fn attached(&self, grid: &dyn Grid, arm: ArmState, base_pos: BlockPos) -> bool {
        let base = grid.cell(base_pos);
        if !self.types.is_base(base.type_id) {
            return false;
        }
        ActuatorState::decode(base.data)
            .is_some_and(|s| s.orientation == arm.orientation && s.holds_arm())
    }
}

impl CellBehavior for ActuatorArm {
    fn on_neighbor_changed(&self, grid: &mut dyn Grid, pos: BlockPos, source: BlockPos) {
        let cell = grid.cell(pos);
        if cell.type_id != self.types.arm {
            return;
        }
        let Some(arm) = ArmState::decode(cell.data) else {
            grid.set_cell(pos, Cell::EMPTY, NotifyFlags::ALL);
            return;
        };
        let base_pos = Self::base_pos(arm, pos);
        if self.attached(&*grid, arm, base_pos) {
            grid.notify(base_pos, source);
        } else {
            tracing::debug!(?pos, ?base_pos, "arm detached from base; removing");
            grid.set_cell(pos, Cell::EMPTY, NotifyFlags::ALL);
        }
    }

    fn on_player_destroy(&self, grid: &mut dyn Grid, pos: BlockPos, removed: Cell) {
        let Some(arm) = ArmState::decode(removed.data) else {
            return;
        };
        let base_pos = Self::base_pos(arm, pos);
        let base = grid.cell(base_pos);
        if !self.types.is_base(base.type_id) {
            return;
        }
        if ActuatorState::decode(base.data).is_some_and(|s| s.powered) {
            tracing::debug!(?base_pos, "arm broken; removing extended base");
            grid.set_cell(base_pos, Cell::EMPTY, NotifyFlags::NONE);
        }
    }
}
