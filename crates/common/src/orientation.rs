use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::BlockPos;

/// One of the six axis-aligned facing directions.
///
/// Discriminants are the values stored in the 3-bit orientation field of cell
/// metadata and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// −Y
    Down = 0,
    /// +Y
    Up = 1,
    /// −Z
    North = 2,
    /// +Z
    South = 3,
    /// −X
    West = 4,
    /// +X
    East = 5,
}

const STEPS: [IVec3; 6] = [
    IVec3::new(0, -1, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, -1),
    IVec3::new(0, 0, 1),
    IVec3::new(-1, 0, 0),
    IVec3::new(1, 0, 0),
];

const OPPOSITES: [Orientation; 6] = [
    Orientation::Up,
    Orientation::Down,
    Orientation::South,
    Orientation::North,
    Orientation::East,
    Orientation::West,
];

/// Height of a standing placer's eyes above their feet.
const EYE_HEIGHT: f32 = 1.82;

impl Orientation {
    /// All orientations in index order.
    pub const ALL: [Orientation; 6] = [
        Orientation::Down,
        Orientation::Up,
        Orientation::North,
        Orientation::South,
        Orientation::West,
        Orientation::East,
    ];

    /// Decode a 3-bit field. Values 6 and 7 are not orientations.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Unit step one cell in this direction.
    pub fn step(self) -> IVec3 {
        STEPS[self as usize]
    }

    pub fn opposite(self) -> Self {
        OPPOSITES[self as usize]
    }

    /// Position `distance` cells away from `pos` along this direction.
    pub fn offset(self, pos: BlockPos, distance: i32) -> BlockPos {
        pos + self.step() * distance
    }

    /// Orientation a device takes when placed at `pos` by `placer`: it faces
    /// back toward whoever placed it.
    pub fn from_placer(placer: &Placer, pos: BlockPos) -> Self {
        let dx = (placer.position.x - pos.x as f32).abs();
        let dz = (placer.position.z - pos.z as f32).abs();
        if dx < 2.0 && dz < 2.0 {
            let eye = placer.position.y + EYE_HEIGHT - placer.height_offset;
            if eye - pos.y as f32 > 2.0 {
                return Orientation::Up;
            }
            if pos.y as f32 - eye > 0.0 {
                return Orientation::Down;
            }
        }
        let quadrant = ((placer.yaw_degrees * 4.0 / 360.0) + 0.5).floor() as i32 & 3;
        match quadrant {
            0 => Orientation::North,
            1 => Orientation::East,
            2 => Orientation::South,
            _ => Orientation::West,
        }
    }
}

/// Whoever is placing a device: feet position, eye offset, and look yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placer {
    pub position: Vec3,
    pub height_offset: f32,
    pub yaw_degrees: f32,
}

impl Placer {
    pub fn new(position: Vec3, yaw_degrees: f32) -> Self {
        Self {
            position,
            height_offset: 0.0,
            yaw_degrees,
        }
    }
}
