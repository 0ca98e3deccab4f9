//! Shared types for the mechworks workspace.
//!
//! # Invariants
//! - Orientation indices are stable (0..=5) and match the 3-bit metadata field.
//! - `TypeId::EMPTY` is always the empty cell.

mod orientation;
mod shape;
mod types;

pub use orientation::{Orientation, Placer};
pub use shape::Aabb;
pub use types::{BlockPos, Cell, NotifyFlags, TriggerEvent, TypeId};
