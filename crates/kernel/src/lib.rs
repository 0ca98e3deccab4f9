//! Grid Kernel: authoritative cell state, type registry, deferred triggers,
//! and the simulation driver that dispatches cell behaviors.
//!
//! # Invariants
//! - All cell mutations flow through `Grid::set_cell` and are logged.
//! - Neighbor updates and triggers are delivered in FIFO order on one thread.
//! - Iteration over cells is deterministic (BTreeMap).

mod grid;
mod registry;
mod simulation;
pub mod world;

pub use grid::{Grid, TileEntity};
pub use registry::{RegistryError, TypeProperties, TypeRegistry};
pub use simulation::{CellBehavior, Simulation, SimulationConfig, SimulationError};
pub use world::{NeighborUpdate, ScheduledTrigger, World, WorldEvent};
