use std::collections::BTreeMap;
use std::sync::Arc;

use mechworks_common::{BlockPos, Cell, NotifyFlags, TriggerEvent, TypeId};
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::registry::TypeRegistry;
use crate::world::World;

/// Per-type reaction to grid activity. All hooks default to doing nothing.
pub trait CellBehavior {
    /// The cell at `pos` was just placed.
    fn on_place(&self, _grid: &mut dyn Grid, _pos: BlockPos) {}

    /// A cell adjacent to `pos` (or a power source near it) changed.
    fn on_neighbor_changed(&self, _grid: &mut dyn Grid, _pos: BlockPos, _source: BlockPos) {}

    /// A trigger this cell scheduled on an earlier step is now due.
    fn on_trigger(&self, _grid: &mut dyn Grid, _pos: BlockPos, _event: TriggerEvent) {}

    /// A player broke the cell; `removed` is what was there. The cell is
    /// already empty when this runs.
    fn on_player_destroy(&self, _grid: &mut dyn Grid, _pos: BlockPos, _removed: Cell) {}
}

/// Simulation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Neighbor updates dispatched by one flush before it is cut off.
    pub max_updates_per_flush: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_updates_per_flush: 4096,
        }
    }
}

/// Errors from driving the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("cell type {0:?} is not registered")]
    UnknownType(TypeId),
    #[error("neighbor update budget of {limit} exceeded; {dropped} updates discarded")]
    UpdateBudgetExceeded { limit: usize, dropped: usize },
}

/// Drives a [`World`]: dispatches queued neighbor updates and deferred
/// triggers to the behavior registered for each cell's type.
///
/// Every external operation flushes the update queue until it is empty, so
/// the world is quiescent between calls.
pub struct Simulation {
    world: World,
    registry: Arc<TypeRegistry>,
    behaviors: BTreeMap<TypeId, Box<dyn CellBehavior>>,
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(world: World, registry: Arc<TypeRegistry>, config: SimulationConfig) -> Self {
        Self {
            world,
            registry,
            behaviors: BTreeMap::new(),
            config,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct access for setup and tests. Writes made here are not flushed
    /// until the next operation.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Attach a behavior to a type, replacing any previous one.
    pub fn register_behavior(&mut self, type_id: TypeId, behavior: impl CellBehavior + 'static) {
        self.behaviors.insert(type_id, Box::new(behavior));
    }

    pub fn has_behavior(&self, type_id: TypeId) -> bool {
        self.behaviors.contains_key(&type_id)
    }

    /// Place `cell` at `pos`, run its placement hook, then settle.
    pub fn place(&mut self, pos: BlockPos, cell: Cell) -> Result<(), SimulationError> {
        if self.registry.get(cell.type_id).is_none() {
            return Err(SimulationError::UnknownType(cell.type_id));
        }
        self.world.set_cell(pos, cell, NotifyFlags::ALL);
        if let Some(behavior) = self.behaviors.get(&cell.type_id) {
            behavior.on_place(&mut self.world, pos);
        }
        self.flush()?;
        Ok(())
    }

    /// Clear `pos` without any removal hook (explosions, commands).
    pub fn remove(&mut self, pos: BlockPos) -> Result<Cell, SimulationError> {
        let removed = self.world.cell(pos);
        self.world.set_cell(pos, Cell::EMPTY, NotifyFlags::ALL);
        self.flush()?;
        Ok(removed)
    }

    /// Switch a power source and settle.
    pub fn set_power(&mut self, pos: BlockPos, powered: bool) -> Result<(), SimulationError> {
        self.world.set_power(pos, powered);
        self.flush()?;
        Ok(())
    }

    /// Break the cell at `pos` as a player would, running its destroy hook.
    pub fn player_destroy(&mut self, pos: BlockPos) -> Result<Cell, SimulationError> {
        let removed = self.world.cell(pos);
        if removed.is_empty() {
            return Ok(removed);
        }
        self.world.set_cell(pos, Cell::EMPTY, NotifyFlags::ALL);
        if let Some(behavior) = self.behaviors.get(&removed.type_id) {
            behavior.on_player_destroy(&mut self.world, pos, removed);
        }
        self.flush()?;
        Ok(removed)
    }

    /// Advance one tick and deliver every trigger scheduled before it.
    /// Triggers scheduled during delivery wait for the next step.
    /// Returns the number of triggers delivered.
    pub fn step(&mut self) -> Result<usize, SimulationError> {
        let _span = tracing::info_span!("step", tick = self.world.tick() + 1).entered();
        self.world.advance_tick();

        let mut delivered = 0;
        for trigger in self.world.take_triggers() {
            let current = self.world.type_id(trigger.pos);
            if current != trigger.type_id {
                tracing::debug!(pos = ?trigger.pos, event = ?trigger.event, "dropping stale trigger");
                continue;
            }
            self.world.record_delivery(&trigger);
            if let Some(behavior) = self.behaviors.get(&current) {
                let _deliver =
                    tracing::debug_span!("trigger", pos = ?trigger.pos, event = ?trigger.event)
                        .entered();
                behavior.on_trigger(&mut self.world, trigger.pos, trigger.event);
            }
            delivered += 1;
            self.flush()?;
        }
        Ok(delivered)
    }

    /// Step until no triggers remain, at most `max_steps` times.
    /// Returns the number of steps taken.
    pub fn settle(&mut self, max_steps: usize) -> Result<usize, SimulationError> {
        let mut steps = 0;
        while self.world.pending_triggers() > 0 && steps < max_steps {
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Dispatch queued neighbor updates until the queue is empty.
    fn flush(&mut self) -> Result<usize, SimulationError> {
        let limit = self.config.max_updates_per_flush;
        let mut dispatched = 0;
        while let Some(update) = self.world.pop_update() {
            if dispatched == limit {
                let dropped = self.world.clear_updates() + 1;
                tracing::warn!(limit, dropped, "neighbor update budget exceeded");
                return Err(SimulationError::UpdateBudgetExceeded { limit, dropped });
            }
            dispatched += 1;
            let type_id = self.world.type_id(update.pos);
            if let Some(behavior) = self.behaviors.get(&type_id) {
                behavior.on_neighbor_changed(&mut self.world, update.pos, update.source);
            }
        }
        tracing::trace!(dispatched, "flush complete");
        Ok(dispatched)
    }
}
