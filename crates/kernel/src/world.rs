use std::collections::{BTreeMap, BTreeSet, VecDeque};

use mechworks_common::{BlockPos, Cell, NotifyFlags, Orientation, TriggerEvent, TypeId};
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, TileEntity};

/// An event record produced by every mutation to the world.
///
/// The log is append-only and is enough to rebuild cell and power state via
/// [`World::replay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A cell changed occupant or metadata.
    CellChanged {
        pos: BlockPos,
        old: Cell,
        new: Cell,
        broadcast: bool,
    },
    /// A power source was switched on or off.
    PowerChanged { pos: BlockPos, powered: bool },
    /// Auxiliary state was attached to a cell.
    TileEntityAttached { pos: BlockPos, entity: TileEntity },
    /// A deferred trigger was queued.
    TriggerScheduled { pos: BlockPos, event: TriggerEvent },
    /// A deferred trigger was handed to its cell's behavior.
    TriggerDelivered { pos: BlockPos, event: TriggerEvent },
    /// Simulation advanced one tick.
    Stepped { tick: u64 },
}

/// A queued neighbor-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborUpdate {
    /// The cell being told.
    pub pos: BlockPos,
    /// The cell that changed.
    pub source: BlockPos,
}

/// A trigger waiting for the next step. Carries the type that scheduled it so
/// stale triggers can be dropped if the cell was replaced meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTrigger {
    pub pos: BlockPos,
    pub type_id: TypeId,
    pub event: TriggerEvent,
}

type Key = [i32; 3];

fn key(pos: BlockPos) -> Key {
    pos.to_array()
}

/// The authoritative in-memory grid.
///
/// Cells are stored sparsely (empty cells are absent) in BTreeMaps for
/// deterministic iteration. Neighbor updates and triggers are queued here and
/// drained by [`crate::Simulation`].
#[derive(Debug, Clone, Default)]
pub struct World {
    cells: BTreeMap<Key, Cell>,
    power: BTreeSet<Key>,
    tile_entities: BTreeMap<Key, TileEntity>,
    tick: u64,
    updates: VecDeque<NeighborUpdate>,
    triggers: VecDeque<ScheduledTrigger>,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All non-empty cells in canonical order.
    pub fn cells(&self) -> impl Iterator<Item = (BlockPos, Cell)> + '_ {
        self.cells
            .iter()
            .map(|(k, c)| (BlockPos::from_array(*k), *c))
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn is_powered(&self, pos: BlockPos) -> bool {
        self.power.contains(&key(pos))
    }

    /// Switch a power source at `pos`. Every cell within two steps is told,
    /// which covers each probe a neighboring mechanism might make.
    /// Returns false when nothing changed.
    pub fn set_power(&mut self, pos: BlockPos, powered: bool) -> bool {
        let changed = if powered {
            self.power.insert(key(pos))
        } else {
            self.power.remove(&key(pos))
        };
        if !changed {
            return false;
        }
        self.event_log.push(WorldEvent::PowerChanged { pos, powered });

        let mut reached = BTreeSet::new();
        reached.insert(key(pos));
        for a in Orientation::ALL {
            let near = a.offset(pos, 1);
            reached.insert(key(near));
            for b in Orientation::ALL {
                reached.insert(key(b.offset(near, 1)));
            }
        }
        for k in reached {
            self.updates.push_back(NeighborUpdate {
                pos: BlockPos::from_array(k),
                source: pos,
            });
        }
        true
    }

    /// Attach auxiliary state to an occupied cell. Returns false for empty cells.
    pub fn attach_tile_entity(&mut self, pos: BlockPos, entity: TileEntity) -> bool {
        if !self.cells.contains_key(&key(pos)) {
            return false;
        }
        self.event_log.push(WorldEvent::TileEntityAttached {
            pos,
            entity: entity.clone(),
        });
        self.tile_entities.insert(key(pos), entity);
        true
    }

    /// Next queued neighbor update, if any.
    pub fn pop_update(&mut self) -> Option<NeighborUpdate> {
        self.updates.pop_front()
    }

    pub fn pending_updates(&self) -> usize {
        self.updates.len()
    }

    /// Discard all queued neighbor updates. Returns how many were dropped.
    pub fn clear_updates(&mut self) -> usize {
        let n = self.updates.len();
        self.updates.clear();
        n
    }

    pub fn pending_triggers(&self) -> usize {
        self.triggers.len()
    }

    /// Take every trigger queued so far, leaving later ones for the next step.
    pub fn take_triggers(&mut self) -> Vec<ScheduledTrigger> {
        self.triggers.drain(..).collect()
    }

    /// Record that a trigger reached its cell.
    pub fn record_delivery(&mut self, trigger: &ScheduledTrigger) {
        self.event_log.push(WorldEvent::TriggerDelivered {
            pos: trigger.pos,
            event: trigger.event,
        });
    }

    /// Advance the tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
        self.event_log.push(WorldEvent::Stepped { tick: self.tick });
    }

    /// Reconstruct cell, power and tile-entity state from a sequence of events.
    /// Queues are not part of the replayed state.
    pub fn replay(events: &[WorldEvent]) -> Self {
        let mut world = Self::new();
        for event in events {
            match event {
                WorldEvent::CellChanged { pos, new, .. } => {
                    world.store(*pos, *new);
                }
                WorldEvent::PowerChanged { pos, powered } => {
                    if *powered {
                        world.power.insert(key(*pos));
                    } else {
                        world.power.remove(&key(*pos));
                    }
                }
                WorldEvent::TileEntityAttached { pos, entity } => {
                    world.tile_entities.insert(key(*pos), entity.clone());
                }
                WorldEvent::Stepped { tick } => {
                    world.tick = *tick;
                }
                WorldEvent::TriggerScheduled { .. } | WorldEvent::TriggerDelivered { .. } => {}
            }
        }
        world
    }

    /// Deterministic hash of tick, cells and power sources (FNV-1a).
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (k, cell) in &self.cells {
            for c in k {
                mix(&mut h, &c.to_le_bytes());
            }
            mix(&mut h, &cell.type_id.0.to_le_bytes());
            mix(&mut h, &[cell.data]);
        }
        mix(&mut h, b"power");
        for k in &self.power {
            for c in k {
                mix(&mut h, &c.to_le_bytes());
            }
        }
        h
    }

    fn store(&mut self, pos: BlockPos, cell: Cell) {
        let k = key(pos);
        let replaced = self.cells.get(&k).map(|c| c.type_id);
        if replaced != Some(cell.type_id) {
            self.tile_entities.remove(&k);
        }
        if cell.is_empty() {
            self.cells.remove(&k);
        } else {
            self.cells.insert(k, cell);
        }
    }
}

impl Grid for World {
    fn cell(&self, pos: BlockPos) -> Cell {
        self.cells.get(&key(pos)).copied().unwrap_or(Cell::EMPTY)
    }

    fn set_cell(&mut self, pos: BlockPos, cell: Cell, flags: NotifyFlags) {
        let old = self.cell(pos);
        if old == cell {
            return;
        }
        self.store(pos, cell);
        tracing::trace!(?pos, ?old, new = ?cell, flags = flags.bits(), "cell write");
        self.event_log.push(WorldEvent::CellChanged {
            pos,
            old,
            new: cell,
            broadcast: flags.contains(NotifyFlags::CLIENTS),
        });
        if flags.contains(NotifyFlags::NEIGHBORS) {
            for face in Orientation::ALL {
                self.updates.push_back(NeighborUpdate {
                    pos: face.offset(pos, 1),
                    source: pos,
                });
            }
        }
    }

    fn indirect_power(&self, pos: BlockPos, _face: Orientation) -> bool {
        self.is_powered(pos)
    }

    fn schedule_trigger(&mut self, pos: BlockPos, event: TriggerEvent) {
        let type_id = self.type_id(pos);
        self.event_log
            .push(WorldEvent::TriggerScheduled { pos, event });
        self.triggers.push_back(ScheduledTrigger {
            pos,
            type_id,
            event,
        });
    }

    fn tile_entity(&self, pos: BlockPos) -> Option<&TileEntity> {
        self.tile_entities.get(&key(pos))
    }

    fn notify(&mut self, pos: BlockPos, source: BlockPos) {
        self.updates.push_back(NeighborUpdate { pos, source });
    }
}
