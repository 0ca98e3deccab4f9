use std::sync::Arc;

use mechworks_common::{BlockPos, Cell, NotifyFlags, Orientation, TypeId};
use mechworks_kernel::{Grid, Simulation, SimulationConfig, TypeProperties, TypeRegistry, World};

use crate::row::RowScanner;
use crate::state::ActuatorState;
use crate::{ActuatorConfig, ActuatorTypes, install};

/// A simulation with actuators installed plus a few plain cell types.
pub(crate) struct Fixture {
    pub sim: Simulation,
    pub types: ActuatorTypes,
    pub config: ActuatorConfig,
    pub stone: TypeId,
    pub grass: TypeId,
    pub obsidian: TypeId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut reg = TypeRegistry::new();
        let stone = reg.register(TypeProperties::solid("stone")).unwrap();
        let grass = reg.register(TypeProperties::replaceable("tall_grass")).unwrap();
        let obsidian = reg.register(TypeProperties::pinned("obsidian")).unwrap();
        let types = ActuatorTypes::register(&mut reg).unwrap();
        let config = ActuatorConfig::default();
        let mut sim = Simulation::new(World::new(), Arc::new(reg), SimulationConfig::default());
        install(&mut sim, types, config.clone());
        Self {
            sim,
            types,
            config,
            stone,
            grass,
            obsidian,
        }
    }

    pub fn scanner(&self) -> RowScanner<'_> {
        RowScanner::new(self.sim.registry(), &self.types, &self.config)
    }

    /// Write `count` stone cells starting at `start`, without notifying anyone.
    pub fn stone_row(&mut self, start: BlockPos, orientation: Orientation, count: i32) {
        for i in 0..count {
            self.sim.world_mut().set_cell(
                orientation.offset(start, i),
                Cell::new(self.stone, i as u8),
                NotifyFlags::NONE,
            );
        }
    }

    /// Place a retracted base through the simulation.
    pub fn place_base(&mut self, pos: BlockPos, orientation: Orientation, sticky: bool) {
        let cell = Cell::new(
            self.types.base(sticky),
            ActuatorState::retracted(orientation).encode(),
        );
        self.sim.place(pos, cell).unwrap();
    }

    pub fn base_state(&self, pos: BlockPos) -> Option<ActuatorState> {
        let cell = self.sim.world().cell(pos);
        if !self.types.is_base(cell.type_id) {
            return None;
        }
        ActuatorState::decode(cell.data)
    }
}
