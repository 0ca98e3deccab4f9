use std::sync::Arc;

use anyhow::{Context, ensure};
use glam::IVec2;
use mechworks_actuator::{ActuatorState, ActuatorTypes, install};
use mechworks_common::{BlockPos, Cell, NotifyFlags, Orientation, TypeId};
use mechworks_kernel::{Grid, Simulation, TypeProperties, TypeRegistry, World};
use mechworks_render::{DebugTextRenderer, GlyphTable, Renderer, SliceView};

use crate::config::MechworksConfig;

/// Base position used by every scenario.
pub const BASE: BlockPos = BlockPos::new(0, 64, 0);

/// What to lay out in front of the base.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub orientation: Orientation,
    pub sticky: bool,
    /// Stone cells directly ahead of the base.
    pub row: i32,
    /// Replace this row cell (1-based) with a pinned one.
    pub blocker: Option<i32>,
}

/// A simulation with one actuator and a row of cells ahead of it.
pub struct Scenario {
    pub sim: Simulation,
    pub types: ActuatorTypes,
    pub layout: Layout,
    renderer: DebugTextRenderer,
}

impl Scenario {
    pub fn build(config: &MechworksConfig, layout: Layout) -> anyhow::Result<Self> {
        ensure!(layout.row >= 0, "row length must not be negative");
        let mut reg = TypeRegistry::new();
        let stone = reg.register(TypeProperties::solid("stone"))?;
        let obsidian = reg.register(TypeProperties::pinned("obsidian"))?;
        let types = ActuatorTypes::register(&mut reg)?;

        let mut glyphs = GlyphTable::from_registry(&reg);
        glyphs
            .set(types.normal, 'P')
            .set(types.sticky, 'S')
            .set(types.arm, '=')
            .set(obsidian, '#');

        let mut sim = Simulation::new(
            World::new(),
            Arc::new(reg),
            config.simulation.clone(),
        );
        install(&mut sim, types, config.actuator.clone());

        for i in 1..=layout.row {
            let id: TypeId = if layout.blocker == Some(i) { obsidian } else { stone };
            let pos = layout.orientation.offset(BASE, i);
            sim.world_mut()
                .set_cell(pos, Cell::new(id, (i - 1) as u8), NotifyFlags::NONE);
        }
        let base = Cell::new(
            types.base(layout.sticky),
            ActuatorState::retracted(layout.orientation).encode(),
        );
        sim.place(BASE, base).context("placing actuator base")?;
        tracing::info!(?layout, "scenario ready");

        Ok(Self {
            sim,
            types,
            layout,
            renderer: DebugTextRenderer::new(glyphs),
        })
    }

    /// Power source directly behind the base.
    pub fn power_pos(&self) -> BlockPos {
        self.layout.orientation.opposite().offset(BASE, 1)
    }

    pub fn set_power(&mut self, on: bool) -> anyhow::Result<()> {
        let pos = self.power_pos();
        self.sim.set_power(pos, on)?;
        Ok(())
    }

    /// Step until nothing is scheduled. Returns steps taken.
    pub fn settle(&mut self) -> anyhow::Result<usize> {
        Ok(self.sim.settle(16)?)
    }

    pub fn base_state(&self) -> Option<ActuatorState> {
        ActuatorState::decode(self.sim.world().data(BASE))
    }

    pub fn arm_present(&self) -> bool {
        self.sim.world().type_id(self.layout.orientation.offset(BASE, 1)) == self.types.arm
    }

    /// Text picture of the row. Horizontal rows are one slice; vertical
    /// rows are drawn one layer per slice, top layer first.
    pub fn render(&self) -> String {
        let reach = self.layout.row + 2;
        let o = self.layout.orientation;
        let world = self.sim.world();
        if o.step().y == 0 {
            let far = o.offset(BASE, reach);
            let near = o.opposite().offset(BASE, 1);
            let view = SliceView::new(
                BASE.y,
                IVec2::new(near.x, near.z) - IVec2::ONE,
                IVec2::new(far.x, far.z) + IVec2::ONE,
            );
            return self.renderer.render(world, &view);
        }
        let (lo, hi) = if o.step().y > 0 {
            (BASE.y - 1, BASE.y + reach)
        } else {
            (BASE.y - reach, BASE.y + 1)
        };
        (lo..=hi)
            .rev()
            .map(|y| self.renderer.render(world, &SliceView::around(y, 1)))
            .collect()
    }
}
