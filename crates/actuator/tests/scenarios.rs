use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use mechworks_actuator::{ActuatorConfig, ActuatorState, ActuatorTypes, ArmState, install};
use mechworks_common::{BlockPos, Cell, NotifyFlags, Orientation, TypeId};
use mechworks_kernel::{
    CellBehavior, Grid, Simulation, SimulationConfig, TypeProperties, TypeRegistry, World,
    WorldEvent,
};

struct Rig {
    sim: Simulation,
    types: ActuatorTypes,
    stone: TypeId,
    obsidian: TypeId,
}

fn rig() -> Rig {
    rig_with(|_| {})
}

/// Build a rig, letting the caller register extra cell types first.
fn rig_with(extra: impl FnOnce(&mut TypeRegistry)) -> Rig {
    let mut reg = TypeRegistry::new();
    let stone = reg.register(TypeProperties::solid("stone")).unwrap();
    let obsidian = reg.register(TypeProperties::pinned("obsidian")).unwrap();
    reg.register(TypeProperties::replaceable("tall_grass")).unwrap();
    let types = ActuatorTypes::register(&mut reg).unwrap();
    extra(&mut reg);

    let mut sim = Simulation::new(World::new(), Arc::new(reg), SimulationConfig::default());
    install(&mut sim, types, ActuatorConfig::default());
    Rig {
        sim,
        types,
        stone,
        obsidian,
    }
}

fn p(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

impl Rig {
    fn place_base(&mut self, pos: BlockPos, orientation: Orientation, sticky: bool) {
        let data = ActuatorState::retracted(orientation).encode();
        self.sim
            .place(pos, Cell::new(self.types.base(sticky), data))
            .unwrap();
    }

    /// Stones tagged with their index in metadata so moves can be traced.
    fn stones(&mut self, start: BlockPos, orientation: Orientation, count: i32) {
        for i in 0..count {
            self.sim.world_mut().set_cell(
                orientation.offset(start, i),
                Cell::new(self.stone, i as u8),
                NotifyFlags::NONE,
            );
        }
    }

    fn state(&self, pos: BlockPos) -> ActuatorState {
        ActuatorState::decode(self.sim.world().data(pos)).unwrap()
    }

    fn cell(&self, pos: BlockPos) -> Cell {
        self.sim.world().cell(pos)
    }

    fn cell_writes(&self) -> usize {
        self.sim
            .world()
            .events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::CellChanged { .. }))
            .count()
    }
}

#[test]
fn power_on_top_extends_arm_forward() {
    let mut r = rig();
    r.place_base(p(0, 0, 0), Orientation::East, false);
    r.sim.set_power(p(0, 1, 0), true).unwrap();
    r.sim.step().unwrap();

    let state = r.state(p(0, 0, 0));
    assert!(state.powered);
    assert!(!state.pending);
    let arm = r.cell(p(1, 0, 0));
    assert_eq!(arm.type_id, r.types.arm);
    assert_eq!(
        ArmState::decode(arm.data),
        Some(ArmState {
            orientation: Orientation::East,
            sticky: false
        })
    );
}

#[test]
fn unpowered_base_never_extends() {
    let mut r = rig();
    r.place_base(p(0, 5, 0), Orientation::East, false);
    for _ in 0..3 {
        r.sim.step().unwrap();
    }
    assert!(!r.state(p(0, 5, 0)).powered);
    assert!(r.cell(p(1, 5, 0)).is_empty());
}

#[test]
fn power_on_pushing_face_alone_is_ignored() {
    for orientation in Orientation::ALL {
        let mut r = rig();
        let pos = p(0, 5, 0);
        r.place_base(pos, orientation, false);
        r.sim.set_power(orientation.offset(pos, 1), true).unwrap();
        r.sim.step().unwrap();
        assert!(!r.state(pos).powered, "{orientation:?}");
        assert_eq!(r.sim.world().pending_triggers(), 0);
    }
}

#[test]
fn rows_up_to_twelve_shift_one_step() {
    for n in [1, 2, 7, 12] {
        let mut r = rig();
        let base = p(0, 5, 0);
        r.stones(p(1, 5, 0), Orientation::East, n);
        r.place_base(base, Orientation::East, false);
        r.sim.set_power(p(-1, 5, 0), true).unwrap();
        r.sim.step().unwrap();

        assert!(r.state(base).powered, "n={n}");
        assert_eq!(r.cell(p(1, 5, 0)).type_id, r.types.arm);
        for i in 0..n {
            let cell = r.cell(p(2 + i, 5, 0));
            assert_eq!(cell, Cell::new(r.stone, i as u8), "n={n} i={i}");
        }
        assert!(r.cell(p(2 + n, 5, 0)).is_empty());
    }
}

#[test]
fn thirteen_cells_are_too_many() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.stones(p(1, 5, 0), Orientation::East, 13);
    r.place_base(base, Orientation::East, false);
    r.sim.world_mut().drain_events();

    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.step().unwrap();

    assert!(!r.state(base).powered);
    assert_eq!(r.cell_writes(), 0);
    assert_eq!(r.cell(p(1, 5, 0)), Cell::new(r.stone, 0));
}

#[test]
fn immovable_cell_blocks_whole_row() {
    for blocker_at in 1..=4 {
        let mut r = rig();
        let base = p(0, 5, 0);
        r.stones(p(1, 5, 0), Orientation::East, 4);
        let obsidian = r.obsidian;
        r.sim.world_mut().set_cell(
            p(blocker_at, 5, 0),
            Cell::new(obsidian, 0),
            NotifyFlags::NONE,
        );
        r.place_base(base, Orientation::East, false);
        r.sim.world_mut().drain_events();

        r.sim.set_power(p(0, 6, 0), true).unwrap();
        r.sim.step().unwrap();

        assert!(!r.state(base).powered, "blocker at {blocker_at}");
        assert_eq!(r.cell_writes(), 0);
    }
}

#[test]
fn extended_peer_is_immovable_idle_peer_moves() {
    let mut r = rig();
    let base = p(0, 5, 0);
    let peer = p(1, 5, 0);
    r.place_base(peer, Orientation::Up, false);
    r.place_base(base, Orientation::East, false);

    r.sim.set_power(p(0, 4, 0), true).unwrap();
    r.sim.step().unwrap();
    assert!(r.state(base).powered);
    let moved = r.cell(p(2, 5, 0));
    assert_eq!(moved.type_id, r.types.normal);
    assert_eq!(
        ActuatorState::decode(moved.data),
        Some(ActuatorState::retracted(Orientation::Up))
    );

    // A second base facing the now-extended one cannot push it.
    let mut r = rig();
    r.place_base(p(1, 5, 0), Orientation::Up, false);
    r.sim.set_power(p(1, 4, 0), true).unwrap();
    r.sim.step().unwrap();
    assert!(r.state(p(1, 5, 0)).powered);

    r.place_base(p(0, 5, 0), Orientation::East, false);
    r.sim.set_power(p(-1, 5, 0), true).unwrap();
    r.sim.step().unwrap();
    assert!(!r.state(p(0, 5, 0)).powered);
}

#[test]
fn sticky_retract_pulls_cell_back() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.stones(p(1, 5, 0), Orientation::East, 1);
    r.place_base(base, Orientation::East, true);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.step().unwrap();
    assert_eq!(r.cell(p(2, 5, 0)).type_id, r.stone);
    assert!(ArmState::decode(r.cell(p(1, 5, 0)).data).unwrap().sticky);

    r.sim.set_power(p(0, 6, 0), false).unwrap();
    assert!(r.state(base).pending);
    r.sim.step().unwrap();

    assert_eq!(r.state(base), ActuatorState::retracted(Orientation::East));
    assert_eq!(r.cell(p(1, 5, 0)).type_id, r.stone);
    assert!(r.cell(p(2, 5, 0)).is_empty());
}

#[test]
fn plain_retract_leaves_pushed_cell() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.stones(p(1, 5, 0), Orientation::East, 1);
    r.place_base(base, Orientation::East, false);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.step().unwrap();

    r.sim.set_power(p(0, 6, 0), false).unwrap();
    r.sim.step().unwrap();

    assert_eq!(r.state(base), ActuatorState::retracted(Orientation::East));
    assert!(r.cell(p(1, 5, 0)).is_empty());
    assert_eq!(r.cell(p(2, 5, 0)).type_id, r.stone);
}

#[test]
fn sticky_retract_with_nothing_to_pull_clears_arm() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.place_base(base, Orientation::North, true);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.step().unwrap();
    let obsidian = r.obsidian;
    r.sim
        .world_mut()
        .set_cell(p(0, 5, -2), Cell::new(obsidian, 0), NotifyFlags::NONE);

    r.sim.set_power(p(0, 6, 0), false).unwrap();
    r.sim.step().unwrap();

    assert!(r.cell(p(0, 5, -1)).is_empty());
    assert_eq!(r.cell(p(0, 5, -2)).type_id, r.obsidian);
}

#[test]
fn breaking_arm_removes_extended_base() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.place_base(base, Orientation::East, false);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.step().unwrap();

    let removed = r.sim.player_destroy(p(1, 5, 0)).unwrap();
    assert_eq!(removed.type_id, r.types.arm);
    assert!(r.cell(base).is_empty());
    assert!(r.cell(p(1, 5, 0)).is_empty());
    let base_write = r.sim.world().events().iter().rev().find_map(|e| match e {
        WorldEvent::CellChanged { pos, broadcast, .. } if *pos == base => Some(*broadcast),
        _ => None,
    });
    assert_eq!(base_write, Some(false));
}

#[test]
fn removing_base_tears_down_arm() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.place_base(base, Orientation::Down, true);
    r.sim.set_power(p(1, 5, 0), true).unwrap();
    r.sim.step().unwrap();
    assert_eq!(r.cell(p(0, 4, 0)).type_id, r.types.arm);

    r.sim.remove(base).unwrap();
    assert!(r.cell(p(0, 4, 0)).is_empty());
}

#[test]
fn power_lost_before_extension_lands_retracts_next_step() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.place_base(base, Orientation::East, false);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    r.sim.set_power(p(0, 6, 0), false).unwrap();

    r.sim.step().unwrap();
    assert_eq!(r.cell(p(1, 5, 0)).type_id, r.types.arm);
    assert!(r.state(base).pending);

    r.sim.step().unwrap();
    assert_eq!(r.state(base), ActuatorState::retracted(Orientation::East));
    assert!(r.cell(p(1, 5, 0)).is_empty());
}

#[test]
fn replaced_base_ignores_trigger_meant_for_its_predecessor() {
    let mut r = rig();
    let base = p(0, 5, 0);
    r.place_base(base, Orientation::East, false);
    r.sim.set_power(p(0, 6, 0), true).unwrap();
    assert_eq!(r.sim.world().pending_triggers(), 1);

    r.sim.remove(base).unwrap();
    r.sim.set_power(p(0, 6, 0), false).unwrap();
    r.place_base(base, Orientation::North, false);
    r.sim.step().unwrap();

    assert_eq!(r.state(base), ActuatorState::retracted(Orientation::North));
    assert!(r.cell(p(1, 5, 0)).is_empty());
    assert!(r.cell(p(0, 5, -1)).is_empty());
}

#[test]
fn upward_push_stops_at_ceiling() {
    let mut r = rig();
    let base = p(0, 124, 0);
    r.stones(p(0, 125, 0), Orientation::Up, 2);
    r.place_base(base, Orientation::Up, false);
    r.sim.set_power(p(1, 124, 0), true).unwrap();
    r.sim.step().unwrap();

    assert!(r.state(base).powered);
    assert_eq!(r.cell(p(0, 125, 0)).type_id, r.types.arm);
    assert_eq!(r.cell(p(0, 127, 0)), Cell::new(r.stone, 1));
}

/// Records what the pushed row looked like whenever it is notified.
struct RowWatcher {
    seen: Rc<RefCell<Vec<Vec<Cell>>>>,
}

impl CellBehavior for RowWatcher {
    fn on_neighbor_changed(&self, grid: &mut dyn Grid, _pos: BlockPos, _source: BlockPos) {
        let row = (1..=4).map(|x| grid.cell(p(x, 5, 0))).collect();
        self.seen.borrow_mut().push(row);
    }
}

#[test]
fn neighbors_only_observe_the_finished_push() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut watcher_id = TypeId::EMPTY;
    let mut r = rig_with(|reg| {
        watcher_id = reg.register(TypeProperties::solid("watcher")).unwrap();
    });
    r.sim.register_behavior(
        watcher_id,
        RowWatcher {
            seen: seen.clone(),
        },
    );

    r.stones(p(1, 5, 0), Orientation::East, 3);
    r.sim
        .world_mut()
        .set_cell(p(2, 6, 0), Cell::new(watcher_id, 0), NotifyFlags::NONE);
    r.place_base(p(0, 5, 0), Orientation::East, false);
    r.sim.set_power(p(0, 4, 0), true).unwrap();
    seen.borrow_mut().clear();

    r.sim.step().unwrap();

    let expected = vec![
        Cell::new(r.types.arm, Orientation::East.index()),
        Cell::new(r.stone, 0),
        Cell::new(r.stone, 1),
        Cell::new(r.stone, 2),
    ];
    let seen = seen.borrow();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|row| *row == expected));
}

#[test]
fn same_inputs_give_same_world() {
    let run = || {
        let mut r = rig();
        r.stones(p(1, 5, 0), Orientation::East, 5);
        r.place_base(p(0, 5, 0), Orientation::East, true);
        r.sim.set_power(p(0, 6, 0), true).unwrap();
        r.sim.step().unwrap();
        r.sim.set_power(p(0, 6, 0), false).unwrap();
        r.sim.step().unwrap();
        r.sim
    };
    let a = run();
    let b = run();
    assert_eq!(a.world().state_hash(), b.world().state_hash());

    let replayed = World::replay(a.world().events());
    assert_eq!(replayed.state_hash(), a.world().state_hash());
}
