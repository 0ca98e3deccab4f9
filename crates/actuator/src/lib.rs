//! Piston-style actuators: a base that senses power and pushes a row of cells,
//! and the arm cell it extends.
//!
//! # Invariants
//! - Orientation is fixed at placement; only the powered/pending bits change.
//! - A push either moves the whole row or touches nothing.
//! - Extension and retraction always happen on a later step than the power
//!   change that caused them.

mod arm;
mod base;
mod config;
mod row;
mod state;
mod texture;

#[cfg(test)]
mod testing;

pub use arm::ActuatorArm;
pub use base::ActuatorBase;
pub use config::ActuatorConfig;
pub use row::{BlockReason, RowCell, RowScan, RowScanner};
pub use state::{ActuatorState, ArmState};
pub use texture::ActuatorTexture;

use mechworks_common::TypeId;
use mechworks_kernel::{RegistryError, Simulation, TypeProperties, TypeRegistry};

/// Type ids of the three actuator cell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTypes {
    pub normal: TypeId,
    pub sticky: TypeId,
    pub arm: TypeId,
}

impl ActuatorTypes {
    /// Register the normal base, sticky base and arm types.
    pub fn register(registry: &mut TypeRegistry) -> Result<Self, RegistryError> {
        let props = |name: &str| TypeProperties {
            solid: false,
            ..TypeProperties::solid(name)
        };
        Ok(Self {
            normal: registry.register(props("piston"))?,
            sticky: registry.register(props("piston_sticky"))?,
            arm: registry.register(props("piston_extension"))?,
        })
    }

    pub fn is_base(&self, id: TypeId) -> bool {
        id == self.normal || id == self.sticky
    }

    pub fn base(&self, sticky: bool) -> TypeId {
        if sticky { self.sticky } else { self.normal }
    }
}

/// Attach actuator behaviors for `types` to a simulation.
pub fn install(sim: &mut Simulation, types: ActuatorTypes, config: ActuatorConfig) {
    let registry = sim.registry().clone();
    sim.register_behavior(
        types.normal,
        ActuatorBase::new(registry.clone(), types, false, config.clone()),
    );
    sim.register_behavior(
        types.sticky,
        ActuatorBase::new(registry, types, true, config),
    );
    sim.register_behavior(types.arm, ActuatorArm::new(types));
    tracing::debug!(?types, "actuator behaviors installed");
}
