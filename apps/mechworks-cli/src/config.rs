use std::path::Path;

use anyhow::{Context, ensure};
use mechworks_actuator::ActuatorConfig;
use mechworks_kernel::SimulationConfig;
use serde::{Deserialize, Serialize};

/// Top-level settings file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MechworksConfig {
    pub simulation: SimulationConfig,
    pub actuator: ActuatorConfig,
}

impl MechworksConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("invalid YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.actuator.min_y <= self.actuator.max_y,
            "actuator.min_y ({}) is above actuator.max_y ({})",
            self.actuator.min_y,
            self.actuator.max_y
        );
        ensure!(
            self.simulation.max_updates_per_flush > 0,
            "simulation.max_updates_per_flush must be positive"
        );
        Ok(())
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
