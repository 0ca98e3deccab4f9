use serde::{Deserialize, Serialize};

/// Limits applied by actuators when they push or pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Most movable cells one extension may shift.
    pub push_limit: usize,
    /// Lowest y a pushed row may occupy.
    pub min_y: i32,
    /// Highest y a pushed row may occupy.
    pub max_y: i32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            push_limit: 12,
            min_y: 1,
            max_y: 126,
        }
    }
}

impl ActuatorConfig {
    pub fn contains_height(&self, y: i32) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }
}
