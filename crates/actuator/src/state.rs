//! Decoded views of actuator cell metadata.
//!
//! Layout of the metadata byte:
//! - bits 0-2: orientation
//! - bit 3: powered (base) / sticky cap (arm)
//! - bit 4: transition pending (base only)

use mechworks_common::Orientation;

const ORIENTATION_MASK: u8 = 0b0111;
const POWERED_BIT: u8 = 1 << 3;
const STICKY_BIT: u8 = 1 << 3;
const PENDING_BIT: u8 = 1 << 4;

/// State of a base cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActuatorState {
    pub orientation: Orientation,
    /// Extended (or committed to extending).
    pub powered: bool,
    /// A trigger has been scheduled and not yet delivered.
    pub pending: bool,
}

impl ActuatorState {
    pub fn retracted(orientation: Orientation) -> Self {
        Self {
            orientation,
            powered: false,
            pending: false,
        }
    }

    pub fn extended(orientation: Orientation) -> Self {
        Self {
            powered: true,
            ..Self::retracted(orientation)
        }
    }

    /// `None` when the orientation field holds 6 or 7.
    pub fn decode(data: u8) -> Option<Self> {
        let orientation = Orientation::from_index(data & ORIENTATION_MASK)?;
        Some(Self {
            orientation,
            powered: data & POWERED_BIT != 0,
            pending: data & PENDING_BIT != 0,
        })
    }

    pub fn encode(self) -> u8 {
        let mut data = self.orientation.index();
        if self.powered {
            data |= POWERED_BIT;
        }
        if self.pending {
            data |= PENDING_BIT;
        }
        data
    }

    pub fn with_powered(self, powered: bool) -> Self {
        Self { powered, ..self }
    }

    pub fn with_pending(self, pending: bool) -> Self {
        Self { pending, ..self }
    }

    /// Whether an arm may currently hang off this base.
    pub fn holds_arm(&self) -> bool {
        self.powered || self.pending
    }
}

/// State of an arm cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmState {
    pub orientation: Orientation,
    pub sticky: bool,
}

impl ArmState {
    pub fn decode(data: u8) -> Option<Self> {
        let orientation = Orientation::from_index(data & ORIENTATION_MASK)?;
        Some(Self {
            orientation,
            sticky: data & STICKY_BIT != 0,
        })
    }

    pub fn encode(self) -> u8 {
        let sticky = if self.sticky { STICKY_BIT } else { 0 };
        self.orientation.index() | sticky
    }
}
