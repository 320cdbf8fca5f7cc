//! Fluid-handler capability.
//!
//! Fill-only: fluids go in through the bound fluid handler at
//! `amount / fluid_power_divisor` energy, nothing ever drains out.

use crate::domain::{Channel, Face, FluidStack};
use crate::ports::CapabilityKind;

use super::controller::ChestController;

/// Reported tank shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TankProperties {
    pub contents: Option<FluidStack>,
    pub capacity: u64,
}

/// Fluid handler bound to a device face.
pub struct FluidPort<'a> {
    chest: &'a mut ChestController,
}

impl<'a> FluidPort<'a> {
    /// The fluid port on `face`, if the device exposes one there.
    pub fn open(chest: &'a mut ChestController, face: Face) -> Option<Self> {
        if chest.has_capability(CapabilityKind::FluidHandler, face) {
            Some(Self { chest })
        } else {
            None
        }
    }

    /// Returns the amount accepted. Energy is only spent when `do_fill`.
    pub fn fill(&mut self, fluid: FluidStack, do_fill: bool) -> u64 {
        self.chest.fill_fluid(fluid, do_fill)
    }

    pub fn drain(&mut self, _request: FluidStack, _do_drain: bool) -> Option<FluidStack> {
        None
    }

    /// A single nominal tank while a fluid medium is bound.
    pub fn tank_properties(&mut self) -> Vec<TankProperties> {
        if self.chest.handler(Channel::Fluids).is_err() {
            return Vec::new();
        }
        vec![TankProperties {
            contents: None,
            capacity: 1,
        }]
    }
}
