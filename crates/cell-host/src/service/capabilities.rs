//! Capability lookup table keyed by `(kind, face)`.

use std::collections::HashMap;

use crate::domain::Face;
use crate::ports::{CapabilityHandle, CapabilityKind, SlotKind};

#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: HashMap<(CapabilityKind, Face), CapabilityHandle>,
}

impl CapabilityTable {
    /// Layout for a device facing `forward`.
    ///
    /// Item handlers exist on every face: the forward face reaches the
    /// medium slot, the rest reach the intake slot. Neither the fluid
    /// handle nor the monitor accessor is ever offered on the forward face;
    /// the fluid handle needs a bound fluid channel, the accessor any bound
    /// channel.
    pub fn build(forward: Face, fluid_bound: bool, any_bound: bool) -> Self {
        let mut entries = HashMap::new();
        for face in Face::ALL {
            let slot = if face == forward {
                SlotKind::Medium
            } else {
                SlotKind::Intake
            };
            entries.insert(
                (CapabilityKind::ItemHandler, face),
                CapabilityHandle::ItemSlot(slot),
            );

            if face == forward {
                continue;
            }
            if fluid_bound {
                entries.insert((CapabilityKind::FluidHandler, face), CapabilityHandle::Fluid);
            }
            if any_bound {
                entries.insert(
                    (CapabilityKind::StorageMonitorAccessor, face),
                    CapabilityHandle::MonitorAccessor,
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, kind: CapabilityKind, face: Face) -> Option<CapabilityHandle> {
        self.entries.get(&(kind, face)).copied()
    }

    pub fn contains(&self, kind: CapabilityKind, face: Face) -> bool {
        self.entries.contains_key(&(kind, face))
    }
}
