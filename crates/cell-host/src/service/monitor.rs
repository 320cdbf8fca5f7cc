//! Storage-monitor accessor capability.
//!
//! The accessor hands out a monitor only to actors that pass the device's
//! access check; the monitor then transacts through the security wrapper
//! like any other caller.

use crate::domain::{ActionSource, Actionable, Channel, ChannelStack, Face};
use crate::ports::CapabilityKind;

use super::controller::ChestController;

pub struct MonitorAccessor<'a> {
    chest: &'a mut ChestController,
}

impl<'a> MonitorAccessor<'a> {
    pub fn open(chest: &'a mut ChestController, face: Face) -> Option<Self> {
        if chest.has_capability(CapabilityKind::StorageMonitorAccessor, face) {
            Some(Self { chest })
        } else {
            None
        }
    }

    /// The monitor, if `source` may access this device.
    pub fn monitor(self, source: &ActionSource) -> Option<StorageMonitor<'a>> {
        if self.chest.can_access(source) {
            Some(StorageMonitor { chest: self.chest })
        } else {
            None
        }
    }
}

/// View over the bound medium's contents.
pub struct StorageMonitor<'a> {
    chest: &'a mut ChestController,
}

impl StorageMonitor<'_> {
    /// Empty when no handler is bound for `channel`.
    pub fn available(&mut self, channel: Channel) -> Vec<ChannelStack> {
        self.chest.available(channel).unwrap_or_default()
    }

    pub fn inject(
        &mut self,
        stack: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Option<ChannelStack> {
        match self.chest.inject(stack, mode, source) {
            Ok(rest) => rest,
            Err(_) => Some(stack),
        }
    }

    pub fn extract(
        &mut self,
        request: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Option<ChannelStack> {
        self.chest.extract(request, mode, source).ok().flatten()
    }
}
