//! Inbound Ports (Driving Ports)
//!
//! The surface the world drives a host through: the per-tick update, the
//! owner-facing configuration calls and the capability query surface.

use crate::domain::{ActionSource, Face, ItemStack, PaintColor, SyncRecord};

/// Capability kinds a face can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    ItemHandler,
    FluidHandler,
    StorageMonitorAccessor,
}

/// Which device slot an item-handler capability addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Intake,
    Medium,
}

/// Tagged handle returned by a capability lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityHandle {
    ItemSlot(SlotKind),
    Fluid,
    MonitorAccessor,
}

/// Host device API.
pub trait CellHostApi {
    /// One logical update.
    fn tick(&mut self);

    fn priority(&self) -> i32;

    fn set_priority(&mut self, priority: i32);

    /// Returns `false` when the color was already set.
    fn recolor(&mut self, color: PaintColor) -> bool;

    /// Requests a persistence write.
    fn save(&self);

    /// Automation insert into a slot; returns what was refused.
    fn slot_insert(&mut self, slot: SlotKind, stack: ItemStack) -> Option<ItemStack>;

    /// Automation extract from a slot.
    fn slot_extract(&mut self, slot: SlotKind, amount: u64) -> Option<ItemStack>;

    fn has_capability(&mut self, kind: CapabilityKind, face: Face) -> bool;

    fn get_capability(&mut self, kind: CapabilityKind, face: Face) -> Option<CapabilityHandle>;

    /// Whether `source` may open the storage monitor.
    fn can_access(&self, source: &ActionSource) -> bool;

    /// Snapshot for broadcast.
    fn sync_record(&mut self) -> SyncRecord;

    fn needs_sync(&self) -> bool;
}
