//! Observer-side mirror of a host's sync record.

use crate::domain::{CellStatus, ItemKey, PaintColor, SyncRecord, Tick};
use crate::error::WireError;

/// What a remote observer knows about a device.
#[derive(Debug, Clone)]
pub struct ObserverMirror {
    record: SyncRecord,
    last_change: Tick,
    quiet_ticks: u64,
}

impl ObserverMirror {
    pub fn new(quiet_ticks: u64) -> Self {
        Self {
            record: SyncRecord::default(),
            last_change: 0,
            quiet_ticks,
        }
    }

    /// Applies a received record; returns whether the observer must redraw.
    pub fn apply(&mut self, bytes: &[u8], now: Tick) -> Result<bool, WireError> {
        let next = SyncRecord::decode(bytes)?;
        let redraw = next.needs_redraw(&self.record);
        self.record = next;
        self.last_change = now;
        Ok(redraw)
    }

    pub fn record(&self) -> &SyncRecord {
        &self.record
    }

    pub fn cell_status(&self, slot: usize) -> CellStatus {
        self.record.status.cell_status(slot)
    }

    pub fn is_powered(&self) -> bool {
        self.record.status.is_powered()
    }

    /// Blinks only within the quiet window after the last record.
    pub fn is_cell_blinking(&self, slot: usize, now: Tick) -> bool {
        if now.saturating_sub(self.last_change) > self.quiet_ticks {
            return false;
        }
        self.record.status.is_blinking(slot)
    }

    pub fn color(&self) -> PaintColor {
        self.record.color
    }

    /// Medium type to display; hidden while unpowered.
    pub fn storage_type(&self) -> Option<ItemKey> {
        if self.is_powered() {
            self.record.medium
        } else {
            None
        }
    }
}
