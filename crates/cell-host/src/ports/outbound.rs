//! Outbound Ports (Driven Ports)
//!
//! Everything the host needs from the world around it: medium drivers, the
//! distribution network, the device environment and a tick clock.
//!
//! All network calls are fallible with [`GridError::Unreachable`]; callers
//! treat that as "network absent" and fall back to local-only behaviour.

use std::sync::Arc;

use crate::domain::{
    ActionSource, Actionable, CellStatus, Channel, ChannelStack, GridId, ItemStack, Permission,
    PlayerId, StorageDelta, Tick,
};
use crate::error::GridError;

/// A channel handler opened on a storage medium.
///
/// `inject` returns the part that did not fit (`None` when fully absorbed);
/// `extract` returns what was obtained (`None` when nothing). Neither may
/// mutate under [`Actionable::Simulate`].
pub trait CellInventory: Send {
    fn channel(&self) -> Channel;

    fn inject(&mut self, stack: ChannelStack, mode: Actionable) -> Option<ChannelStack>;

    fn extract(&mut self, request: ChannelStack, mode: Actionable) -> Option<ChannelStack>;

    /// Current contents.
    fn available(&self) -> Vec<ChannelStack>;

    /// Occupancy as reported by the driver.
    fn status(&self) -> CellStatus;

    /// Extra energy per tick this medium costs while bound.
    fn idle_drain(&self) -> f64;
}

/// Driver for one family of storage media.
pub trait CellDriver: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a handler for `channel`, or `None` if the medium has no such
    /// channel.
    fn open(&self, medium: &ItemStack, channel: Channel) -> Option<Box<dyn CellInventory>>;
}

/// Resolves a medium to the driver that opens at least one channel on it.
pub trait DriverRegistry: Send + Sync {
    fn resolve(&self, medium: &ItemStack) -> Option<Arc<dyn CellDriver>>;
}

/// Events the host posts to its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    /// The set of storage handlers this device contributes has changed.
    CellArrayUpdate,
    /// The local reserve wants charging.
    PowerStorageRequest,
}

/// Distribution network port.
pub trait GridPort: Send + Sync {
    /// Identity of the joined grid, if any.
    fn grid_id(&self) -> Option<GridId>;

    /// Whether the device's network node is up.
    fn is_active(&self) -> bool;

    fn is_network_powered(&self) -> Result<bool, GridError>;

    /// Draws energy from the network. Never mutates under `Simulate`.
    fn extract_power(&self, amount: f64, mode: Actionable) -> Result<f64, GridError>;

    /// Security directory lookup.
    fn has_permission(&self, player: PlayerId, permission: Permission) -> Result<bool, GridError>;

    /// Storage-alteration sink.
    fn post_alteration(
        &self,
        channel: Channel,
        deltas: &[StorageDelta],
        source: &ActionSource,
    ) -> Result<(), GridError>;

    fn post_event(&self, event: GridEvent) -> Result<(), GridError>;
}

/// A grid port for a device that is not joined to any network.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedGrid;

impl GridPort for DetachedGrid {
    fn grid_id(&self) -> Option<GridId> {
        None
    }

    fn is_active(&self) -> bool {
        false
    }

    fn is_network_powered(&self) -> Result<bool, GridError> {
        Err(GridError::unreachable("detached"))
    }

    fn extract_power(&self, _amount: f64, _mode: Actionable) -> Result<f64, GridError> {
        Err(GridError::unreachable("detached"))
    }

    fn has_permission(
        &self,
        _player: PlayerId,
        _permission: Permission,
    ) -> Result<bool, GridError> {
        Err(GridError::unreachable("detached"))
    }

    fn post_alteration(
        &self,
        _channel: Channel,
        _deltas: &[StorageDelta],
        _source: &ActionSource,
    ) -> Result<(), GridError> {
        Err(GridError::unreachable("detached"))
    }

    fn post_event(&self, _event: GridEvent) -> Result<(), GridError> {
        Err(GridError::unreachable("detached"))
    }
}

/// Hooks into whatever hosts the device (persistence, broadcast, adjacency).
pub trait DeviceEnvironment: Send + Sync {
    /// Persistence write wanted.
    fn mark_dirty(&self);

    /// Sync broadcast wanted.
    fn schedule_sync(&self);

    fn notify_neighbors(&self);
}

/// Source of the current tick.
pub trait TickSource: Send + Sync {
    fn now(&self) -> Tick;
}
