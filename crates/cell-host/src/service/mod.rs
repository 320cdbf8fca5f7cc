//! Service layer: the device controller and its capability handles.

pub mod bound;
pub mod capabilities;
pub mod controller;
pub mod fluid;
pub mod monitor;

pub use bound::BoundCell;
pub use capabilities::CapabilityTable;
pub use controller::{ChestController, HostContext, PersistedState};
pub use fluid::{FluidPort, TankProperties};
pub use monitor::{MonitorAccessor, StorageMonitor};
