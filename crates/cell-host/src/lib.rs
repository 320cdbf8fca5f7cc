//! # Cell Host
//!
//! A networked storage device that hosts one removable storage medium and
//! exposes its contents to a logistics grid.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//!
//! - **Domain Layer** (`domain/`): value types, binding cache, power gateway,
//!   security wrapper, status word and wire record
//! - **Ports Layer** (`ports/`): inbound API (`CellHostApi`) and outbound
//!   dependencies (`GridPort`, `DriverRegistry`, `DeviceEnvironment`,
//!   `TickSource`)
//! - **Service Layer** (`service/`): `ChestController`, the `BoundCell`
//!   transaction handle, and the fluid and monitor capability handles
//! - **Adapters Layer** (`adapters/`): in-memory grid, basic cell drivers and
//!   the observer mirror
//!
//! ## Invariants
//!
//! - The bound handler set is never stale: it is rebuilt whenever the
//!   medium or priority differs from the values it was built for
//! - Power is simulated before it is committed; a commit never draws more
//!   than the preceding simulation reported
//! - A player source without the required permission never reaches the
//!   underlying inventory
//! - Blink bits never trigger an observer redraw on their own
//! - Every committed transaction blinks slot 0, whoever started it
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cell_host::adapters::{BasicCellDriver, CellSpec, InMemoryGrid, ManualClock,
//!     RecordingEnvironment, StaticDriverRegistry};
//! use cell_host::{ChestController, HostConfig, HostContext};
//!
//! let driver = BasicCellDriver::new("basic").with_cell(1, CellSpec::items(1024, 63));
//! let context = HostContext::new(
//!     Arc::new(InMemoryGrid::new()),
//!     Arc::new(StaticDriverRegistry::new().with_driver(Arc::new(driver))),
//!     Arc::new(RecordingEnvironment::new()),
//!     Arc::new(ManualClock::new(0)),
//! );
//!
//! let mut chest = ChestController::new(context, HostConfig::default())?;
//! chest.tick();
//! let bytes = chest.sync_record().encode();
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    ActionSource, Actionable, CellStatus, Channel, ChannelStack, Face, FluidStack, HostConfig,
    HostConfigBuilder, ItemKey, ItemStack, PaintColor, Permission, StatusWord, SyncRecord,
};
pub use error::{BindingError, ConfigError, GridError, HostError, HostResult, WireError};
pub use metrics::{HostMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    CapabilityHandle, CapabilityKind, CellDriver, CellHostApi, CellInventory, DeviceEnvironment,
    DriverRegistry, GridEvent, GridPort, SlotKind, TickSource,
};
pub use service::{
    BoundCell, ChestController, FluidPort, HostContext, MonitorAccessor, PersistedState,
};
