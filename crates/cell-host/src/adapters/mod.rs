//! Adapters: reference implementations of the outbound ports and the
//! observer-side mirror.

pub mod driver;
pub mod memory;
pub mod observer;

pub use driver::{BasicCellDriver, BasicCellInventory, CellSpec, StaticDriverRegistry};
pub use memory::{InMemoryGrid, ManualClock, RecordedAlteration, RecordingEnvironment};
pub use observer::ObserverMirror;
