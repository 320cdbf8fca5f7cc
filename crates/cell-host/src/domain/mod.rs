//! Domain layer: value types and the pure building blocks of the host.

pub mod binding;
pub mod config;
pub mod entities;
pub mod intake;
pub mod power;
pub mod security;
pub mod status;
pub mod wire;

pub use binding::{MediumBindingCache, BASE_IDLE_DRAW};
pub use config::{HostConfig, HostConfigBuilder};
pub use entities::*;
pub use intake::{intake_accepts, medium_accepted, powered_insert, AutoIntakeRouter};
pub use power::{LocalReserve, PowerGateway, ReserveEvent};
pub use security::{
    AccessPolicy, AllowAll, GridAccessPolicy, IgnoreChanges, SecuredInventory, StorageListener,
};
pub use status::{StatusEncoder, StatusInputs, StatusWord, SLOT_COUNT};
pub use wire::SyncRecord;
