//! Core value types shared by every component of the host.
//!
//! ## Data Types
//!
//! - `ItemKey`: `(type_id, variant)` pair, packed as `(variant << 16) | type_id`
//!   on the wire
//! - `ItemStack`: slot contents (key + count); the stack signature used for
//!   binding validity is the whole value
//! - `ChannelStack`: a quantity travelling through a bound channel handler
//! - `ActionSource`: who is asking; only a player credential triggers
//!   permission checks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrete update tick (one call to `tick()` per tick).
pub type Tick = u64;

/// Largest stack a device slot will hold.
pub const MAX_SLOT_STACK: u64 = 64;

/// Transaction category a bound medium may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    Items,
    Fluids,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Items, Channel::Fluids];

    /// Units moved per unit of energy cost.
    pub fn transfer_factor(self) -> f64 {
        match self {
            Channel::Items => 1.0,
            Channel::Fluids => 1000.0,
        }
    }
}

/// Two-phase transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actionable {
    /// Probe only; never mutates.
    Simulate,
    /// Perform the operation.
    Commit,
}

impl Actionable {
    pub fn is_commit(self) -> bool {
        matches!(self, Actionable::Commit)
    }
}

/// Item identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub type_id: u16,
    pub variant: u16,
}

impl ItemKey {
    pub const fn new(type_id: u16, variant: u16) -> Self {
        Self { type_id, variant }
    }

    /// Packed identifier used by the sync record.
    ///
    /// Type id 0 is reserved: it would collide with the "empty" marker.
    pub fn wire_id(self) -> i32 {
        (((self.variant as u32) << 16) | self.type_id as u32) as i32
    }

    /// Inverse of [`ItemKey::wire_id`]; `0` decodes to `None`.
    pub fn from_wire_id(id: i32) -> Option<Self> {
        if id == 0 {
            return None;
        }
        let raw = id as u32;
        Some(Self {
            type_id: (raw & 0xffff) as u16,
            variant: (raw >> 16) as u16,
        })
    }
}

/// Contents of a device slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub key: ItemKey,
    pub count: u64,
}

impl ItemStack {
    pub fn new(key: ItemKey, count: u64) -> Self {
        Self { key, count }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn with_count(self, count: u64) -> Self {
        Self { count, ..self }
    }

    /// Same item identity, ignoring count.
    pub fn is_same_item(&self, other: &ItemStack) -> bool {
        self.key == other.key
    }
}

/// A fluid quantity (millibuckets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    pub fluid_id: u32,
    pub amount: u64,
}

impl FluidStack {
    pub fn new(fluid_id: u32, amount: u64) -> Self {
        Self { fluid_id, amount }
    }
}

/// Identity of something stored in a cell, independent of quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StackKey {
    Item(ItemKey),
    Fluid(u32),
}

impl StackKey {
    pub fn channel(self) -> Channel {
        match self {
            StackKey::Item(_) => Channel::Items,
            StackKey::Fluid(_) => Channel::Fluids,
        }
    }
}

/// A quantity moving through a channel handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelStack {
    pub key: StackKey,
    pub amount: u64,
}

impl ChannelStack {
    pub fn new(key: StackKey, amount: u64) -> Self {
        Self { key, amount }
    }

    pub fn item(key: ItemKey, amount: u64) -> Self {
        Self::new(StackKey::Item(key), amount)
    }

    pub fn fluid(fluid_id: u32, amount: u64) -> Self {
        Self::new(StackKey::Fluid(fluid_id), amount)
    }

    pub fn channel(&self) -> Channel {
        self.key.channel()
    }

    pub fn with_amount(self, amount: u64) -> Self {
        Self { amount, ..self }
    }

    /// Converts back into a slot stack; `None` for fluids.
    pub fn to_item_stack(self) -> Option<ItemStack> {
        match self.key {
            StackKey::Item(key) => Some(ItemStack::new(key, self.amount)),
            StackKey::Fluid(_) => None,
        }
    }
}

impl From<ItemStack> for ChannelStack {
    fn from(stack: ItemStack) -> Self {
        ChannelStack::item(stack.key, stack.count)
    }
}

impl From<FluidStack> for ChannelStack {
    fn from(stack: FluidStack) -> Self {
        ChannelStack::fluid(stack.fluid_id, stack.amount)
    }
}

/// Signed change in stored quantity, as broadcast to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDelta {
    pub key: StackKey,
    pub amount: i64,
}

impl StorageDelta {
    pub fn added(stack: &ChannelStack) -> Self {
        Self {
            key: stack.key,
            amount: stack.amount as i64,
        }
    }

    pub fn removed(stack: &ChannelStack) -> Self {
        Self {
            key: stack.key,
            amount: -(stack.amount as i64),
        }
    }
}

/// Painted color of the device. Ordinals follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PaintColor {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
    #[default]
    Transparent,
}

impl PaintColor {
    pub const ALL: [PaintColor; 17] = [
        PaintColor::White,
        PaintColor::Orange,
        PaintColor::Magenta,
        PaintColor::LightBlue,
        PaintColor::Yellow,
        PaintColor::Lime,
        PaintColor::Pink,
        PaintColor::Gray,
        PaintColor::LightGray,
        PaintColor::Cyan,
        PaintColor::Purple,
        PaintColor::Blue,
        PaintColor::Brown,
        PaintColor::Green,
        PaintColor::Red,
        PaintColor::Black,
        PaintColor::Transparent,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }
}

/// Adjacency face of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];
}

/// Player credential carried by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Identity of a grid (distribution network).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridId(pub u64);

/// Identity of a device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A machine acting on its own behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineRef {
    pub device: DeviceId,
    /// Grid the machine is joined to, if any.
    pub grid: Option<GridId>,
}

/// The requester of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionSource {
    player: Option<PlayerId>,
    machine: Option<MachineRef>,
}

impl ActionSource {
    pub fn player(player: PlayerId) -> Self {
        Self {
            player: Some(player),
            machine: None,
        }
    }

    pub fn machine(machine: MachineRef) -> Self {
        Self {
            player: None,
            machine: Some(machine),
        }
    }

    /// An anonymous automated source (no player, no machine).
    pub fn automation() -> Self {
        Self::default()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player
    }

    pub fn machine_ref(&self) -> Option<MachineRef> {
        self.machine
    }
}

/// Security directory permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Inject,
    Extract,
    Craft,
    Build,
    Security,
}

/// Driver-reported occupancy of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellStatus {
    /// No cell bound.
    #[default]
    Absent = 0,
    /// Room for new types.
    Available = 1,
    /// Type slots exhausted, quantity room left.
    TypesFull = 2,
    Full = 3,
}

impl CellStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code & 0b11 {
            1 => CellStatus::Available,
            2 => CellStatus::TypesFull,
            3 => CellStatus::Full,
            _ => CellStatus::Absent,
        }
    }
}

/// Terminal sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Name,
    Amount,
    ModName,
}

/// Which stacks a terminal view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewItems {
    #[default]
    All,
    Stored,
    Craftable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDir {
    #[default]
    Ascending,
    Descending,
}

/// View settings a terminal attached to the device remembers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalSettings {
    pub sort_by: SortOrder,
    pub view_mode: ViewItems,
    pub sort_direction: SortDir,
}
