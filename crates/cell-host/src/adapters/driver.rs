//! Reference medium driver.
//!
//! A basic cell has one channel, a unit capacity and a type limit. Contents
//! live in the driver keyed by the medium's identity, so they survive the
//! medium being unbound and rebound.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Actionable, CellStatus, Channel, ChannelStack, ItemKey, ItemStack, StackKey};
use crate::ports::{CellDriver, CellInventory, DriverRegistry};

type Contents = Arc<Mutex<BTreeMap<StackKey, u64>>>;

/// Shape of one kind of basic cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSpec {
    pub channel: Channel,
    pub capacity: u64,
    pub max_types: usize,
    pub idle_drain: f64,
}

impl CellSpec {
    pub fn items(capacity: u64, max_types: usize) -> Self {
        Self {
            channel: Channel::Items,
            capacity,
            max_types,
            idle_drain: 0.5,
        }
    }

    pub fn fluids(capacity: u64, max_types: usize) -> Self {
        Self {
            channel: Channel::Fluids,
            capacity,
            max_types,
            idle_drain: 0.5,
        }
    }

    pub fn with_idle_drain(self, idle_drain: f64) -> Self {
        Self { idle_drain, ..self }
    }
}

/// Handler over one basic cell's contents.
pub struct BasicCellInventory {
    spec: CellSpec,
    contents: Contents,
}

impl BasicCellInventory {
    /// A standalone cell not owned by any driver.
    pub fn detached(channel: Channel, capacity: u64, max_types: usize) -> Self {
        let spec = CellSpec {
            channel,
            capacity,
            max_types,
            idle_drain: 0.0,
        };
        Self {
            spec,
            contents: Arc::default(),
        }
    }

    fn total(contents: &BTreeMap<StackKey, u64>) -> u64 {
        contents.values().sum()
    }
}

impl CellInventory for BasicCellInventory {
    fn channel(&self) -> Channel {
        self.spec.channel
    }

    fn inject(&mut self, stack: ChannelStack, mode: Actionable) -> Option<ChannelStack> {
        if stack.channel() != self.spec.channel || stack.amount == 0 {
            return (stack.amount > 0).then_some(stack);
        }

        let mut contents = self.contents.lock();
        if !contents.contains_key(&stack.key) && contents.len() >= self.spec.max_types {
            return Some(stack);
        }

        let room = self.spec.capacity.saturating_sub(Self::total(&contents));
        let accepted = stack.amount.min(room);
        if mode.is_commit() && accepted > 0 {
            *contents.entry(stack.key).or_insert(0) += accepted;
        }

        let rest = stack.amount - accepted;
        (rest > 0).then(|| stack.with_amount(rest))
    }

    fn extract(&mut self, request: ChannelStack, mode: Actionable) -> Option<ChannelStack> {
        let mut contents = self.contents.lock();
        let stored = contents.get(&request.key).copied().unwrap_or(0);
        let taken = request.amount.min(stored);
        if taken == 0 {
            return None;
        }

        if mode.is_commit() {
            if taken == stored {
                contents.remove(&request.key);
            } else {
                contents.insert(request.key, stored - taken);
            }
        }
        Some(request.with_amount(taken))
    }

    fn available(&self) -> Vec<ChannelStack> {
        self.contents
            .lock()
            .iter()
            .map(|(key, amount)| ChannelStack::new(*key, *amount))
            .collect()
    }

    fn status(&self) -> CellStatus {
        let contents = self.contents.lock();
        if Self::total(&contents) >= self.spec.capacity {
            CellStatus::Full
        } else if contents.len() >= self.spec.max_types {
            CellStatus::TypesFull
        } else {
            CellStatus::Available
        }
    }

    fn idle_drain(&self) -> f64 {
        self.spec.idle_drain
    }
}

/// Driver for basic cells, keyed by medium type id.
pub struct BasicCellDriver {
    name: String,
    specs: HashMap<u16, CellSpec>,
    storage: Mutex<HashMap<ItemKey, Contents>>,
}

impl BasicCellDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specs: HashMap::new(),
            storage: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a medium type. Distinct variants of the same type are
    /// distinct cells.
    pub fn with_cell(mut self, type_id: u16, spec: CellSpec) -> Self {
        self.specs.insert(type_id, spec);
        self
    }

    /// Contents of a medium without binding it.
    pub fn contents_of(&self, medium: &ItemKey) -> Vec<ChannelStack> {
        self.storage
            .lock()
            .get(medium)
            .map(|contents| {
                contents
                    .lock()
                    .iter()
                    .map(|(key, amount)| ChannelStack::new(*key, *amount))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl CellDriver for BasicCellDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, medium: &ItemStack, channel: Channel) -> Option<Box<dyn CellInventory>> {
        if medium.is_empty() {
            return None;
        }
        let spec = *self.specs.get(&medium.key.type_id)?;
        if spec.channel != channel {
            return None;
        }

        let contents = self
            .storage
            .lock()
            .entry(medium.key)
            .or_default()
            .clone();
        Some(Box::new(BasicCellInventory { spec, contents }))
    }
}

/// Fixed list of drivers; the first one that opens a channel wins.
#[derive(Default)]
pub struct StaticDriverRegistry {
    drivers: Vec<Arc<dyn CellDriver>>,
}

impl StaticDriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_driver(mut self, driver: Arc<dyn CellDriver>) -> Self {
        self.drivers.push(driver);
        self
    }
}

impl DriverRegistry for StaticDriverRegistry {
    fn resolve(&self, medium: &ItemStack) -> Option<Arc<dyn CellDriver>> {
        self.drivers
            .iter()
            .find(|driver| {
                Channel::ALL
                    .iter()
                    .any(|channel| driver.open(medium, *channel).is_some())
            })
            .cloned()
    }
}
