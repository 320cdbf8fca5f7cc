//! In-memory adapters for the network, environment and clock ports.
//!
//! Shared between the device and whoever drives it (tests, the simulation
//! binary), so every adapter is interior-mutable behind a `parking_lot`
//! mutex or atomics.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::domain::{
    ActionSource, Actionable, Channel, GridId, Permission, PlayerId, StorageDelta, Tick,
};
use crate::error::GridError;
use crate::ports::{DeviceEnvironment, GridEvent, GridPort, TickSource};

/// One storage alteration as seen by the network.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAlteration {
    pub channel: Channel,
    pub deltas: Vec<StorageDelta>,
    pub source: ActionSource,
}

#[derive(Debug)]
struct GridState {
    reachable: bool,
    active: bool,
    powered: bool,
    energy: f64,
    enforcing: bool,
    grants: HashSet<(PlayerId, Permission)>,
    alterations: Vec<RecordedAlteration>,
    events: Vec<GridEvent>,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            reachable: true,
            active: true,
            powered: false,
            energy: 0.0,
            enforcing: false,
            grants: HashSet::new(),
            alterations: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// Scriptable network.
///
/// Starts reachable and active, unpowered, with an empty energy store and
/// no enforcing security directory.
#[derive(Debug)]
pub struct InMemoryGrid {
    id: GridId,
    state: Mutex<GridState>,
}

impl Default for InMemoryGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGrid {
    pub fn new() -> Self {
        Self::with_id(GridId(1))
    }

    pub fn with_id(id: GridId) -> Self {
        Self {
            id,
            state: Mutex::new(GridState::default()),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    pub fn set_active(&self, active: bool) {
        self.state.lock().active = active;
    }

    pub fn set_powered(&self, powered: bool) {
        self.state.lock().powered = powered;
    }

    pub fn set_energy(&self, energy: f64) {
        self.state.lock().energy = energy;
    }

    pub fn energy(&self) -> f64 {
        self.state.lock().energy
    }

    pub fn set_enforcing(&self, enforcing: bool) {
        self.state.lock().enforcing = enforcing;
    }

    pub fn grant(&self, player: PlayerId, permission: Permission) {
        self.state.lock().grants.insert((player, permission));
    }

    pub fn revoke(&self, player: PlayerId, permission: Permission) {
        self.state.lock().grants.remove(&(player, permission));
    }

    pub fn alterations(&self) -> Vec<RecordedAlteration> {
        self.state.lock().alterations.clone()
    }

    pub fn events(&self) -> Vec<GridEvent> {
        self.state.lock().events.clone()
    }

    pub fn count_events(&self, event: GridEvent) -> usize {
        self.state.lock().events.iter().filter(|e| **e == event).count()
    }

    /// Clears recorded alterations and events.
    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.alterations.clear();
        state.events.clear();
    }

    fn reachable(state: &GridState) -> Result<(), GridError> {
        if state.reachable {
            Ok(())
        } else {
            Err(GridError::unreachable("grid offline"))
        }
    }
}

impl GridPort for InMemoryGrid {
    fn grid_id(&self) -> Option<GridId> {
        self.state.lock().reachable.then_some(self.id)
    }

    fn is_active(&self) -> bool {
        let state = self.state.lock();
        state.reachable && state.active
    }

    fn is_network_powered(&self) -> Result<bool, GridError> {
        let state = self.state.lock();
        Self::reachable(&state)?;
        Ok(state.powered)
    }

    fn extract_power(&self, amount: f64, mode: Actionable) -> Result<f64, GridError> {
        let mut state = self.state.lock();
        Self::reachable(&state)?;
        let obtained = amount.max(0.0).min(state.energy);
        if mode.is_commit() {
            state.energy -= obtained;
        }
        Ok(obtained)
    }

    fn has_permission(&self, player: PlayerId, permission: Permission) -> Result<bool, GridError> {
        let state = self.state.lock();
        Self::reachable(&state)?;
        if !state.enforcing {
            return Ok(true);
        }
        Ok(state.grants.contains(&(player, permission)))
    }

    fn post_alteration(
        &self,
        channel: Channel,
        deltas: &[StorageDelta],
        source: &ActionSource,
    ) -> Result<(), GridError> {
        let mut state = self.state.lock();
        Self::reachable(&state)?;
        state.alterations.push(RecordedAlteration {
            channel,
            deltas: deltas.to_vec(),
            source: *source,
        });
        Ok(())
    }

    fn post_event(&self, event: GridEvent) -> Result<(), GridError> {
        let mut state = self.state.lock();
        Self::reachable(&state)?;
        state.events.push(event);
        Ok(())
    }
}

/// Counts environment requests.
#[derive(Debug, Default)]
pub struct RecordingEnvironment {
    dirty: AtomicU64,
    syncs: AtomicU64,
    neighbor_updates: AtomicU64,
}

impl RecordingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirty_count(&self) -> u64 {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn sync_count(&self) -> u64 {
        self.syncs.load(Ordering::SeqCst)
    }

    pub fn neighbor_update_count(&self) -> u64 {
        self.neighbor_updates.load(Ordering::SeqCst)
    }
}

impl DeviceEnvironment for RecordingEnvironment {
    fn mark_dirty(&self) {
        self.dirty.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_sync(&self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_neighbors(&self) {
        self.neighbor_updates.fetch_add(1, Ordering::SeqCst);
    }
}

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(initial: Tick) -> Self {
        Self {
            now: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::SeqCst);
    }

    pub fn set(&self, tick: Tick) {
        self.now.store(tick, Ordering::SeqCst);
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Tick {
        self.now.load(Ordering::SeqCst)
    }
}
