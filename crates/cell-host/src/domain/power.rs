//! Two-phase energy accounting.
//!
//! Energy comes from the network first and from the device's local reserve
//! second. `Simulate` answers "how much could I get" without touching either
//! store; `Commit` actually withdraws.
//!
//! | Mode       | Network                | Local reserve              |
//! |------------|------------------------|----------------------------|
//! | `Simulate` | probe (if reachable)   | `min(current, shortfall)`  |
//! | `Commit`   | withdraw (if reachable)| withdraw the shortfall     |

use std::sync::Arc;

use tracing::debug;

use super::entities::Actionable;
use crate::ports::GridPort;

/// Below this the reserve counts as empty, and within this of capacity as full.
const RESERVE_EPSILON: f64 = 0.001;

/// Transitions of the local reserve the owner must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveEvent {
    /// The reserve left the full state and wants charging.
    RequestPower,
    /// The reserve became empty or stopped being empty.
    LevelChanged,
}

/// The device's internal energy buffer.
#[derive(Debug, Clone)]
pub struct LocalReserve {
    current: f64,
    capacity: f64,
    events: Vec<ReserveEvent>,
}

impl LocalReserve {
    /// An empty reserve.
    pub fn new(capacity: f64) -> Self {
        Self {
            current: 0.0,
            capacity: capacity.max(0.0),
            events: Vec::new(),
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.capacity - RESERVE_EPSILON
    }

    pub fn extract(&mut self, amount: f64, mode: Actionable) -> f64 {
        let amount = amount.max(0.0);
        let obtained = amount.min(self.current);
        if !mode.is_commit() {
            return obtained;
        }

        if self.is_full() && amount > RESERVE_EPSILON {
            self.events.push(ReserveEvent::RequestPower);
        }

        let was_empty = self.current < RESERVE_EPSILON;
        self.current -= obtained;
        if self.current < RESERVE_EPSILON {
            self.current = 0.0;
            if !was_empty {
                self.events.push(ReserveEvent::LevelChanged);
            }
        }
        obtained
    }

    /// Charges the reserve, returning the overflow.
    pub fn inject(&mut self, amount: f64, mode: Actionable) -> f64 {
        let amount = amount.max(0.0);
        let accepted = amount.min(self.capacity - self.current).max(0.0);
        if mode.is_commit() && accepted > 0.0 {
            let was_empty = self.current < RESERVE_EPSILON;
            self.current += accepted;
            if was_empty && self.current >= RESERVE_EPSILON {
                self.events.push(ReserveEvent::LevelChanged);
            }
        }
        amount - accepted
    }

    /// Drains pending transition events.
    pub fn take_events(&mut self) -> Vec<ReserveEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Network-first energy source with local fallback.
pub struct PowerGateway {
    grid: Arc<dyn GridPort>,
    reserve: LocalReserve,
    multiplier: f64,
}

impl PowerGateway {
    pub fn new(grid: Arc<dyn GridPort>, reserve: LocalReserve, multiplier: f64) -> Self {
        Self {
            grid,
            reserve,
            multiplier,
        }
    }

    pub fn reserve(&self) -> &LocalReserve {
        &self.reserve
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Obtains up to `amount`, network first.
    pub fn extract(&mut self, amount: f64, mode: Actionable) -> f64 {
        let amount = amount.max(0.0);
        let from_grid = match self.grid.extract_power(amount, mode) {
            Ok(obtained) => obtained.clamp(0.0, amount),
            Err(e) => {
                debug!("[cell-host] Network energy unavailable: {}", e);
                0.0
            }
        };

        if from_grid >= amount {
            return from_grid;
        }
        from_grid + self.reserve.extract(amount - from_grid, mode)
    }

    /// [`PowerGateway::extract`] for a configurable cost, in unscaled units.
    pub fn extract_scaled(&mut self, amount: f64, mode: Actionable) -> f64 {
        self.extract(amount * self.multiplier, mode) / self.multiplier
    }

    /// Charges the local reserve, returning the overflow.
    pub fn inject(&mut self, amount: f64, mode: Actionable) -> f64 {
        self.reserve.inject(amount, mode)
    }

    pub fn take_events(&mut self) -> Vec<ReserveEvent> {
        self.reserve.take_events()
    }
}
