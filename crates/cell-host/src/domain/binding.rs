//! Lazy binding of the inserted medium to driver handlers.
//!
//! The binding is keyed by `(medium stack, priority)`. Any access with a key
//! that differs from the one the binding was built for rebuilds it first, so
//! callers can never observe handlers of a medium that is no longer there.

use std::sync::Arc;

use tracing::debug;

use super::entities::{CellStatus, Channel, ItemStack};
use super::security::{AccessPolicy, SecuredInventory};
use crate::error::BindingError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{CellDriver, DriverRegistry};

/// Idle draw of the device itself, before any medium.
pub const BASE_IDLE_DRAW: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BindingKey {
    medium: Option<ItemStack>,
    priority: i32,
}

pub struct MediumBindingCache {
    registry: Arc<dyn DriverRegistry>,
    policy: Arc<dyn AccessPolicy>,
    key: Option<BindingKey>,
    driver: Option<Arc<dyn CellDriver>>,
    item: Option<SecuredInventory>,
    fluid: Option<SecuredInventory>,
    idle_draw: f64,
    rebinds: u64,
    metrics: Arc<dyn MetricsRecorder>,
}

impl MediumBindingCache {
    pub fn new(registry: Arc<dyn DriverRegistry>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            registry,
            policy,
            key: None,
            driver: None,
            item: None,
            fluid: None,
            idle_draw: BASE_IDLE_DRAW,
            rebinds: 0,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn set_metrics(&mut self, metrics: Arc<dyn MetricsRecorder>) {
        self.metrics = metrics;
    }

    /// Forces a rebuild on next access.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn is_valid_for(&self, medium: Option<&ItemStack>, priority: i32) -> bool {
        self.key
            == Some(BindingKey {
                medium: medium.copied(),
                priority,
            })
    }

    /// Makes sure the binding matches the current slot contents and priority.
    pub fn refresh(&mut self, medium: Option<&ItemStack>, priority: i32) {
        if self.is_valid_for(medium, priority) {
            return;
        }

        self.item = None;
        self.fluid = None;
        self.driver = None;
        self.idle_draw = BASE_IDLE_DRAW;

        let key = BindingKey {
            medium: medium.copied(),
            priority,
        };

        if let Some(stack) = medium.filter(|m| !m.is_empty()).copied() {
            if let Some(driver) = self.registry.resolve(&stack) {
                let item = driver.open(&stack, Channel::Items);
                let fluid = driver.open(&stack, Channel::Fluids);

                if let Some(handler) = item.as_ref().or(fluid.as_ref()) {
                    self.idle_draw += handler.idle_drain();
                }

                self.item = item.map(|h| SecuredInventory::new(h, priority, self.policy.clone()));
                self.fluid = fluid.map(|h| SecuredInventory::new(h, priority, self.policy.clone()));
                debug!(
                    "[cell-host] Bound medium {:?} via driver '{}' (items: {}, fluids: {})",
                    stack.key,
                    driver.name(),
                    self.item.is_some(),
                    self.fluid.is_some()
                );
                self.driver = Some(driver);
            } else {
                debug!("[cell-host] No driver for medium {:?}", stack.key);
            }
        }

        self.key = Some(key);
        self.rebinds += 1;
        self.metrics.record_rebind();
    }

    /// Wrapped handler for `channel`, rebinding first if stale.
    pub fn handler(
        &mut self,
        medium: Option<&ItemStack>,
        priority: i32,
        channel: Channel,
    ) -> Result<&mut SecuredInventory, BindingError> {
        self.refresh(medium, priority);
        let slot = match channel {
            Channel::Items => self.item.as_mut(),
            Channel::Fluids => self.fluid.as_mut(),
        };
        slot.ok_or(BindingError::NoHandler { channel })
    }

    /// Currently bound handler without rebinding.
    pub fn bound(&self, channel: Channel) -> Option<&SecuredInventory> {
        match channel {
            Channel::Items => self.item.as_ref(),
            Channel::Fluids => self.fluid.as_ref(),
        }
    }

    /// Driver status of the bound handler, items preferred.
    pub fn status(&self) -> CellStatus {
        self.item
            .as_ref()
            .or(self.fluid.as_ref())
            .map(|h| h.internal().status())
            .unwrap_or(CellStatus::Absent)
    }

    pub fn idle_draw(&self) -> f64 {
        self.idle_draw
    }

    pub fn driver(&self) -> Option<&Arc<dyn CellDriver>> {
        self.driver.as_ref()
    }

    /// Whether any channel handler is bound.
    pub fn has_binding(&self) -> bool {
        self.item.is_some() || self.fluid.is_some()
    }

    /// Number of times the binding has been rebuilt.
    pub fn rebinds(&self) -> u64 {
        self.rebinds
    }
}
