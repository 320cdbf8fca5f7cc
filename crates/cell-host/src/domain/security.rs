//! Permission-checked wrapper around a bound channel handler.
//!
//! Only actors carrying a player credential are checked; machines and
//! anonymous automation pass straight through. A denied inject hands the
//! whole input back, a denied extract yields nothing.

use std::sync::Arc;

use tracing::{debug, warn};

use super::entities::{ActionSource, Actionable, Channel, ChannelStack, Permission, StorageDelta};
use crate::error::GridError;
use crate::ports::{CellInventory, GridPort};

/// Strategy deciding whether an actor may perform an operation.
pub trait AccessPolicy: Send + Sync {
    fn permits(&self, source: &ActionSource, permission: Permission) -> bool;
}

/// Permits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn permits(&self, _source: &ActionSource, _permission: Permission) -> bool {
        true
    }
}

/// Asks the grid's security directory.
///
/// A player is refused whenever the directory cannot be consulted.
pub struct GridAccessPolicy {
    grid: Arc<dyn GridPort>,
}

impl GridAccessPolicy {
    pub fn new(grid: Arc<dyn GridPort>) -> Self {
        Self { grid }
    }
}

impl AccessPolicy for GridAccessPolicy {
    fn permits(&self, source: &ActionSource, permission: Permission) -> bool {
        let Some(player) = source.player_id() else {
            return true;
        };

        match self.grid.has_permission(player, permission) {
            Ok(allowed) => allowed,
            Err(GridError::Unreachable(reason)) => {
                debug!(
                    "[cell-host] Security directory unreachable ({}), refusing {:?}",
                    reason, permission
                );
                false
            }
            Err(GridError::Rejected(reason)) => {
                debug!("[cell-host] Security lookup rejected: {}", reason);
                false
            }
        }
    }
}

/// Receives the outcome of wrapped transactions.
pub trait StorageListener {
    /// Contents changed by a committed transaction.
    fn on_change(&mut self, channel: Channel, deltas: &[StorageDelta], source: &ActionSource);

    fn on_denied(&mut self, _permission: Permission, _source: &ActionSource) {}
}

/// A listener that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreChanges;

impl StorageListener for IgnoreChanges {
    fn on_change(&mut self, _channel: Channel, _deltas: &[StorageDelta], _source: &ActionSource) {}
}

/// A bound handler plus the device priority and an access policy.
pub struct SecuredInventory {
    inner: Box<dyn CellInventory>,
    priority: i32,
    policy: Arc<dyn AccessPolicy>,
}

impl SecuredInventory {
    pub fn new(inner: Box<dyn CellInventory>, priority: i32, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            inner,
            priority,
            policy,
        }
    }

    pub fn channel(&self) -> Channel {
        self.inner.channel()
    }

    /// Routing precedence carried into the network.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The unwrapped driver handler.
    pub fn internal(&self) -> &dyn CellInventory {
        self.inner.as_ref()
    }

    pub fn available(&self) -> Vec<ChannelStack> {
        self.inner.available()
    }

    /// Returns what was not stored.
    pub fn inject(
        &mut self,
        stack: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
        listener: &mut dyn StorageListener,
    ) -> Option<ChannelStack> {
        if stack.amount == 0 {
            return None;
        }
        if !self.policy.permits(source, Permission::Inject) {
            warn!(
                "[cell-host] Inject denied for player {:?} on {:?}",
                source.player_id(),
                self.channel()
            );
            listener.on_denied(Permission::Inject, source);
            return Some(stack);
        }

        let remainder = self.inner.inject(stack, mode);
        let stored = stack.amount - remainder.map_or(0, |r| r.amount.min(stack.amount));
        if mode.is_commit() && stored > 0 {
            let delta = StorageDelta::added(&stack.with_amount(stored));
            listener.on_change(self.channel(), &[delta], source);
        }
        remainder
    }

    /// Returns what was obtained.
    pub fn extract(
        &mut self,
        request: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
        listener: &mut dyn StorageListener,
    ) -> Option<ChannelStack> {
        if !self.policy.permits(source, Permission::Extract) {
            warn!(
                "[cell-host] Extract denied for player {:?} on {:?}",
                source.player_id(),
                self.channel()
            );
            listener.on_denied(Permission::Extract, source);
            return None;
        }

        let obtained = self.inner.extract(request, mode)?;
        if mode.is_commit() && obtained.amount > 0 {
            listener.on_change(self.channel(), &[StorageDelta::removed(&obtained)], source);
        }
        Some(obtained)
    }
}
