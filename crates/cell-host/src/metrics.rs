//! Metrics hooks for the cell host
//!
//! Counters for binding churn, activity blinks, permission denials,
//! committed transactions and sync broadcasts.
//!
//! ## Usage
//!
//! ```ignore
//! use cell_host::metrics::HostMetrics;
//!
//! let metrics = Arc::new(HostMetrics::new());
//! let chest = ChestController::new(context, config).with_metrics(metrics.clone());
//! // ... drive the device ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for a host device
#[derive(Default, Debug)]
pub struct HostMetrics {
    /// Times the medium binding was rebuilt
    pub rebinds: AtomicU64,
    /// Activity blinks triggered by committed transactions
    pub blinks: AtomicU64,
    /// Transactions refused by the access policy
    pub permission_denials: AtomicU64,
    /// Committed transactions that changed stored contents
    pub commits: AtomicU64,
    /// Sync records handed out for broadcast
    pub sync_broadcasts: AtomicU64,
}

impl HostMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rebinds: self.rebinds.load(Ordering::Relaxed),
            blinks: self.blinks.load(Ordering::Relaxed),
            permission_denials: self.permission_denials.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            sync_broadcasts: self.sync_broadcasts.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.rebinds.store(0, Ordering::Relaxed);
        self.blinks.store(0, Ordering::Relaxed);
        self.permission_denials.store(0, Ordering::Relaxed);
        self.commits.store(0, Ordering::Relaxed);
        self.sync_broadcasts.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rebinds: u64,
    pub blinks: u64,
    pub permission_denials: u64,
    pub commits: u64,
    pub sync_broadcasts: u64,
}

/// Trait for custom metrics recording implementations
pub trait MetricsRecorder: Send + Sync {
    fn record_rebind(&self);
    fn record_blink(&self);
    fn record_permission_denial(&self);
    fn record_commit(&self);
    fn record_sync_broadcast(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default, Debug)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_rebind(&self) {}
    fn record_blink(&self) {}
    fn record_permission_denial(&self) {}
    fn record_commit(&self) {}
    fn record_sync_broadcast(&self) {}
}

impl MetricsRecorder for HostMetrics {
    fn record_rebind(&self) {
        self.rebinds.fetch_add(1, Ordering::Relaxed);
    }

    fn record_blink(&self) {
        self.blinks.fetch_add(1, Ordering::Relaxed);
    }

    fn record_permission_denial(&self) {
        self.permission_denials.fetch_add(1, Ordering::Relaxed);
    }

    fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_sync_broadcast(&self) {
        self.sync_broadcasts.fetch_add(1, Ordering::Relaxed);
    }
}
