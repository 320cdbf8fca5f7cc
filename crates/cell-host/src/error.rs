//! Error types for the cell host.
//!
//! None of these are fatal to the device. `BindingError` and `GridError` are
//! caught at their call sites and turned into "operation unavailable" or a
//! local-only fallback; `WireError` and `ConfigError` surface to whoever feeds
//! the device bad bytes or bad settings.

use crate::domain::Channel;
use thiserror::Error;

/// The medium binding has nothing to offer for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("No handler bound for channel {channel:?}")]
    NoHandler { channel: Channel },
}

/// Failures reported by the distribution network port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// The device is not joined to a reachable grid (transient).
    #[error("Grid unreachable: {0}")]
    Unreachable(String),

    /// The grid was reachable but refused the request.
    #[error("Grid rejected request: {0}")]
    Rejected(String),
}

impl GridError {
    /// Convenience constructor for the common "not joined" case.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Errors decoding a sync record on the observer side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("Sync record truncated: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("Invalid color ordinal: {0}")]
    InvalidColor(u8),
}

/// Configuration validation and loading errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Power multiplier must be positive and finite, got {0}")]
    InvalidMultiplier(f64),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidParameters(String),
}

/// Crate-level error wrapping every concern above.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Persisted state error: {0}")]
    Persistence(#[from] serde_json::Error),
}

/// Result alias for fallible host operations.
pub type HostResult<T> = Result<T, HostError>;
