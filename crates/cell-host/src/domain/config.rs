//! Host configuration and validation
//!
//! Replaces the process-wide power multiplier and timing constants with an
//! explicit, read-only struct handed to the controller at construction.
//!
//! # Example
//!
//! ```ignore
//! use cell_host::domain::HostConfigBuilder;
//!
//! let config = HostConfigBuilder::new()
//!     .power_multiplier(2.0)
//!     .blink_quiet_ticks(8)
//!     .build()?;
//! ```

use super::entities::MAX_SLOT_STACK;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ENV_POWER_MULTIPLIER: &str = "CELL_HOST_POWER_MULTIPLIER";
pub const ENV_POWERED_THRESHOLD: &str = "CELL_HOST_POWERED_THRESHOLD";
pub const ENV_BLINK_QUIET_TICKS: &str = "CELL_HOST_BLINK_QUIET_TICKS";
pub const ENV_FLUID_POWER_DIVISOR: &str = "CELL_HOST_FLUID_POWER_DIVISOR";

/// Tunables of a single host device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Scales every configurable energy cost and the reserve size.
    pub power_multiplier: f64,
    /// Local reserve size before scaling.
    pub base_reserve_capacity: f64,
    /// Local reserve level above which the device counts as powered.
    pub powered_threshold: f64,
    /// Ticks after the last status change before blink bits go stale.
    pub blink_quiet_ticks: u64,
    /// Fluid units per unit of energy when filling.
    pub fluid_power_divisor: f64,
    /// Slack allowed when comparing simulated power against a fill cost.
    pub fill_tolerance: f64,
    /// Slack allowed when deciding whether idle billing was fully paid.
    pub idle_epsilon: f64,
    /// Capacity of the intake slot.
    pub slot_capacity: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            power_multiplier: 1.0,
            base_reserve_capacity: 40.0,
            powered_threshold: 1.0,
            blink_quiet_ticks: 8,
            fluid_power_divisor: 500.0,
            fill_tolerance: 0.01,
            idle_epsilon: 0.1,
            slot_capacity: MAX_SLOT_STACK,
        }
    }
}

impl HostConfig {
    /// Effective local reserve capacity.
    pub fn reserve_capacity(&self) -> f64 {
        self.base_reserve_capacity * self.power_multiplier
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.power_multiplier.is_finite() && self.power_multiplier > 0.0) {
            return Err(ConfigError::InvalidMultiplier(self.power_multiplier));
        }

        if !(self.base_reserve_capacity.is_finite() && self.base_reserve_capacity >= 0.0) {
            return Err(ConfigError::InvalidParameters(
                "base_reserve_capacity must be a non-negative number".to_string(),
            ));
        }

        if !(self.powered_threshold.is_finite() && self.powered_threshold >= 0.0) {
            return Err(ConfigError::InvalidParameters(
                "powered_threshold must be a non-negative number".to_string(),
            ));
        }

        if !(self.fluid_power_divisor.is_finite() && self.fluid_power_divisor > 0.0) {
            return Err(ConfigError::InvalidParameters(
                "fluid_power_divisor must be positive".to_string(),
            ));
        }

        if self.fill_tolerance < 0.0 || self.idle_epsilon < 0.0 {
            return Err(ConfigError::InvalidParameters(
                "tolerances cannot be negative".to_string(),
            ));
        }

        if self.slot_capacity == 0 {
            return Err(ConfigError::InvalidParameters(
                "slot_capacity cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads defaults overridden by `CELL_HOST_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HostConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<f64, _>(&lookup, ENV_POWER_MULTIPLIER)? {
            config.power_multiplier = v;
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, ENV_POWERED_THRESHOLD)? {
            config.powered_threshold = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, ENV_BLINK_QUIET_TICKS)? {
            config.blink_quiet_ticks = v;
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, ENV_FLUID_POWER_DIVISOR)? {
            config.fluid_power_divisor = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
        None => Ok(None),
    }
}

/// Fluent builder for [`HostConfig`]
#[derive(Default)]
pub struct HostConfigBuilder {
    power_multiplier: Option<f64>,
    base_reserve_capacity: Option<f64>,
    powered_threshold: Option<f64>,
    blink_quiet_ticks: Option<u64>,
    fluid_power_divisor: Option<f64>,
    slot_capacity: Option<u64>,
}

impl HostConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power_multiplier(mut self, multiplier: f64) -> Self {
        self.power_multiplier = Some(multiplier);
        self
    }

    pub fn base_reserve_capacity(mut self, capacity: f64) -> Self {
        self.base_reserve_capacity = Some(capacity);
        self
    }

    pub fn powered_threshold(mut self, threshold: f64) -> Self {
        self.powered_threshold = Some(threshold);
        self
    }

    pub fn blink_quiet_ticks(mut self, ticks: u64) -> Self {
        self.blink_quiet_ticks = Some(ticks);
        self
    }

    pub fn fluid_power_divisor(mut self, divisor: f64) -> Self {
        self.fluid_power_divisor = Some(divisor);
        self
    }

    pub fn slot_capacity(mut self, capacity: u64) -> Self {
        self.slot_capacity = Some(capacity);
        self
    }

    /// Build the config, validating all parameters
    pub fn build(self) -> Result<HostConfig, ConfigError> {
        let defaults = HostConfig::default();

        let config = HostConfig {
            power_multiplier: self.power_multiplier.unwrap_or(defaults.power_multiplier),
            base_reserve_capacity: self
                .base_reserve_capacity
                .unwrap_or(defaults.base_reserve_capacity),
            powered_threshold: self.powered_threshold.unwrap_or(defaults.powered_threshold),
            blink_quiet_ticks: self.blink_quiet_ticks.unwrap_or(defaults.blink_quiet_ticks),
            fluid_power_divisor: self
                .fluid_power_divisor
                .unwrap_or(defaults.fluid_power_divisor),
            slot_capacity: self.slot_capacity.unwrap_or(defaults.slot_capacity),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}
