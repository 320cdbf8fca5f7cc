//! Intake routing and slot filters.

use tracing::debug;

use super::entities::{ActionSource, Actionable, ChannelStack, ItemStack};
use super::power::PowerGateway;
use super::security::{SecuredInventory, StorageListener};
use crate::ports::DriverRegistry;

/// Rounding slack when converting purchasable energy into whole units.
const ADMIT_ROUNDING: f64 = 0.9;

/// Stores `input` paying for it with energy.
///
/// Simulates the inject to learn what fits, prices that, then admits as many
/// units as the simulated power affords. Returns what was not stored.
pub fn powered_insert(
    power: &mut PowerGateway,
    inventory: &mut SecuredInventory,
    input: ChannelStack,
    source: &ActionSource,
    listener: &mut dyn StorageListener,
) -> Option<ChannelStack> {
    if input.amount == 0 {
        return None;
    }

    let rejected = inventory.inject(input, Actionable::Simulate, source, listener);
    let storable = input.amount - rejected.map_or(0, |r| r.amount.min(input.amount));
    if storable == 0 {
        return Some(input);
    }

    let factor = input.channel().transfer_factor();
    let cost = (storable as f64).max(1.0) / factor;
    let affordable = power.extract_scaled(cost, Actionable::Simulate);
    let admitted = ((affordable * factor + ADMIT_ROUNDING).floor() as u64).min(storable);
    if admitted == 0 {
        debug!("[cell-host] Insert of {} units unaffordable", storable);
        return Some(input);
    }

    power.extract_scaled(admitted as f64 / factor, Actionable::Commit);
    let rest = inventory.inject(input.with_amount(admitted), Actionable::Commit, source, listener);

    let remainder = input.amount - admitted + rest.map_or(0, |r| r.amount);
    (remainder > 0).then(|| input.with_amount(remainder))
}

/// Drains the intake slot into the bound item handler.
pub struct AutoIntakeRouter;

impl AutoIntakeRouter {
    /// Returns `true` if the slot contents changed.
    pub fn try_store(
        intake: &mut Option<ItemStack>,
        inventory: Option<&mut SecuredInventory>,
        power: &mut PowerGateway,
        source: &ActionSource,
        listener: &mut dyn StorageListener,
    ) -> bool {
        let Some(stack) = intake.filter(|s| !s.is_empty()) else {
            return false;
        };
        let Some(inventory) = inventory else {
            return false;
        };

        let remainder = powered_insert(power, inventory, stack.into(), source, listener);
        let next = remainder.and_then(ChannelStack::to_item_stack);
        let changed = next != Some(stack);
        *intake = next;
        changed
    }
}

/// Whether automation may place `stack` into the intake slot.
pub fn intake_accepts(
    powered: bool,
    inventory: Option<&mut SecuredInventory>,
    stack: &ItemStack,
    source: &ActionSource,
    listener: &mut dyn StorageListener,
) -> bool {
    if !powered || stack.is_empty() {
        return false;
    }
    let Some(inventory) = inventory else {
        return false;
    };
    let input = ChannelStack::from(*stack);
    match inventory.inject(input, Actionable::Simulate, source, listener) {
        None => true,
        Some(rest) => rest.amount < input.amount,
    }
}

/// Whether some driver yields an item or fluid handler for `medium`.
pub fn medium_accepted(registry: &dyn DriverRegistry, medium: &ItemStack) -> bool {
    if medium.is_empty() {
        return false;
    }
    registry.resolve(medium).is_some()
}
