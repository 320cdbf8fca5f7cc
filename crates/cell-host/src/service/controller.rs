//! Chest controller
//!
//! Owns all device state and coordinates the binding cache, power gateway,
//! security wrapper, status encoder and intake router.
//!
//! Every network call is fallible; failures are logged at debug level and
//! the device carries on with local-only behaviour.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{
    intake_accepts, medium_accepted, AccessPolicy, ActionSource, Actionable, AutoIntakeRouter,
    CellStatus, Channel, ChannelStack, DeviceId, Face, FluidStack, GridAccessPolicy, HostConfig,
    IgnoreChanges, ItemKey, ItemStack, LocalReserve, MachineRef, MediumBindingCache, PaintColor,
    Permission, PowerGateway, ReserveEvent, StatusEncoder, StatusInputs,
    StorageDelta, StorageListener, SyncRecord, TerminalSettings, Tick, SLOT_COUNT,
};
use crate::error::{BindingError, ConfigError, HostResult, WireError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{
    CapabilityHandle, CapabilityKind, CellHostApi, DeviceEnvironment, DriverRegistry, GridEvent,
    GridPort, SlotKind, TickSource,
};

use super::bound::BoundCell;
use super::capabilities::CapabilityTable;

/// Stack limit of the medium slot.
const MEDIUM_SLOT_LIMIT: u64 = 1;

/// Outbound collaborators handed to the device at construction.
#[derive(Clone)]
pub struct HostContext {
    pub grid: Arc<dyn GridPort>,
    pub registry: Arc<dyn DriverRegistry>,
    pub environment: Arc<dyn DeviceEnvironment>,
    pub clock: Arc<dyn TickSource>,
}

impl HostContext {
    pub fn new(
        grid: Arc<dyn GridPort>,
        registry: Arc<dyn DriverRegistry>,
        environment: Arc<dyn DeviceEnvironment>,
        clock: Arc<dyn TickSource>,
    ) -> Self {
        Self {
            grid,
            registry,
            environment,
            clock,
        }
    }
}

/// Fields that survive a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub priority: i32,
    #[serde(rename = "paintedColor", default, skip_serializing_if = "Option::is_none")]
    pub painted_color: Option<u8>,
    #[serde(default)]
    pub settings: TerminalSettings,
}

/// Forwards committed changes to the grid and remembers that a blink is due.
struct ChestNotifier {
    grid: Arc<dyn GridPort>,
    metrics: Arc<dyn MetricsRecorder>,
    origin: ActionSource,
    changed: bool,
}

impl StorageListener for ChestNotifier {
    fn on_change(&mut self, channel: Channel, deltas: &[StorageDelta], _source: &ActionSource) {
        self.changed = true;
        self.metrics.record_commit();

        if self.grid.is_active() {
            if let Err(e) = self.grid.post_alteration(channel, deltas, &self.origin) {
                debug!("[cell-host] Storage alteration dropped: {}", e);
            }
        }
    }

    fn on_denied(&mut self, _permission: Permission, _source: &ActionSource) {
        self.metrics.record_permission_denial();
    }
}

/// The storage-cell host device.
pub struct ChestController {
    id: DeviceId,
    config: HostConfig,
    context: HostContext,
    forward: Face,
    intake: Option<ItemStack>,
    medium: Option<ItemStack>,
    priority: i32,
    color: PaintColor,
    settings: TerminalSettings,
    binding: MediumBindingCache,
    power: PowerGateway,
    status: StatusEncoder,
    was_active: bool,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ChestController {
    pub fn new(context: HostContext, config: HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let policy: Arc<dyn AccessPolicy> = Arc::new(GridAccessPolicy::new(context.grid.clone()));
        let binding = MediumBindingCache::new(context.registry.clone(), policy);
        let power = PowerGateway::new(
            context.grid.clone(),
            LocalReserve::new(config.reserve_capacity()),
            config.power_multiplier,
        );
        let id = DeviceId::new();

        info!(
            "[cell-host] Device {} created (reserve capacity {}, multiplier {})",
            id.0,
            config.reserve_capacity(),
            config.power_multiplier
        );

        Ok(Self {
            id,
            status: StatusEncoder::new(config.blink_quiet_ticks),
            config,
            context,
            forward: Face::North,
            intake: None,
            medium: None,
            priority: 0,
            color: PaintColor::default(),
            settings: TerminalSettings::default(),
            binding,
            power,
            was_active: false,
            metrics: Arc::new(NoOpMetrics),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.binding.set_metrics(metrics.clone());
        self.metrics = metrics;
        self
    }

    pub fn with_forward(mut self, forward: Face) -> Self {
        self.forward = forward;
        self
    }

    /// Replaces the grid-backed permission check.
    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        let mut binding = MediumBindingCache::new(self.context.registry.clone(), policy);
        binding.set_metrics(self.metrics.clone());
        self.binding = binding;
        self
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn forward(&self) -> Face {
        self.forward
    }

    pub fn intake(&self) -> Option<ItemStack> {
        self.intake
    }

    pub fn medium(&self) -> Option<ItemStack> {
        self.medium
    }

    pub fn color(&self) -> PaintColor {
        self.color
    }

    pub fn settings(&self) -> TerminalSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: TerminalSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.context.environment.mark_dirty();
        }
    }

    pub fn reserve_level(&self) -> f64 {
        self.power.reserve().current()
    }

    pub fn binding_rebinds(&self) -> u64 {
        self.binding.rebinds()
    }

    /// The device acting on its own behalf.
    pub fn action_source(&self) -> ActionSource {
        ActionSource::machine(MachineRef {
            device: self.id,
            grid: self.context.grid.grid_id(),
        })
    }

    fn now(&self) -> Tick {
        self.context.clock.now()
    }

    fn notifier(&self) -> ChestNotifier {
        ChestNotifier {
            grid: self.context.grid.clone(),
            metrics: self.metrics.clone(),
            origin: self.action_source(),
            changed: false,
        }
    }

    fn post_event(&self, event: GridEvent) {
        if let Err(e) = self.context.grid.post_event(event) {
            debug!("[cell-host] Dropped {:?}: {}", event, e);
        }
    }

    fn refresh_binding(&mut self) {
        self.binding.refresh(self.medium.as_ref(), self.priority);
    }

    fn status_inputs(&mut self) -> StatusInputs {
        self.refresh_binding();
        StatusInputs {
            cells: [self.binding.status(); SLOT_COUNT],
            powered: self.is_powered(),
        }
    }

    fn mark_for_update(&mut self) {
        self.status.mark_dirty();
        self.context.environment.schedule_sync();
    }

    // ------------------------------------------------------------------
    // Power and status
    // ------------------------------------------------------------------

    /// Local reserve above the threshold, or a powered network.
    pub fn is_powered(&self) -> bool {
        if self.power.reserve().current() > self.config.powered_threshold {
            return true;
        }
        matches!(self.context.grid.is_network_powered(), Ok(true))
    }

    pub fn cell_status(&mut self, slot: usize) -> CellStatus {
        if slot >= SLOT_COUNT {
            return CellStatus::Absent;
        }
        self.refresh_binding();
        self.binding.status()
    }

    pub fn is_cell_blinking(&self, slot: usize) -> bool {
        let quiet = self.now().saturating_sub(self.status.last_change()) > self.config.blink_quiet_ticks;
        !quiet && self.status.word().is_blinking(slot)
    }

    /// Medium identity, visible only while powered.
    pub fn storage_type(&self) -> Option<ItemKey> {
        if self.is_powered() {
            self.medium.map(|m| m.key)
        } else {
            None
        }
    }

    /// Recomputes the status word and tracks network activity.
    pub fn recalculate_display(&mut self) {
        let now = self.now();
        let inputs = self.status_inputs();
        let changed = self.status.recompute(now, &inputs);
        self.track_activity();

        if changed {
            debug!(
                "[cell-host] Status word now {:#04x}",
                self.status.word().bits()
            );
            self.context.environment.schedule_sync();
        }
    }

    fn track_activity(&mut self) {
        let active = self.context.grid.is_active();
        if active != self.was_active {
            self.was_active = active;
            self.post_event(GridEvent::CellArrayUpdate);
        }
    }

    /// Flags activity on `slot`.
    pub fn blink(&mut self, slot: usize) {
        if slot >= SLOT_COUNT {
            return;
        }
        let now = self.now();
        let inputs = self.status_inputs();
        let changed = self.status.blink(slot, now, &inputs);
        self.metrics.record_blink();
        self.track_activity();

        if changed {
            self.context.environment.schedule_sync();
        }
    }

    /// Charges the local reserve; returns the overflow.
    pub fn inject_power(&mut self, amount: f64, mode: Actionable) -> f64 {
        let overflow = self.power.inject(amount, mode);
        self.handle_reserve_events();
        overflow
    }

    fn handle_reserve_events(&mut self) {
        for event in self.power.take_events() {
            match event {
                ReserveEvent::RequestPower => self.post_event(GridEvent::PowerStorageRequest),
                ReserveEvent::LevelChanged => self.recalculate_display(),
            }
        }
    }

    pub fn on_power_status_change(&mut self) {
        self.recalculate_display();
    }

    pub fn on_channels_changed(&mut self) {
        self.recalculate_display();
    }

    // ------------------------------------------------------------------
    // Tick and intake
    // ------------------------------------------------------------------

    pub fn tick(&mut self) {
        self.refresh_binding();
        let idle = self.binding.idle_draw();

        let network_powered = matches!(self.context.grid.is_network_powered(), Ok(true));
        if !network_powered {
            let billed = self.power.extract_scaled(idle, Actionable::Commit);
            let paid = billed + self.config.idle_epsilon >= idle;
            if paid != self.status.word().is_powered() {
                self.recalculate_display();
            }
        }

        self.handle_reserve_events();
        self.try_store();
    }

    /// Moves the intake slot into the bound medium as far as power allows.
    pub fn try_store(&mut self) {
        if !self.intake.is_some_and(|s| !s.is_empty()) {
            return;
        }

        let source = self.action_source();
        let mut notifier = self.notifier();
        let handler = self
            .binding
            .handler(self.medium.as_ref(), self.priority, Channel::Items)
            .ok();
        let moved = AutoIntakeRouter::try_store(
            &mut self.intake,
            handler,
            &mut self.power,
            &source,
            &mut notifier,
        );

        if moved {
            self.context.environment.mark_dirty();
        }
        self.finish_transaction(notifier);
    }

    fn finish_transaction(&mut self, notifier: ChestNotifier) {
        if notifier.changed {
            self.blink(0);
            self.context.environment.mark_dirty();
        }
        self.handle_reserve_events();
    }

    /// Owner-side replacement of the intake slot.
    pub fn set_intake(&mut self, stack: Option<ItemStack>) {
        self.intake = stack.filter(|s| !s.is_empty());
        self.context.environment.mark_dirty();
        self.try_store();
    }

    fn insert_intake(&mut self, stack: ItemStack) -> Option<ItemStack> {
        let source = self.action_source();
        let powered = self.is_powered();
        let handler = self
            .binding
            .handler(self.medium.as_ref(), self.priority, Channel::Items)
            .ok();
        if !intake_accepts(powered, handler, &stack, &source, &mut IgnoreChanges) {
            return Some(stack);
        }

        let held = match self.intake {
            Some(current) if !current.is_same_item(&stack) => return Some(stack),
            Some(current) => current.count,
            None => 0,
        };
        let moved = stack.count.min(self.config.slot_capacity.saturating_sub(held));
        if moved == 0 {
            return Some(stack);
        }

        self.intake = Some(stack.with_count(held + moved));
        self.context.environment.mark_dirty();
        self.try_store();

        let rest = stack.count - moved;
        (rest > 0).then(|| stack.with_count(rest))
    }

    // ------------------------------------------------------------------
    // Medium slot
    // ------------------------------------------------------------------

    /// Replaces the medium, rebinding and announcing the content change.
    pub fn set_medium(&mut self, medium: Option<ItemStack>) {
        let medium = medium.filter(|m| !m.is_empty());
        if medium == self.medium {
            return;
        }

        self.refresh_binding();
        let removed = self.bound_contents();

        self.medium = medium;
        self.binding.invalidate();
        self.post_event(GridEvent::CellArrayUpdate);

        self.refresh_binding();
        let added = self.bound_contents();
        self.post_content_diff(&removed, &added);

        match medium {
            Some(m) => info!("[cell-host] Medium {:?} inserted", m.key),
            None => info!("[cell-host] Medium removed"),
        }

        self.context.environment.notify_neighbors();
        self.context.environment.mark_dirty();
        self.mark_for_update();
        self.recalculate_display();
    }

    /// Takes the medium out of its slot.
    pub fn take_medium(&mut self) -> Option<ItemStack> {
        let taken = self.medium;
        if taken.is_some() {
            self.set_medium(None);
        }
        taken
    }

    fn insert_medium(&mut self, stack: ItemStack) -> Option<ItemStack> {
        if self.medium.is_some() || !medium_accepted(self.context.registry.as_ref(), &stack) {
            return Some(stack);
        }

        self.set_medium(Some(stack.with_count(MEDIUM_SLOT_LIMIT)));
        let rest = stack.count - MEDIUM_SLOT_LIMIT;
        (rest > 0).then(|| stack.with_count(rest))
    }

    fn bound_contents(&self) -> Vec<(Channel, Vec<ChannelStack>)> {
        Channel::ALL
            .iter()
            .filter_map(|channel| {
                self.binding
                    .bound(*channel)
                    .map(|handler| (*channel, handler.available()))
            })
            .collect()
    }

    fn post_content_diff(
        &self,
        removed: &[(Channel, Vec<ChannelStack>)],
        added: &[(Channel, Vec<ChannelStack>)],
    ) {
        let origin = self.action_source();
        for channel in Channel::ALL {
            let deltas: Vec<StorageDelta> = removed
                .iter()
                .filter(|(c, _)| *c == channel)
                .flat_map(|(_, stacks)| stacks.iter().map(StorageDelta::removed))
                .chain(
                    added
                        .iter()
                        .filter(|(c, _)| *c == channel)
                        .flat_map(|(_, stacks)| stacks.iter().map(StorageDelta::added)),
                )
                .collect();

            if deltas.is_empty() {
                continue;
            }
            if let Err(e) = self.context.grid.post_alteration(channel, &deltas, &origin) {
                debug!("[cell-host] Medium swap diff dropped: {}", e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Injects through the security wrapper; returns what was not stored.
    pub fn inject(
        &mut self,
        stack: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Result<Option<ChannelStack>, BindingError> {
        let mut notifier = self.notifier();
        let handler = self
            .binding
            .handler(self.medium.as_ref(), self.priority, stack.channel())?;
        let rest = handler.inject(stack, mode, source, &mut notifier);
        self.finish_transaction(notifier);
        Ok(rest)
    }

    /// Extracts through the security wrapper; returns what was obtained.
    pub fn extract(
        &mut self,
        request: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Result<Option<ChannelStack>, BindingError> {
        let mut notifier = self.notifier();
        let handler = self
            .binding
            .handler(self.medium.as_ref(), self.priority, request.channel())?;
        let obtained = handler.extract(request, mode, source, &mut notifier);
        self.finish_transaction(notifier);
        Ok(obtained)
    }

    pub fn available(&mut self, channel: Channel) -> Result<Vec<ChannelStack>, BindingError> {
        let handler = self
            .binding
            .handler(self.medium.as_ref(), self.priority, channel)?;
        Ok(handler.available())
    }

    /// Transaction handle for the bound `channel`, rebinding if needed.
    pub fn handler(&mut self, channel: Channel) -> Result<BoundCell<'_>, BindingError> {
        let priority = self
            .binding
            .handler(self.medium.as_ref(), self.priority, channel)?
            .priority();
        Ok(BoundCell::new(self, channel, priority))
    }

    /// The device's contribution to network storage.
    pub fn cell_array(&mut self, channel: Channel) -> Option<BoundCell<'_>> {
        if !self.context.grid.is_active() {
            return None;
        }
        self.handler(channel).ok()
    }

    /// Fills from a fluid source, paying energy per unit.
    pub(crate) fn fill_fluid(&mut self, fluid: FluidStack, do_fill: bool) -> u64 {
        if fluid.amount == 0 {
            return 0;
        }

        let required = fluid.amount as f64 / self.config.fluid_power_divisor;
        let affordable = self.power.extract_scaled(required, Actionable::Simulate);
        if affordable < required - self.config.fill_tolerance {
            return 0;
        }

        let source = self.action_source();
        let mut notifier = self.notifier();
        let Ok(handler) = self
            .binding
            .handler(self.medium.as_ref(), self.priority, Channel::Fluids)
        else {
            return 0;
        };

        let mode = if do_fill {
            self.power.extract_scaled(required, Actionable::Commit);
            Actionable::Commit
        } else {
            Actionable::Simulate
        };

        let rest = handler.inject(ChannelStack::from(fluid), mode, &source, &mut notifier);
        let filled = fluid.amount - rest.map_or(0, |r| r.amount.min(fluid.amount));
        self.finish_transaction(notifier);
        filled
    }

    // ------------------------------------------------------------------
    // Configuration, persistence, sync
    // ------------------------------------------------------------------

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
        self.binding.invalidate();
        self.post_event(GridEvent::CellArrayUpdate);
        self.context.environment.mark_dirty();
    }

    pub fn recolor(&mut self, color: PaintColor) -> bool {
        if self.color == color {
            return false;
        }
        self.color = color;
        self.context.environment.mark_dirty();
        self.mark_for_update();
        true
    }

    pub fn save(&self) {
        self.context.environment.mark_dirty();
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            priority: self.priority,
            painted_color: Some(self.color.ordinal()),
            settings: self.settings,
        }
    }

    /// Applies a saved state. A missing color restores `Transparent`.
    pub fn restore(&mut self, state: PersistedState) -> HostResult<()> {
        let color = match state.painted_color {
            Some(ordinal) => PaintColor::from_ordinal(ordinal).ok_or(WireError::InvalidColor(ordinal))?,
            None => PaintColor::Transparent,
        };

        self.priority = state.priority;
        self.color = color;
        self.settings = state.settings;
        self.binding.invalidate();
        self.mark_for_update();
        Ok(())
    }

    pub fn save_json(&self) -> HostResult<String> {
        Ok(serde_json::to_string(&self.persisted_state())?)
    }

    pub fn restore_json(&mut self, json: &str) -> HostResult<()> {
        let state: PersistedState = serde_json::from_str(json)?;
        self.restore(state)
    }

    /// Encodes the broadcast record, refreshing the word first.
    pub fn sync_record(&mut self) -> SyncRecord {
        let now = self.now();
        let inputs = self.status_inputs();
        let status = self.status.refresh_for_encode(now, &inputs);
        self.status.take_dirty();
        self.metrics.record_sync_broadcast();

        SyncRecord {
            status,
            color: self.color,
            medium: self.medium.map(|m| m.key),
        }
    }

    pub fn needs_sync(&self) -> bool {
        self.status.is_dirty()
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    pub fn capabilities(&mut self) -> CapabilityTable {
        self.refresh_binding();
        CapabilityTable::build(
            self.forward,
            self.binding.bound(Channel::Fluids).is_some(),
            self.binding.has_binding(),
        )
    }

    pub fn has_capability(&mut self, kind: CapabilityKind, face: Face) -> bool {
        self.capabilities().contains(kind, face)
    }

    pub fn get_capability(&mut self, kind: CapabilityKind, face: Face) -> Option<CapabilityHandle> {
        self.capabilities().get(kind, face)
    }

    pub fn slot_insert(&mut self, slot: SlotKind, stack: ItemStack) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        match slot {
            SlotKind::Intake => self.insert_intake(stack),
            SlotKind::Medium => self.insert_medium(stack),
        }
    }

    pub fn slot_extract(&mut self, slot: SlotKind, amount: u64) -> Option<ItemStack> {
        match slot {
            SlotKind::Intake => None,
            SlotKind::Medium if amount > 0 => self.take_medium(),
            SlotKind::Medium => None,
        }
    }

    /// Players need `Build`; machines must share this device's grid.
    pub fn can_access(&self, source: &ActionSource) -> bool {
        if let Some(player) = source.player_id() {
            return match self.context.grid.has_permission(player, Permission::Build) {
                Ok(allowed) => allowed,
                Err(e) => {
                    debug!("[cell-host] Access check failed: {}", e);
                    false
                }
            };
        }

        match (source.machine_ref(), self.context.grid.grid_id()) {
            (Some(machine), Some(grid)) => machine.grid == Some(grid),
            _ => false,
        }
    }
}

impl CellHostApi for ChestController {
    fn tick(&mut self) {
        ChestController::tick(self)
    }

    fn priority(&self) -> i32 {
        ChestController::priority(self)
    }

    fn set_priority(&mut self, priority: i32) {
        ChestController::set_priority(self, priority)
    }

    fn recolor(&mut self, color: PaintColor) -> bool {
        ChestController::recolor(self, color)
    }

    fn save(&self) {
        ChestController::save(self)
    }

    fn slot_insert(&mut self, slot: SlotKind, stack: ItemStack) -> Option<ItemStack> {
        ChestController::slot_insert(self, slot, stack)
    }

    fn slot_extract(&mut self, slot: SlotKind, amount: u64) -> Option<ItemStack> {
        ChestController::slot_extract(self, slot, amount)
    }

    fn has_capability(&mut self, kind: CapabilityKind, face: Face) -> bool {
        ChestController::has_capability(self, kind, face)
    }

    fn get_capability(&mut self, kind: CapabilityKind, face: Face) -> Option<CapabilityHandle> {
        ChestController::get_capability(self, kind, face)
    }

    fn can_access(&self, source: &ActionSource) -> bool {
        ChestController::can_access(self, source)
    }

    fn sync_record(&mut self) -> SyncRecord {
        ChestController::sync_record(self)
    }

    fn needs_sync(&self) -> bool {
        ChestController::needs_sync(self)
    }
}
