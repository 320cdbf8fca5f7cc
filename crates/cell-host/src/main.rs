//! Cell host simulation
//!
//! Wires one device to the in-memory adapters and drives it through a
//! scripted session: charge, insert a medium, feed the intake, drain the
//! medium back out, then pull the medium. Every broadcast record is logged
//! together with what an observer would redraw.
//!
//! Configuration comes from `CELL_HOST_*` environment variables, log
//! filtering from `RUST_LOG`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cell_host::adapters::{
    BasicCellDriver, CellSpec, InMemoryGrid, ManualClock, ObserverMirror, RecordingEnvironment,
    StaticDriverRegistry,
};
use cell_host::{
    ActionSource, Actionable, ChannelStack, ChestController, HostConfig, HostContext, HostMetrics,
    ItemKey, ItemStack, SlotKind, TickSource,
};

const STORAGE_CELL: ItemKey = ItemKey::new(1, 0);
const IRON_INGOT: ItemKey = ItemKey::new(265, 0);

/// Ticks each scripted phase runs for.
const PHASE_TICKS: u64 = 12;

struct Session {
    chest: ChestController,
    clock: Arc<ManualClock>,
    observer: ObserverMirror,
}

impl Session {
    /// Advances one tick and broadcasts if the device asked for it.
    fn step(&mut self) -> Result<()> {
        self.clock.advance(1);
        self.chest.tick();
        if self.chest.needs_sync() {
            self.broadcast()?;
        }
        Ok(())
    }

    fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    fn broadcast(&mut self) -> Result<()> {
        let now = self.clock.now();
        let record = self.chest.sync_record();
        let bytes = record.encode();
        let redraw = self
            .observer
            .apply(&bytes, now)
            .context("observer rejected sync record")?;

        info!(
            "[cell-host] tick={} status={:#04x} color={:?} medium={:?} redraw={} reserve={:.2}",
            now,
            record.status.bits(),
            record.color,
            record.medium,
            redraw,
            self.chest.reserve_level()
        );
        Ok(())
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let config = HostConfig::from_env().context("invalid CELL_HOST_* configuration")?;
    info!("[cell-host] Configuration loaded: {:?}", config);

    let driver = BasicCellDriver::new("basic-cells")
        .with_cell(STORAGE_CELL.type_id, CellSpec::items(1024, 63));
    let grid = Arc::new(InMemoryGrid::new());
    let environment = Arc::new(RecordingEnvironment::new());
    let clock = Arc::new(ManualClock::new(0));
    let metrics = Arc::new(HostMetrics::new());

    let context = HostContext::new(
        grid.clone(),
        Arc::new(StaticDriverRegistry::new().with_driver(Arc::new(driver))),
        environment.clone(),
        clock.clone(),
    );
    let quiet_ticks = config.blink_quiet_ticks;
    let chest = ChestController::new(context, config)
        .context("failed to create device")?
        .with_metrics(metrics.clone());

    let mut session = Session {
        chest,
        clock,
        observer: ObserverMirror::new(quiet_ticks),
    };

    info!("[cell-host] Phase 1: charging local reserve");
    let capacity = session.chest.config().reserve_capacity();
    session.chest.inject_power(capacity, Actionable::Commit);
    session.broadcast()?;

    info!("[cell-host] Phase 2: joining a powered grid and inserting storage medium");
    grid.set_energy(10_000.0);
    grid.set_powered(true);
    session.chest.on_power_status_change();
    if let Some(rejected) = session
        .chest
        .slot_insert(SlotKind::Medium, ItemStack::new(STORAGE_CELL, 1))
    {
        warn!("[cell-host] Medium rejected: {:?}", rejected);
    }
    session.run(PHASE_TICKS)?;

    info!("[cell-host] Phase 3: feeding the intake");
    for _ in 0..3 {
        let rest = session
            .chest
            .slot_insert(SlotKind::Intake, ItemStack::new(IRON_INGOT, 16));
        if let Some(rest) = rest {
            warn!("[cell-host] Intake refused {} items", rest.count);
        }
        session.run(PHASE_TICKS)?;
    }

    info!("[cell-host] Phase 4: draining the medium");
    let source = ActionSource::automation();
    let drained = session
        .chest
        .extract(ChannelStack::item(IRON_INGOT, 20), Actionable::Commit, &source)
        .context("no item handler bound while draining")?;
    info!("[cell-host] Drained {:?}", drained);
    session.run(PHASE_TICKS)?;

    info!("[cell-host] Phase 5: removing the medium");
    let removed = session.chest.slot_extract(SlotKind::Medium, 1);
    info!("[cell-host] Removed {:?}", removed);
    session.run(PHASE_TICKS)?;

    let snapshot = metrics.snapshot();
    info!(
        "[cell-host] Session done: rebinds={} blinks={} commits={} broadcasts={} alterations={} saves={}",
        snapshot.rebinds,
        snapshot.blinks,
        snapshot.commits,
        snapshot.sync_broadcasts,
        grid.alterations().len(),
        environment.dirty_count()
    );
    Ok(())
}
