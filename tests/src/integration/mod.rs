//! End-to-end tests wiring a `ChestController` to the in-memory adapters.

pub mod flows;
pub mod properties;
pub mod sync;

use std::sync::Arc;

use cell_host::adapters::{
    BasicCellDriver, CellSpec, InMemoryGrid, ManualClock, RecordingEnvironment,
    StaticDriverRegistry,
};
use cell_host::{ChestController, HostConfig, HostContext, HostMetrics, ItemKey};

pub const ITEM_CELL: ItemKey = ItemKey::new(1, 0);
pub const SMALL_CELL: ItemKey = ItemKey::new(3, 0);
pub const FLUID_CELL: ItemKey = ItemKey::new(2, 0);
pub const COBBLESTONE: ItemKey = ItemKey::new(4, 0);
pub const IRON: ItemKey = ItemKey::new(265, 0);
pub const GOLD: ItemKey = ItemKey::new(266, 0);
pub const LAVA: u32 = 11;

/// One device plus handles on every adapter it talks to.
pub struct Harness {
    pub chest: ChestController,
    pub grid: Arc<InMemoryGrid>,
    pub environment: Arc<RecordingEnvironment>,
    pub clock: Arc<ManualClock>,
    pub driver: Arc<BasicCellDriver>,
    pub metrics: Arc<HostMetrics>,
}

impl Harness {
    pub fn new(config: HostConfig) -> Self {
        Self::on_grid(config, Arc::new(InMemoryGrid::new()), shared_driver())
    }

    /// A device joined to `grid`, with media served by `driver`.
    pub fn on_grid(config: HostConfig, grid: Arc<InMemoryGrid>, driver: Arc<BasicCellDriver>) -> Self {
        let environment = Arc::new(RecordingEnvironment::new());
        let clock = Arc::new(ManualClock::new(0));
        let metrics = Arc::new(HostMetrics::new());

        let context = HostContext::new(
            grid.clone(),
            Arc::new(StaticDriverRegistry::new().with_driver(driver.clone())),
            environment.clone(),
            clock.clone(),
        );
        let chest = ChestController::new(context, config)
            .expect("valid config")
            .with_metrics(metrics.clone());

        Self {
            chest,
            grid,
            environment,
            clock,
            driver,
            metrics,
        }
    }

    /// Advances the clock and runs one device tick.
    pub fn step(&mut self) {
        self.clock.advance(1);
        self.chest.tick();
    }
}

/// Driver with a large item cell, a two-type item cell and a fluid cell.
pub fn shared_driver() -> Arc<BasicCellDriver> {
    Arc::new(
        BasicCellDriver::new("basic")
            .with_cell(ITEM_CELL.type_id, CellSpec::items(4096, 63))
            .with_cell(SMALL_CELL.type_id, CellSpec::items(128, 2))
            .with_cell(FLUID_CELL.type_id, CellSpec::fluids(256_000, 5)),
    )
}

/// Default config with room for a full stack of intake power.
pub fn roomy_config() -> HostConfig {
    cell_host::HostConfigBuilder::new()
        .base_reserve_capacity(400.0)
        .build()
        .expect("valid config")
}
