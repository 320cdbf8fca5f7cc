//! # Device Lifecycle Flows
//!
//! Drives a device the way the world does: automation pushes items into
//! faces, the owner swaps media and repaints, the grid powers up and down.
//!
//! ## Flows Tested:
//!
//! 1. **Intake → medium**: items pushed into a side face end up in the cell
//! 2. **Network energy first**: a powered grid pays before the local reserve
//! 3. **Security directory**: player credentials gate every transaction
//! 4. **Medium swap**: the grid sees the old contents leave and the new arrive
//! 5. **Reload**: persisted settings survive a fresh controller
//! 6. **Network storage**: grid-side transactions blink like local ones

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cell_host::adapters::{InMemoryGrid, ObserverMirror};
    use cell_host::domain::{GridId, PlayerId, StorageDelta};
    use cell_host::{
        ActionSource, Actionable, CapabilityHandle, CapabilityKind, CellHostApi, CellStatus,
        Channel, ChannelStack, Face, FluidPort, FluidStack, GridEvent, HostConfig, ItemStack,
        MonitorAccessor, PaintColor, Permission, SlotKind, TickSource,
    };

    use crate::integration::{
        roomy_config, shared_driver, Harness, COBBLESTONE, FLUID_CELL, GOLD, IRON, ITEM_CELL,
        LAVA, SMALL_CELL,
    };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Pushes `stack` into `face` the way a neighboring conveyor would.
    fn push_into_face(host: &mut dyn CellHostApi, face: Face, stack: ItemStack) -> Option<ItemStack> {
        match host.get_capability(CapabilityKind::ItemHandler, face) {
            Some(CapabilityHandle::ItemSlot(slot)) => host.slot_insert(slot, stack),
            _ => Some(stack),
        }
    }

    // =========================================================================
    // INTAKE → MEDIUM
    // =========================================================================

    #[test]
    fn test_side_face_feeds_medium_through_intake() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(200.0, Actionable::Commit);

        let rejected = push_into_face(&mut h.chest, Face::North, ItemStack::new(ITEM_CELL, 1));
        assert_eq!(rejected, None, "forward face reaches the medium slot");
        assert_eq!(h.chest.cell_status(0), CellStatus::Available);

        let rejected = push_into_face(&mut h.chest, Face::East, ItemStack::new(IRON, 64));
        assert_eq!(rejected, None);
        assert_eq!(h.chest.intake(), None);
        assert_eq!(
            h.driver.contents_of(&ITEM_CELL),
            vec![ChannelStack::item(IRON, 64)]
        );
        assert!(approx(h.chest.reserve_level(), 136.0));
        assert!(h.chest.is_cell_blinking(0));

        let alterations = h.grid.alterations();
        let last = alterations.last().expect("intake commit is announced");
        assert_eq!(
            last.deltas,
            vec![StorageDelta::added(&ChannelStack::item(IRON, 64))]
        );
    }

    #[test]
    fn test_small_cell_fills_up_and_reports_status() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(400.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(SMALL_CELL, 1)));

        h.chest.set_intake(Some(ItemStack::new(IRON, 10)));
        h.chest.set_intake(Some(ItemStack::new(GOLD, 10)));
        assert_eq!(h.chest.cell_status(0), CellStatus::TypesFull);

        // a third type does not fit, so the intake refuses it outright
        let cobble = ItemStack::new(COBBLESTONE, 5);
        assert_eq!(h.chest.slot_insert(SlotKind::Intake, cobble), Some(cobble));

        h.chest.set_intake(Some(ItemStack::new(IRON, 64)));
        h.chest.set_intake(Some(ItemStack::new(IRON, 64)));
        assert_eq!(h.chest.cell_status(0), CellStatus::Full);
        assert_eq!(h.chest.intake(), Some(ItemStack::new(IRON, 20)));

        let word = h.chest.sync_record().status;
        assert_eq!(word.cell_status(0), CellStatus::Full);
    }

    #[test]
    fn test_stuck_intake_drains_once_power_arrives() {
        let mut h = Harness::new(roomy_config());
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.set_intake(Some(ItemStack::new(IRON, 32)));
        assert_eq!(h.chest.intake(), Some(ItemStack::new(IRON, 32)));

        h.chest.inject_power(100.0, Actionable::Commit);
        h.step();

        assert_eq!(h.chest.intake(), None);
        assert_eq!(
            h.driver.contents_of(&ITEM_CELL),
            vec![ChannelStack::item(IRON, 32)]
        );
    }

    // =========================================================================
    // POWER
    // =========================================================================

    #[test]
    fn test_network_energy_pays_before_reserve() {
        let mut h = Harness::new(roomy_config());
        h.grid.set_powered(true);
        h.grid.set_energy(500.0);
        h.chest.inject_power(50.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));

        assert_eq!(
            h.chest.slot_insert(SlotKind::Intake, ItemStack::new(IRON, 64)),
            None
        );
        assert!(approx(h.grid.energy(), 436.0));
        assert!(approx(h.chest.reserve_level(), 50.0));

        for _ in 0..10 {
            h.step();
        }
        assert!(approx(h.chest.reserve_level(), 50.0), "no idle billing on a powered grid");
    }

    #[test]
    fn test_power_multiplier_scales_reserve_and_costs() {
        let config = cell_host::HostConfigBuilder::new()
            .power_multiplier(2.0)
            .build()
            .expect("valid config");
        let mut h = Harness::new(config);
        assert!(approx(h.chest.config().reserve_capacity(), 80.0));

        let overflow = h.chest.inject_power(100.0, Actionable::Commit);
        assert!(approx(overflow, 20.0));

        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.set_intake(Some(ItemStack::new(IRON, 10)));
        assert!(approx(h.chest.reserve_level(), 60.0));
    }

    #[test]
    fn test_idle_drain_eventually_unpowers_device() {
        let mut h = Harness::new(HostConfig::default());
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.inject_power(6.0, Actionable::Commit);
        assert!(h.chest.is_powered());

        for _ in 0..4 {
            h.step();
        }

        assert!(!h.chest.is_powered());
        assert!(!h.chest.sync_record().status.is_powered());
        assert_eq!(h.chest.storage_type(), None);
    }

    #[test]
    fn test_fluid_fill_spends_reserve() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(10.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(FLUID_CELL, 1)));

        let filled = {
            let mut port = FluidPort::open(&mut h.chest, Face::Up).expect("fluid port");
            port.fill(FluidStack::new(LAVA, 2500), true)
        };

        assert_eq!(filled, 2500);
        assert!(approx(h.chest.reserve_level(), 5.0));
        assert_eq!(
            h.driver.contents_of(&FLUID_CELL),
            vec![ChannelStack::fluid(LAVA, 2500)]
        );
    }

    // =========================================================================
    // SECURITY
    // =========================================================================

    #[test]
    fn test_security_directory_gates_players_only() {
        let mut h = Harness::new(roomy_config());
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.grid.set_enforcing(true);
        h.grid.grant(PlayerId(1), Permission::Inject);

        let depositor = ActionSource::player(PlayerId(1));
        let stranger = ActionSource::player(PlayerId(2));
        let stack = ChannelStack::item(GOLD, 16);

        let rest = h.chest.inject(stack, Actionable::Commit, &stranger).unwrap();
        assert_eq!(rest, Some(stack));

        let rest = h.chest.inject(stack, Actionable::Commit, &depositor).unwrap();
        assert_eq!(rest, None);

        let taken = h
            .chest
            .extract(ChannelStack::item(GOLD, 4), Actionable::Commit, &depositor)
            .unwrap();
        assert_eq!(taken, None, "inject permission does not imply extract");

        let machine = h.chest.action_source();
        let taken = h
            .chest
            .extract(ChannelStack::item(GOLD, 4), Actionable::Commit, &machine)
            .unwrap();
        assert_eq!(taken, Some(ChannelStack::item(GOLD, 4)));

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.permission_denials, 2);
        assert_eq!(snapshot.commits, 2);
    }

    #[test]
    fn test_unreachable_directory_refuses_players() {
        let mut h = Harness::new(roomy_config());
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.grid.set_enforcing(true);
        h.grid.grant(PlayerId(9), Permission::Inject);
        h.grid.set_reachable(false);

        let stack = ChannelStack::item(IRON, 5);
        let player = ActionSource::player(PlayerId(9));
        let rest = h.chest.inject(stack, Actionable::Commit, &player).unwrap();
        assert_eq!(rest, Some(stack));
        assert!(h.driver.contents_of(&ITEM_CELL).is_empty());
        assert!(!h.chest.can_access(&player));

        let machine = h.chest.action_source();
        assert_eq!(h.chest.inject(stack, Actionable::Commit, &machine).unwrap(), None);
    }

    #[test]
    fn test_monitor_shared_between_devices_on_one_grid() {
        let grid = Arc::new(InMemoryGrid::with_id(GridId(7)));
        let driver = shared_driver();
        let mut left = Harness::on_grid(roomy_config(), grid.clone(), driver.clone());
        let right = Harness::on_grid(roomy_config(), grid.clone(), driver);
        left.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));

        let neighbor = right.chest.action_source();
        {
            let accessor =
                MonitorAccessor::open(&mut left.chest, Face::South).expect("monitor accessor");
            let mut monitor = accessor.monitor(&neighbor).expect("same grid may access");
            assert_eq!(
                monitor.inject(ChannelStack::item(IRON, 3), Actionable::Commit, &neighbor),
                None
            );
        }

        let foreign = Harness::new(roomy_config());
        let outsider = foreign.chest.action_source();
        let accessor = MonitorAccessor::open(&mut left.chest, Face::South).expect("monitor accessor");
        assert!(accessor.monitor(&outsider).is_none());
    }

    // =========================================================================
    // MEDIUM SWAP
    // =========================================================================

    #[test]
    fn test_medium_swap_announces_both_sides() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(400.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.set_intake(Some(ItemStack::new(IRON, 12)));
        let taken = h.chest.take_medium();
        assert_eq!(taken, Some(ItemStack::new(ITEM_CELL, 1)));

        h.chest.set_medium(Some(ItemStack::new(SMALL_CELL, 1)));
        h.chest.set_intake(Some(ItemStack::new(GOLD, 5)));
        h.grid.clear_history();

        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));

        let alterations = h.grid.alterations();
        assert_eq!(alterations.len(), 1);
        assert_eq!(
            alterations[0].deltas,
            vec![
                StorageDelta::removed(&ChannelStack::item(GOLD, 5)),
                StorageDelta::added(&ChannelStack::item(IRON, 12)),
            ]
        );
        assert_eq!(h.grid.count_events(GridEvent::CellArrayUpdate), 1);
        assert_eq!(
            h.chest.available(Channel::Items).unwrap(),
            vec![ChannelStack::item(IRON, 12)]
        );
    }

    #[test]
    fn test_every_medium_change_rebinds_once() {
        let mut h = Harness::new(roomy_config());
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        let start = h.metrics.snapshot().rebinds;

        h.chest.available(Channel::Items).unwrap();
        h.chest.available(Channel::Items).unwrap();
        assert_eq!(h.metrics.snapshot().rebinds, start);

        h.chest.set_medium(Some(ItemStack::new(SMALL_CELL, 1)));
        h.chest.set_priority(3);
        h.chest.available(Channel::Items).unwrap();

        assert_eq!(h.metrics.snapshot().rebinds - start, 2);
        assert_eq!(h.chest.handler(Channel::Items).unwrap().priority(), 3);
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    #[test]
    fn test_reload_restores_owner_settings() {
        let mut h = Harness::new(roomy_config());
        h.chest.set_priority(-4);
        h.chest.recolor(PaintColor::Lime);
        let saved = h.chest.save_json().expect("serializable state");

        let mut reloaded = Harness::new(roomy_config());
        reloaded.chest.restore_json(&saved).expect("valid state");
        assert_eq!(reloaded.chest.priority(), -4);
        assert_eq!(reloaded.chest.color(), PaintColor::Lime);
        assert!(reloaded.chest.needs_sync());

        let value: serde_json::Value = serde_json::from_str(&saved).expect("json");
        assert_eq!(value["priority"], -4);
        assert_eq!(value["paintedColor"], 5);
    }

    #[test]
    fn test_corrupt_state_is_rejected() {
        let mut h = Harness::new(roomy_config());
        assert!(h.chest.restore_json("{\"priority\":\"high\"}").is_err());
        assert!(h.chest.restore_json("{\"priority\":1,\"paintedColor\":99}").is_err());
        assert_eq!(h.chest.priority(), 0);
    }

    #[test]
    fn test_save_marks_environment_dirty() {
        let h = Harness::new(roomy_config());
        let before = h.environment.dirty_count();
        CellHostApi::save(&h.chest);
        assert_eq!(h.environment.dirty_count(), before + 1);
    }

    // =========================================================================
    // NETWORK STORAGE
    // =========================================================================

    #[test]
    fn test_network_storage_commit_blinks_and_persists() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        let mut observer = ObserverMirror::new(h.chest.config().blink_quiet_ticks);
        observer.apply(&h.chest.sync_record().encode(), h.clock.now()).unwrap();

        h.clock.advance(30);
        h.grid.clear_history();
        let dirty = h.environment.dirty_count();

        let network = ActionSource::automation();
        {
            let mut cell = h.chest.cell_array(Channel::Items).expect("active grid");
            assert_eq!(cell.priority(), 0);
            assert_eq!(
                cell.inject(ChannelStack::item(IRON, 5), Actionable::Commit, &network),
                None
            );
        }

        assert_eq!(h.driver.contents_of(&ITEM_CELL), vec![ChannelStack::item(IRON, 5)]);
        assert!(h.chest.is_cell_blinking(0));
        assert!(h.environment.dirty_count() > dirty);
        assert_eq!(h.grid.alterations().len(), 1);

        observer.apply(&h.chest.sync_record().encode(), h.clock.now()).unwrap();
        assert!(observer.is_cell_blinking(0, h.clock.now()));
    }

    #[test]
    fn test_out_of_range_slots_are_safe() {
        let mut h = Harness::new(roomy_config());
        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        let before = h.chest.sync_record();

        for slot in [1, 2, 3, 64] {
            assert!(!h.chest.is_cell_blinking(slot));
            assert_eq!(h.chest.cell_status(slot), CellStatus::Absent);
            h.chest.blink(slot);
        }
        assert_eq!(h.chest.sync_record(), before);

        let mut observer = ObserverMirror::new(8);
        observer.apply(&before.encode(), h.clock.now()).unwrap();
        assert_eq!(observer.cell_status(3), CellStatus::Absent);
        assert!(!observer.is_cell_blinking(3, h.clock.now()));
    }
}
