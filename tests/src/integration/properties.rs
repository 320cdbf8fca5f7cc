//! # Whole-Device Properties
//!
//! Randomized checks of the guarantees callers rely on:
//!
//! - the bound handler always belongs to the medium currently in the slot
//! - `Simulate` never mutates, and a following `Commit` never does more
//! - intake cost equals what was stored, within what the reserve holds
//! - the observer sees exactly what the host encoded

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use cell_host::adapters::ObserverMirror;
    use cell_host::domain::PlayerId;
    use cell_host::{
        ActionSource, Actionable, Channel, ChannelStack, ItemKey, ItemStack, PaintColor,
        Permission, TickSource,
    };

    use crate::integration::{roomy_config, Harness, FLUID_CELL, GOLD, IRON, ITEM_CELL, SMALL_CELL};

    fn medium_strategy() -> impl Strategy<Value = Option<ItemKey>> {
        prop_oneof![
            Just(None),
            Just(Some(ITEM_CELL)),
            Just(Some(ItemKey::new(ITEM_CELL.type_id, 1))),
            Just(Some(SMALL_CELL)),
            Just(Some(FLUID_CELL)),
        ]
    }

    fn item_capable(medium: Option<ItemKey>) -> bool {
        medium.is_some_and(|key| key.type_id != FLUID_CELL.type_id)
    }

    proptest! {
        #[test]
        fn prop_binding_never_stale(
            ops in proptest::collection::vec((medium_strategy(), 0u64..20, -3i32..3), 1..12)
        ) {
            let mut h = Harness::new(roomy_config());
            let automation = ActionSource::automation();

            for (medium, amount, priority) in ops {
                h.chest.set_medium(medium.map(|key| ItemStack::new(key, 1)));
                h.chest.set_priority(priority);

                if item_capable(medium) && amount > 0 {
                    h.chest
                        .inject(ChannelStack::item(IRON, amount), Actionable::Commit, &automation)
                        .unwrap();
                }

                match h.chest.available(Channel::Items) {
                    Ok(stacks) => {
                        let key = medium.expect("handler implies a medium");
                        prop_assert!(item_capable(medium));
                        prop_assert_eq!(stacks, h.driver.contents_of(&key));
                    }
                    Err(_) => prop_assert!(!item_capable(medium)),
                }
                if let Ok(handler) = h.chest.handler(Channel::Items) {
                    prop_assert_eq!(handler.priority(), priority);
                }
            }
        }

        #[test]
        fn prop_simulate_then_commit(preload in 0u64..128, amount in 1u64..200) {
            let mut h = Harness::new(roomy_config());
            h.chest.inject_power(100.0, Actionable::Commit);
            h.chest.set_medium(Some(ItemStack::new(SMALL_CELL, 1)));
            let automation = ActionSource::automation();
            if preload > 0 {
                h.chest
                    .inject(ChannelStack::item(GOLD, preload), Actionable::Commit, &automation)
                    .unwrap();
            }

            let before = h.driver.contents_of(&SMALL_CELL);
            let reserve = h.chest.reserve_level();
            let alterations = h.grid.alterations().len();

            let request = ChannelStack::item(IRON, amount);
            let simulated = h.chest.inject(request, Actionable::Simulate, &automation).unwrap();
            prop_assert_eq!(h.driver.contents_of(&SMALL_CELL), before);
            prop_assert_eq!(h.chest.reserve_level(), reserve);
            prop_assert_eq!(h.grid.alterations().len(), alterations);

            let committed = h.chest.inject(request, Actionable::Commit, &automation).unwrap();
            let simulated_in = amount - simulated.map_or(0, |r| r.amount);
            let committed_in = amount - committed.map_or(0, |r| r.amount);
            prop_assert!(committed_in <= simulated_in);
        }

        #[test]
        fn prop_intake_cost_matches_stored(level in 0u16..400, count in 1u64..=64) {
            let mut h = Harness::new(roomy_config());
            h.chest.inject_power(f64::from(level), Actionable::Commit);
            h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));

            h.chest.set_intake(Some(ItemStack::new(IRON, count)));

            let stored: u64 = h
                .driver
                .contents_of(&ITEM_CELL)
                .iter()
                .map(|stack| stack.amount)
                .sum();
            let remaining = h.chest.intake().map_or(0, |stack| stack.count);

            prop_assert_eq!(stored + remaining, count);
            prop_assert_eq!(stored, count.min(u64::from(level)));
            prop_assert!((h.chest.reserve_level() - (f64::from(level) - stored as f64)).abs() < 1e-9);
        }

        #[test]
        fn prop_observer_sees_encoded_record(
            ordinal in 0u8..17,
            medium in medium_strategy(),
            power in prop_oneof![Just(0.0), Just(50.0)],
        ) {
            let mut h = Harness::new(roomy_config());
            h.chest.inject_power(power, Actionable::Commit);
            h.chest.set_medium(medium.map(|key| ItemStack::new(key, 1)));
            let color = PaintColor::from_ordinal(ordinal).expect("ordinal in range");
            h.chest.recolor(color);

            let record = h.chest.sync_record();
            let mut observer = ObserverMirror::new(8);
            observer.apply(&record.encode(), h.clock.now()).unwrap();

            prop_assert_eq!(observer.record(), &record);
            prop_assert_eq!(observer.color(), color);
            prop_assert_eq!(observer.is_powered(), power > 0.0);
            let shown = if power > 0.0 { medium } else { None };
            prop_assert_eq!(observer.storage_type(), shown);
        }

        #[test]
        fn prop_only_granted_players_inject(player in 0u32..8, granted in proptest::collection::hash_set(0u32..8, 0..5)) {
            let mut h = Harness::new(roomy_config());
            h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
            h.grid.set_enforcing(true);
            for id in &granted {
                h.grid.grant(PlayerId(*id), Permission::Inject);
            }

            let stack = ChannelStack::item(IRON, 1);
            let source = ActionSource::player(PlayerId(player));
            let rest = h.chest.inject(stack, Actionable::Commit, &source).unwrap();

            prop_assert_eq!(rest.is_none(), granted.contains(&player));
        }
    }
}
