//! # Host → Observer Sync
//!
//! Every broadcast goes through `SyncRecord::encode` and lands in an
//! `ObserverMirror`, the same path a remote renderer uses.

#[cfg(test)]
mod tests {
    use cell_host::adapters::ObserverMirror;
    use cell_host::{
        Actionable, CellStatus, ItemStack, PaintColor, SyncRecord, TickSource, WireError,
    };

    use crate::integration::{roomy_config, Harness, IRON, ITEM_CELL};

    /// Broadcasts the host's record; returns the observer's redraw decision.
    fn broadcast(h: &mut Harness, observer: &mut ObserverMirror) -> bool {
        let bytes = h.chest.sync_record().encode();
        observer
            .apply(&bytes, h.clock.now())
            .expect("host emits valid records")
    }

    #[test]
    fn test_observer_mirrors_host_state() {
        let mut h = Harness::new(roomy_config());
        let mut observer = ObserverMirror::new(h.chest.config().blink_quiet_ticks);

        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.recolor(PaintColor::Purple);
        assert!(broadcast(&mut h, &mut observer));

        assert!(observer.is_powered());
        assert_eq!(observer.cell_status(0), CellStatus::Available);
        assert_eq!(observer.color(), PaintColor::Purple);
        assert_eq!(observer.storage_type(), Some(ITEM_CELL));
    }

    #[test]
    fn test_blink_alone_does_not_redraw() {
        let mut h = Harness::new(roomy_config());
        let mut observer = ObserverMirror::new(h.chest.config().blink_quiet_ticks);
        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        broadcast(&mut h, &mut observer);

        h.clock.advance(20);
        h.chest.set_intake(Some(ItemStack::new(IRON, 4)));
        assert!(h.chest.needs_sync());

        assert!(!broadcast(&mut h, &mut observer));
        assert!(observer.is_cell_blinking(0, h.clock.now()));
        assert!(!observer.is_cell_blinking(0, h.clock.now() + 9));
    }

    #[test]
    fn test_stale_blink_is_not_rebroadcast() {
        let mut h = Harness::new(roomy_config());
        let mut observer = ObserverMirror::new(h.chest.config().blink_quiet_ticks);
        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        h.chest.set_intake(Some(ItemStack::new(IRON, 4)));
        broadcast(&mut h, &mut observer);
        assert!(observer.record().status.is_blinking(0));

        h.clock.advance(9);
        broadcast(&mut h, &mut observer);
        assert!(!observer.record().status.is_blinking(0));
        assert!(!h.chest.is_cell_blinking(0));
    }

    #[test]
    fn test_medium_removal_redraws_and_keeps_power_bit() {
        let mut h = Harness::new(roomy_config());
        let mut observer = ObserverMirror::new(h.chest.config().blink_quiet_ticks);
        h.chest.inject_power(100.0, Actionable::Commit);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        broadcast(&mut h, &mut observer);

        h.chest.take_medium();
        assert!(broadcast(&mut h, &mut observer));
        assert_eq!(observer.cell_status(0), CellStatus::Absent);
        assert!(observer.is_powered());
        assert_eq!(observer.storage_type(), None);
        assert_eq!(observer.record().medium, None);
    }

    #[test]
    fn test_unpowered_observer_hides_medium() {
        let mut h = Harness::new(roomy_config());
        let mut observer = ObserverMirror::new(8);
        h.chest.set_medium(Some(ItemStack::new(ITEM_CELL, 1)));
        broadcast(&mut h, &mut observer);

        assert!(!observer.is_powered());
        assert_eq!(observer.record().medium, Some(ITEM_CELL));
        assert_eq!(observer.storage_type(), None);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let mut h = Harness::new(roomy_config());
        let bytes = h.chest.sync_record().encode();
        let mut observer = ObserverMirror::new(8);

        let err = observer.apply(&bytes[..3], 0).unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                needed: SyncRecord::ENCODED_LEN,
                have: 3
            }
        );
        assert_eq!(observer.record(), &SyncRecord::default());
    }
}
