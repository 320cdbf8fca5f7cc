//! Bitpacked status word and its blink state machine.
//!
//! ```text
//!   bit   7   6   5   4   3   2   1   0
//!       +---+---+-----------+---+-------+
//!       | - | P |   spare   | B | status|
//!       +---+---+-----------+---+-------+
//!                             \__slot 0__/
//! ```
//!
//! Each slot occupies `SLOT_WIDTH` bits: a 2-bit [`CellStatus`] code followed
//! by a blink flag. The powered flag sits at bit 6 for wire compatibility.

use super::entities::{CellStatus, Tick};
use serde::{Deserialize, Serialize};

/// Channel slots the device exposes.
pub const SLOT_COUNT: usize = 1;

/// Bits per slot: two status bits and one blink bit.
pub const SLOT_WIDTH: u32 = 3;

/// Position of the global powered flag.
pub const POWER_BIT: u32 = 6;

const STATUS_BITS: u8 = 0b11;

const _: () = assert!(SLOT_COUNT as u32 * SLOT_WIDTH <= POWER_BIT);

const fn status_shift(slot: usize) -> u32 {
    slot as u32 * SLOT_WIDTH
}

const fn blink_bit(slot: usize) -> u32 {
    status_shift(slot) + SLOT_WIDTH - 1
}

const fn derive_blink_mask() -> u8 {
    let mut mask = 0u8;
    let mut slot = 0;
    while slot < SLOT_COUNT {
        mask |= 1 << blink_bit(slot);
        slot += 1;
    }
    mask
}

/// Every blink bit of every slot.
pub const BLINK_MASK: u8 = derive_blink_mask();

/// Bits whose change requires the observer to redraw.
pub const REDRAW_MASK: u8 = !BLINK_MASK;

/// Fixed-width status record with named accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusWord(u8);

impl StatusWord {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `Absent` for slots the device does not have.
    pub fn cell_status(self, slot: usize) -> CellStatus {
        if slot >= SLOT_COUNT {
            return CellStatus::Absent;
        }
        CellStatus::from_code((self.0 >> status_shift(slot)) & STATUS_BITS)
    }

    pub fn set_cell_status(&mut self, slot: usize, status: CellStatus) {
        if slot >= SLOT_COUNT {
            return;
        }
        let shift = status_shift(slot);
        self.0 = (self.0 & !(STATUS_BITS << shift)) | (status.code() << shift);
    }

    pub fn is_blinking(self, slot: usize) -> bool {
        slot < SLOT_COUNT && self.0 & (1 << blink_bit(slot)) != 0
    }

    pub fn set_blink(&mut self, slot: usize) {
        if slot >= SLOT_COUNT {
            return;
        }
        self.0 |= 1 << blink_bit(slot);
    }

    pub fn is_powered(self) -> bool {
        self.0 & (1 << POWER_BIT) != 0
    }

    pub fn set_powered(&mut self, powered: bool) {
        if powered {
            self.0 |= 1 << POWER_BIT;
        } else {
            self.0 &= !(1 << POWER_BIT);
        }
    }

    /// Only the blink bits.
    pub fn blinks_only(self) -> Self {
        Self(self.0 & BLINK_MASK)
    }

    pub fn without_blinks(self) -> Self {
        Self(self.0 & REDRAW_MASK)
    }

    /// The bits an observer redraws on.
    pub fn redraw_bits(self) -> u8 {
        self.0 & REDRAW_MASK
    }
}

/// Live values the encoder folds into the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusInputs {
    pub cells: [CellStatus; SLOT_COUNT],
    pub powered: bool,
}

/// Owns the device's status word and blink timing.
#[derive(Debug, Clone)]
pub struct StatusEncoder {
    word: StatusWord,
    last_change: Tick,
    quiet_ticks: u64,
    dirty: bool,
}

impl StatusEncoder {
    pub fn new(quiet_ticks: u64) -> Self {
        Self {
            word: StatusWord::default(),
            last_change: 0,
            quiet_ticks,
            dirty: false,
        }
    }

    pub fn word(&self) -> StatusWord {
        self.word
    }

    pub fn last_change(&self) -> Tick {
        self.last_change
    }

    fn is_quiet(&self, now: Tick) -> bool {
        now.saturating_sub(self.last_change) > self.quiet_ticks
    }

    fn fold(mut base: StatusWord, inputs: &StatusInputs) -> StatusWord {
        for (slot, status) in inputs.cells.iter().enumerate() {
            base.set_cell_status(slot, *status);
        }
        base.set_powered(inputs.powered);
        base
    }

    /// Re-derives slot status and powered bits, dropping stale blinks.
    ///
    /// Returns `true` (and marks the word dirty) if the word changed.
    pub fn recompute(&mut self, now: Tick, inputs: &StatusInputs) -> bool {
        let base = if self.is_quiet(now) {
            self.word.without_blinks()
        } else {
            self.word
        };
        let next = Self::fold(base, inputs);
        self.store(next)
    }

    /// Flags activity on `slot`.
    ///
    /// After a quiet period the whole word is cleared first, so blinks of
    /// other slots do not linger. Unknown slots are ignored.
    pub fn blink(&mut self, slot: usize, now: Tick, inputs: &StatusInputs) -> bool {
        if slot >= SLOT_COUNT {
            return false;
        }
        let previous = self.word;
        let mut next = if self.is_quiet(now) {
            StatusWord::default()
        } else {
            self.word
        };
        next.set_blink(slot);
        self.last_change = now;

        let next = Self::fold(next, inputs);
        self.word = next;
        if next != previous {
            self.dirty = true;
        }
        next != previous
    }

    /// The word as it goes on the wire: live blinks kept, stale ones
    /// dropped, status and power freshly folded in.
    pub fn refresh_for_encode(&mut self, now: Tick, inputs: &StatusInputs) -> StatusWord {
        let base = if self.is_quiet(now) {
            StatusWord::default()
        } else {
            self.word.blinks_only()
        };
        self.word = Self::fold(base, inputs);
        self.word
    }

    /// Whether a broadcast is pending; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Requests a broadcast for changes outside the word (color, medium).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn store(&mut self, next: StatusWord) -> bool {
        if next == self.word {
            return false;
        }
        self.word = next;
        self.dirty = true;
        true
    }
}
