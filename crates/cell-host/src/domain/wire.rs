//! Sync wire record.
//!
//! Six bytes, big-endian:
//!
//! | Offset | Size | Field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 1    | status word                                |
//! | 1      | 1    | paint color ordinal                        |
//! | 2      | 4    | medium id, `0` = empty, else `(variant << 16) \| type` |

use super::entities::{ItemKey, PaintColor};
use super::status::StatusWord;
use crate::error::WireError;

/// Snapshot broadcast to remote observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncRecord {
    pub status: StatusWord,
    pub color: PaintColor,
    pub medium: Option<ItemKey>,
}

impl SyncRecord {
    pub const ENCODED_LEN: usize = 6;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0] = self.status.bits();
        out[1] = self.color.ordinal();
        let id = self.medium.map(ItemKey::wire_id).unwrap_or(0);
        out[2..6].copy_from_slice(&id.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < Self::ENCODED_LEN {
            return Err(WireError::Truncated {
                needed: Self::ENCODED_LEN,
                have: bytes.len(),
            });
        }

        let color = PaintColor::from_ordinal(bytes[1]).ok_or(WireError::InvalidColor(bytes[1]))?;
        let id = i32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);

        Ok(Self {
            status: StatusWord::from_bits(bytes[0]),
            color,
            medium: ItemKey::from_wire_id(id),
        })
    }

    /// Whether moving from `previous` to `self` changes what an observer
    /// draws. Blink-only changes do not.
    pub fn needs_redraw(&self, previous: &SyncRecord) -> bool {
        self.color != previous.color
            || self.status.redraw_bits() != previous.status.redraw_bits()
            || self.medium != previous.medium
    }
}
