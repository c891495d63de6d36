//! Mask/value event filter.
//!
//! # How a mask/value pair works (for beginners)
//!
//! Each filtered field has a *value* and a *mask*.  A `1` bit in the mask
//! means "this bit of the event must equal the same bit of the value"; a `0`
//! bit means "don't care".  A mask of all zeros therefore matches anything,
//! and a mask of all ones requires an exact match:
//!
//! ```text
//! class_value = 0x000A   class_mask = 0xFFFF   -> only class 10
//! class_value = 0x0000   class_mask = 0x0000   -> any class
//! class_value = 0x0010   class_mask = 0x00F0   -> classes 0x10..=0x1F, 0x110..., etc.
//! ```
//!
//! The priority test works on the raw header bits [7:5], so `priority_value`
//! and `priority_mask` are header-aligned (`0xE0` selects the whole field).

use serde::{Deserialize, Serialize};

use crate::protocol::constants::{HEADER_PRIORITY_MASK, HEADER_PRIORITY_SHIFT, SIZE_GUID};
use crate::protocol::event::Event;
use crate::protocol::guid::Guid;

/// A mask/value filter over class, type, priority, and device GUID.
///
/// The default filter has every mask zero and accepts every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub priority_value: u8,
    pub priority_mask: u8,
    pub class_value: u16,
    pub class_mask: u16,
    pub type_value: u16,
    pub type_mask: u16,
    pub guid_value: [u8; SIZE_GUID],
    pub guid_mask: [u8; SIZE_GUID],
}

impl EventFilter {
    /// Creates a filter that accepts every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exact class/type filter.
    pub fn class_and_type(vscp_class: u16, vscp_type: u16) -> Self {
        let mut filter = Self::default();
        filter.set_class_and_type(vscp_class, vscp_type);
        filter
    }

    /// Resets every value and mask to zero (accept all).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Requires an exact class and type match.
    pub fn set_class_and_type(&mut self, vscp_class: u16, vscp_type: u16) {
        self.class_value = vscp_class;
        self.class_mask = 0xFFFF;
        self.type_value = vscp_type;
        self.type_mask = 0xFFFF;
    }

    /// Requires an exact priority (0..=7, masked) match.
    pub fn set_priority(&mut self, priority: u8) {
        self.priority_value = (priority & 0x07) << HEADER_PRIORITY_SHIFT;
        self.priority_mask = HEADER_PRIORITY_MASK;
    }

    /// Requires an exact device GUID match.
    pub fn set_guid(&mut self, guid: &Guid) {
        self.guid_value = guid.0;
        self.guid_mask = [0xFF; SIZE_GUID];
    }

    /// Returns `true` when every mask is zero.
    pub fn accepts_all(&self) -> bool {
        self.priority_mask == 0
            && self.class_mask == 0
            && self.type_mask == 0
            && self.guid_mask.iter().all(|m| *m == 0)
    }

    /// Returns `true` if `event` passes every enabled mask test.
    ///
    /// Tests run class, type, priority, then GUID, and stop at the first
    /// failure.
    pub fn matches(&self, event: &Event) -> bool {
        if self.class_mask != 0
            && (event.vscp_class & self.class_mask) != (self.class_value & self.class_mask)
        {
            return false;
        }

        if self.type_mask != 0
            && (event.vscp_type & self.type_mask) != (self.type_value & self.type_mask)
        {
            return false;
        }

        if self.priority_mask != 0 {
            let priority_bits = event.header & HEADER_PRIORITY_MASK;
            if (priority_bits & self.priority_mask) != (self.priority_value & self.priority_mask) {
                return false;
            }
        }

        self.guid_mask
            .iter()
            .zip(self.guid_value.iter())
            .zip(event.guid.0.iter())
            .all(|((mask, value), byte)| *mask == 0 || (byte & mask) == (value & mask))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
