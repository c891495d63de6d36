//! The VSCP Level-2 event envelope.
//!
//! # Header byte (for beginners)
//!
//! Several small flags share one byte so the envelope stays compact:
//!
//! ```text
//!  bit  7   6   5   4   3   2   1   0
//!     [ priority  ][HC][NC][reserved ]
//! ```
//!
//! - **priority** (bits 7..5): 0 is the most urgent, 7 the least.
//! - **HC** (bit 4): the device GUID is hard-coded in firmware.
//! - **NC** (bit 3): the event carries no CRC.
//!
//! The setters below change only their own bits; everything else in the
//! header is preserved.
//!
//! # Self-describing record
//!
//! [`Event::to_json`] and [`Event::from_json`] transcribe an event field for
//! field into a JSON object.  Nothing is computed on the way: the CRC is
//! carried as-is and `size_data` is written for readers but ignored on
//! import, because the payload length is always derived from the payload.
//! Import also accepts the `GUID` and `sizeData` key spellings.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::constants::{
    HEADER_HARD_CODED, HEADER_NO_CRC, HEADER_PRIORITY_MASK, HEADER_PRIORITY_SHIFT, MAX_DATA,
};
use crate::protocol::guid::Guid;

/// UTC wall-clock time attached to an event.
///
/// A zero year, month, or day means "not stamped yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Microseconds into the current second (0..=999_999).
    pub microseconds: u32,
}

impl EventTimestamp {
    /// Captures the current UTC time.
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// Splits a UTC instant into the calendar fields.
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            year: dt.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            // chrono reports leap seconds as >= 1_000_000 µs.
            microseconds: dt.timestamp_subsec_micros().min(999_999),
        }
    }

    /// Returns `true` when year, month, and day are all set.
    pub fn has_date(&self) -> bool {
        self.year != 0 && self.month != 0 && self.day != 0
    }
}

/// One VSCP Level-2 event.
///
/// `Event` is a plain value: the session clones it into its queue and into
/// notifications, so later changes to the caller's copy never leak into a
/// queued one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "EventRecord", into = "EventRecord")]
pub struct Event {
    /// Pass-through CRC; never computed here.
    pub crc: u16,
    /// Pass-through object id assigned by drivers.
    pub obid: u32,
    /// Capture time.
    pub timestamp: EventTimestamp,
    /// Packed priority and flag bits.
    pub header: u8,
    pub vscp_class: u16,
    pub vscp_type: u16,
    /// Originating device.
    pub guid: Guid,
    payload: Vec<u8>,
}

impl Event {
    /// Creates an event with the given class and type and everything else zero.
    pub fn new(vscp_class: u16, vscp_type: u16) -> Self {
        Self {
            vscp_class,
            vscp_type,
            ..Self::default()
        }
    }

    /// Sets the device GUID from a slice of any length (padded or truncated to 16).
    pub fn with_guid(mut self, bytes: &[u8]) -> Self {
        self.guid = Guid::from_slice(bytes);
        self
    }

    /// Replaces the payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Sets the priority (see [`Event::set_priority`]).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.set_priority(priority);
        self
    }

    // ── Header bits ───────────────────────────────────────────────────────────

    /// Returns the 0..=7 priority from header bits [7:5].
    pub fn priority(&self) -> u8 {
        (self.header & HEADER_PRIORITY_MASK) >> HEADER_PRIORITY_SHIFT
    }

    /// Writes `priority & 0x07` into header bits [7:5].
    ///
    /// Out-of-range values are masked, not rejected.
    pub fn set_priority(&mut self, priority: u8) {
        self.header =
            (self.header & !HEADER_PRIORITY_MASK) | ((priority & 0x07) << HEADER_PRIORITY_SHIFT);
    }

    pub fn is_hard_coded(&self) -> bool {
        self.header & HEADER_HARD_CODED != 0
    }

    pub fn set_hard_coded(&mut self, hard_coded: bool) {
        if hard_coded {
            self.header |= HEADER_HARD_CODED;
        } else {
            self.header &= !HEADER_HARD_CODED;
        }
    }

    pub fn is_no_crc(&self) -> bool {
        self.header & HEADER_NO_CRC != 0
    }

    pub fn set_no_crc(&mut self, no_crc: bool) {
        if no_crc {
            self.header |= HEADER_NO_CRC;
        } else {
            self.header &= !HEADER_NO_CRC;
        }
    }

    // ── Time ──────────────────────────────────────────────────────────────────

    /// Stamps the event with the current UTC time.
    pub fn set_current_time(&mut self) {
        self.timestamp = EventTimestamp::now();
    }

    /// Returns `true` when the calendar date has been set.
    pub fn has_timestamp(&self) -> bool {
        self.timestamp.has_date()
    }

    // ── Payload ───────────────────────────────────────────────────────────────

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of payload bytes; always equal to `payload().len()`.
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }

    /// Returns `true` when the payload fits in a Level-2 envelope.
    pub fn payload_within_limit(&self) -> bool {
        self.payload.len() <= MAX_DATA
    }

    // ── Record form ───────────────────────────────────────────────────────────

    /// Serializes the event into its JSON record.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuilds an event from its JSON record.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not a valid record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Flat on-disk / on-wire shape of an [`Event`].
///
/// Field names follow the VSCP JSON event format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    #[serde(default)]
    crc: u16,
    #[serde(default)]
    obid: u32,
    #[serde(default)]
    year: u16,
    #[serde(default)]
    month: u8,
    #[serde(default)]
    day: u8,
    #[serde(default)]
    hour: u8,
    #[serde(default)]
    minute: u8,
    #[serde(default)]
    second: u8,
    /// Microseconds into the second.
    #[serde(default)]
    timestamp: u32,
    #[serde(default)]
    head: u8,
    #[serde(default)]
    vscp_class: u16,
    #[serde(default)]
    vscp_type: u16,
    #[serde(default, alias = "GUID")]
    guid: Vec<u8>,
    #[serde(default, alias = "sizeData")]
    size_data: usize,
    #[serde(default)]
    data: Vec<u8>,
}

impl From<Event> for EventRecord {
    fn from(e: Event) -> Self {
        Self {
            crc: e.crc,
            obid: e.obid,
            year: e.timestamp.year,
            month: e.timestamp.month,
            day: e.timestamp.day,
            hour: e.timestamp.hour,
            minute: e.timestamp.minute,
            second: e.timestamp.second,
            timestamp: e.timestamp.microseconds,
            head: e.header,
            vscp_class: e.vscp_class,
            vscp_type: e.vscp_type,
            guid: e.guid.0.to_vec(),
            size_data: e.payload.len(),
            data: e.payload,
        }
    }
}

impl From<EventRecord> for Event {
    fn from(r: EventRecord) -> Self {
        // `size_data` is informational only.
        Self {
            crc: r.crc,
            obid: r.obid,
            timestamp: EventTimestamp {
                year: r.year,
                month: r.month,
                day: r.day,
                hour: r.hour,
                minute: r.minute,
                second: r.second,
                microseconds: r.timestamp,
            },
            header: r.head,
            vscp_class: r.vscp_class,
            vscp_type: r.vscp_type,
            guid: Guid::from_slice(&r.guid),
            payload: r.data,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
