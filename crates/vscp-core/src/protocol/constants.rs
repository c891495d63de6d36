//! VSCP Level-2 protocol constants.
//!
//! Values follow the VSCP driver interface definitions (`vscp.h` and
//! `level2drvdef.h`).

// ── Size limits ───────────────────────────────────────────────────────────────

/// Maximum Level-2 payload length in bytes.
pub const MAX_DATA: usize = 512;

/// Size of a device GUID in bytes.
pub const SIZE_GUID: usize = 16;

// ── Header byte layout ────────────────────────────────────────────────────────

/// Bits [7:5] of the header hold the priority (0 = highest, 7 = lowest).
pub const HEADER_PRIORITY_MASK: u8 = 0xE0;

/// Shift that moves a 0..7 priority into [`HEADER_PRIORITY_MASK`].
pub const HEADER_PRIORITY_SHIFT: u8 = 5;

/// Bit 4: the device GUID is fixed in firmware.
pub const HEADER_HARD_CODED: u8 = 0x10;

/// Bit 3: the event carries no CRC.
pub const HEADER_NO_CRC: u8 = 0x08;

/// Header-byte priority values, already shifted into bits [7:5].
pub mod priority {
    pub const PRIORITY_0: u8 = 0x00;
    pub const PRIORITY_1: u8 = 0x20;
    pub const PRIORITY_2: u8 = 0x40;
    pub const PRIORITY_3: u8 = 0x60;
    pub const PRIORITY_4: u8 = 0x80;
    pub const PRIORITY_5: u8 = 0xA0;
    pub const PRIORITY_6: u8 = 0xC0;
    pub const PRIORITY_7: u8 = 0xE0;

    pub const HIGH: u8 = PRIORITY_0;
    pub const NORMAL: u8 = PRIORITY_3;
    pub const MEDIUM: u8 = PRIORITY_6;
    pub const LOW: u8 = PRIORITY_7;
}

// ── Transport defaults ────────────────────────────────────────────────────────

/// Default TCP port of a VSCP daemon.
pub const DEFAULT_TCP_PORT: u16 = 9598;

/// Default UDP port.
pub const DEFAULT_UDP_PORT: u16 = 33333;

/// Default multicast port.
pub const DEFAULT_MULTICAST_PORT: u16 = 44444;

/// Default response timeout in milliseconds.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 3000;

/// Default bound on the session delivery queue.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

// ── Flags and capabilities ────────────────────────────────────────────────────

/// Session configuration flag bits.
pub mod flags {
    /// Enables per-event debug logging.
    pub const ENABLE_DEBUG: u32 = 0x8000_0000;
}

/// Capability bits reported by a session ("what can you do").
pub mod capabilities {
    /// Basic Level-2 event support.
    pub const LEVEL2: u32 = 1 << 0;
}
