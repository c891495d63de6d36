//! Binary frame codec for carrying VSCP events over a byte stream.
//!
//! Wire format (all multi-byte integers big-endian):
//! ```text
//! [head:1][obid:4][year:2][month:1][day:1][hour:1][minute:1][second:1]
//! [microseconds:4][class:2][type:2][guid:16][size:2][crc:2][payload:size]
//! ```
//! Fixed part: 40 bytes.  The CRC field is carried verbatim; this codec never
//! computes or checks it.

use thiserror::Error;

use crate::protocol::constants::{MAX_DATA, SIZE_GUID};
use crate::protocol::event::{Event, EventTimestamp};
use crate::protocol::guid::Guid;

/// Size of the fixed part of a frame, before the payload.
pub const FRAME_HEADER_SIZE: usize = 40;

/// Offset of the 2-byte payload length inside the fixed part.
pub const FRAME_SIZE_OFFSET: usize = 36;

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The byte slice is shorter than the fixed frame part.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The payload is longer than a Level-2 envelope allows.
    #[error("payload of {0} bytes exceeds the 512-byte limit")]
    PayloadTooLarge(usize),

    /// The declared payload length does not fit in the remaining bytes.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`Event`] into a frame.
///
/// # Errors
///
/// Returns [`CodecError::PayloadTooLarge`] when the payload exceeds
/// [`MAX_DATA`].
///
/// # Examples
///
/// ```rust
/// use vscp_core::{decode_event, encode_event, Event};
///
/// let event = Event::new(10, 6).with_payload(vec![0x89, 0x02]);
/// let bytes = encode_event(&event).unwrap();
/// let (decoded, consumed) = decode_event(&bytes).unwrap();
/// assert_eq!(decoded, event);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_event(event: &Event) -> Result<Vec<u8>, CodecError> {
    let payload = event.payload();
    if payload.len() > MAX_DATA {
        return Err(CodecError::PayloadTooLarge(payload.len()));
    }

    let ts = &event.timestamp;
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.push(event.header);
    buf.extend_from_slice(&event.obid.to_be_bytes());
    buf.extend_from_slice(&ts.year.to_be_bytes());
    buf.push(ts.month);
    buf.push(ts.day);
    buf.push(ts.hour);
    buf.push(ts.minute);
    buf.push(ts.second);
    buf.extend_from_slice(&ts.microseconds.to_be_bytes());
    buf.extend_from_slice(&event.vscp_class.to_be_bytes());
    buf.extend_from_slice(&event.vscp_type.to_be_bytes());
    buf.extend_from_slice(event.guid.as_bytes());
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(&event.crc.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes one [`Event`] from the beginning of `bytes`.
///
/// Returns the event and the number of bytes consumed, so the caller can
/// advance their read cursor.
///
/// # Errors
///
/// Returns [`CodecError`] if the bytes are truncated or the declared payload
/// is too large.
pub fn decode_event(bytes: &[u8]) -> Result<(Event, usize), CodecError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: FRAME_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let size = payload_len(bytes)?;
    if size > MAX_DATA {
        return Err(CodecError::PayloadTooLarge(size));
    }
    let total = FRAME_HEADER_SIZE + size;
    if bytes.len() < total {
        return Err(CodecError::PayloadLengthMismatch {
            declared: size,
            available: bytes.len() - FRAME_HEADER_SIZE,
        });
    }

    let b = bytes;
    let mut event = Event::new(read_u16(b, 16), read_u16(b, 18));
    event.header = b[0];
    event.obid = u32::from_be_bytes([b[1], b[2], b[3], b[4]]);
    event.timestamp = EventTimestamp {
        year: read_u16(b, 5),
        month: b[7],
        day: b[8],
        hour: b[9],
        minute: b[10],
        second: b[11],
        microseconds: u32::from_be_bytes([b[12], b[13], b[14], b[15]]),
    };
    event.guid = Guid::from_slice(&b[20..20 + SIZE_GUID]);
    event.crc = read_u16(b, 38);
    event.set_payload(&b[FRAME_HEADER_SIZE..total]);
    Ok((event, total))
}

/// Reads the declared payload length from a frame's fixed part.
///
/// Stream readers use this to learn how many more bytes to pull after the
/// first [`FRAME_HEADER_SIZE`] bytes.
///
/// # Errors
///
/// Returns [`CodecError::InsufficientData`] if the fixed part is incomplete.
pub fn payload_len(header: &[u8]) -> Result<usize, CodecError> {
    if header.len() < FRAME_HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: FRAME_HEADER_SIZE,
            available: header.len(),
        });
    }
    Ok(read_u16(header, FRAME_SIZE_OFFSET) as usize)
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
