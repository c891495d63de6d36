//! Fixed-size 16-byte device identifier (VSCP GUID).
//!
//! # String form
//!
//! VSCP tools print a GUID as sixteen colon-separated hex pairs, most
//! significant byte first:
//!
//! ```text
//! FF:FF:FF:FF:FF:FF:FF:FE:00:16:D4:FF:FE:00:00:01
//! ```
//!
//! [`Guid::from_str`](std::str::FromStr) accepts the same form.  Fewer than
//! sixteen pairs are allowed; the missing trailing bytes are zero.  An empty
//! string or a single `-` is the null GUID.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::constants::SIZE_GUID;

/// Errors produced when parsing a GUID string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuidParseError {
    /// More than sixteen hex pairs were supplied.
    #[error("GUID has {0} bytes, at most 16 allowed")]
    TooLong(usize),

    /// A component was not a one- or two-digit hex number.
    #[error("invalid GUID byte {0:?}")]
    InvalidByte(String),
}

/// A 16-byte VSCP device identifier.
///
/// The inner array is always exactly [`SIZE_GUID`] bytes; constructors that
/// accept arbitrary slices pad or truncate rather than resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid(pub [u8; SIZE_GUID]);

impl Guid {
    /// The all-zero GUID.
    pub const NULL: Guid = Guid([0u8; SIZE_GUID]);

    /// Builds a GUID from any slice.
    ///
    /// Copies `min(len, 16)` bytes; remaining bytes stay zero.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = [0u8; SIZE_GUID];
        let n = bytes.len().min(SIZE_GUID);
        out[..n].copy_from_slice(&bytes[..n]);
        Guid(out)
    }

    /// Generates a random RFC-4122 v4 GUID.
    pub fn new_random() -> Self {
        Guid::from(Uuid::new_v4())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIZE_GUID] {
        &self.0
    }

    /// Returns `true` when every byte is zero.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<[u8; SIZE_GUID]> for Guid {
    fn from(bytes: [u8; SIZE_GUID]) -> Self {
        Guid(bytes)
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Guid(*uuid.as_bytes())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return Ok(Guid::NULL);
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() > SIZE_GUID {
            return Err(GuidParseError::TooLong(parts.len()));
        }

        let mut out = [0u8; SIZE_GUID];
        for (slot, part) in out.iter_mut().zip(parts.iter()) {
            let part = part.trim();
            if part.is_empty() || part.len() > 2 {
                return Err(GuidParseError::InvalidByte(part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| GuidParseError::InvalidByte(part.to_string()))?;
        }
        Ok(Guid(out))
    }
}
