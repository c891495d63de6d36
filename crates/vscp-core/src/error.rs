//! VSCP error kinds.
//!
//! The VSCP driver interface reports outcomes as small negative integers
//! (`0` is success).  In Rust, success is `Ok(..)` and every failure is a
//! [`VscpError`] variant; [`VscpError::code`] and [`VscpError::from_code`]
//! convert to and from the numeric form used by drivers and daemons.

use thiserror::Error;

/// Numeric code for a successful operation.
pub const SUCCESS_CODE: i32 = 0;

/// Errors returned by events, sessions, and driver adapters.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum VscpError {
    /// Unspecified failure.
    #[error("general failure")]
    General,

    /// The session handle is unknown to the driver.
    #[error("invalid session handle")]
    InvalidHandle,

    /// An argument was out of range (for example a payload over 512 bytes).
    #[error("invalid parameter")]
    InvalidParameter,

    /// The operation did not complete before its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The session is not connected.
    #[error("not connected")]
    NotConnected,

    /// The driver failed to transmit an event.
    #[error("write error")]
    WriteError,

    /// The driver failed to read an event.
    #[error("read error")]
    ReadError,

    /// A required reference was missing.
    #[error("invalid pointer")]
    InvalidPointer,

    /// The driver refused or failed the operation.
    #[error("operation failed")]
    OperationFailed,
}

impl VscpError {
    /// Returns the VSCP numeric error code (`-1` to `-9`).
    pub fn code(self) -> i32 {
        match self {
            VscpError::General => -1,
            VscpError::InvalidHandle => -2,
            VscpError::InvalidParameter => -3,
            VscpError::Timeout => -4,
            VscpError::NotConnected => -5,
            VscpError::WriteError => -6,
            VscpError::ReadError => -7,
            VscpError::InvalidPointer => -8,
            VscpError::OperationFailed => -9,
        }
    }

    /// Maps a VSCP numeric code back to a result.
    ///
    /// `0` maps to `Ok(())`.  Unknown codes map to [`VscpError::General`].
    pub fn from_code(code: i32) -> Result<(), VscpError> {
        match code {
            SUCCESS_CODE => Ok(()),
            -2 => Err(VscpError::InvalidHandle),
            -3 => Err(VscpError::InvalidParameter),
            -4 => Err(VscpError::Timeout),
            -5 => Err(VscpError::NotConnected),
            -6 => Err(VscpError::WriteError),
            -7 => Err(VscpError::ReadError),
            -8 => Err(VscpError::InvalidPointer),
            -9 => Err(VscpError::OperationFailed),
            _ => Err(VscpError::General),
        }
    }
}
