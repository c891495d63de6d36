//! DriverAdapter: the port through which a session reaches its transport.
//!
//! The session never opens sockets itself.  A driver adapter owns the
//! transport, hands out an opaque [`SessionHandle`] on connect, transmits
//! events, and pushes inbound events back into the session through the
//! [`IncomingSink`] it receives from [`DriverAdapter::start_incoming`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vscp_core::{Event, VscpError};

use super::session::IncomingSink;

/// Opaque token identifying one live connection inside a driver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u32);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Driver or library version as `major.minor.release.build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: u8,
    pub minor: u8,
    pub release: u8,
    pub build: u8,
}

impl VersionInfo {
    pub const fn new(major: u8, minor: u8, release: u8, build: u8) -> Self {
        Self {
            major,
            minor,
            release,
            build,
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.release, self.build
        )
    }
}

/// Transport-specific half of a VSCP client.
///
/// Implementations must be `Send + Sync` because a session is shared between
/// tasks behind an `Arc`.  Every method may be called concurrently; a driver
/// protects its own connection table.
///
/// Errors are reported as [`VscpError`] kinds.  The session translates
/// transport failures on `transmit` into [`VscpError::WriteError`], so a
/// driver is free to return the most specific kind it has.
#[async_trait]
pub trait DriverAdapter: Send + Sync {
    /// Opens a connection and returns its handle.
    async fn connect(&self) -> Result<SessionHandle, VscpError>;

    /// Closes the connection identified by `handle`.
    async fn disconnect(&self, handle: SessionHandle) -> Result<(), VscpError>;

    /// Puts one event on the wire.
    async fn transmit(&self, handle: SessionHandle, event: &Event) -> Result<(), VscpError>;

    /// Begins pushing inbound events for `handle` into `sink`.
    ///
    /// The driver must call [`IncomingSink::deliver`] for every inbound
    /// event; the sink applies the session's active filter.
    async fn start_incoming(&self, handle: SessionHandle, sink: IncomingSink)
        -> Result<(), VscpError>;

    /// Names of the interfaces this driver can reach.
    async fn list_interfaces(&self) -> Result<Vec<String>, VscpError>;

    /// Version of the driver.
    async fn version(&self) -> Result<VersionInfo, VscpError>;
}
