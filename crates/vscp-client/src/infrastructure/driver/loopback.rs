//! In-process loopback driver.
//!
//! Every event the session transmits comes straight back as an inbound
//! event.  Nothing leaves the process, which makes the loopback driver useful
//! for demos, for exercising the ingestion filter end to end, and as a
//! template for real transports.
//!
//! # How the echo works
//!
//! ```text
//! Session::send ─▶ transmit ─▶ mpsc::Sender ─▶ [echo task] ─▶ IncomingSink::deliver
//!                                                               │
//!                                                               ▼
//!                                                       filter → queue
//! ```
//!
//! `start_incoming` spawns one echo task per connection.  The task owns the
//! `mpsc::Receiver` and ends when `disconnect` drops the matching sender.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};
use vscp_core::{Event, VscpError};

use crate::application::driver::{DriverAdapter, SessionHandle, VersionInfo};
use crate::application::session::IncomingSink;

/// Version reported by the loopback driver.
pub const LOOPBACK_VERSION: VersionInfo = VersionInfo::new(15, 0, 3, 0);

/// Depth of each connection's echo channel.
const ECHO_CHANNEL_CAPACITY: usize = 256;

/// Driver that echoes transmitted events back to the session.
pub struct LoopbackDriver {
    interface: String,
    next_handle: AtomicU32,
    /// Open connections; `Some` once `start_incoming` attached an echo task.
    links: Mutex<HashMap<SessionHandle, Option<mpsc::Sender<Event>>>>,
}

impl LoopbackDriver {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            next_handle: AtomicU32::new(1),
            links: Mutex::new(HashMap::new()),
        }
    }

    /// Number of open connections.
    pub fn open_connections(&self) -> usize {
        self.links.lock().len()
    }

    /// Feeds `event` into every open connection as if a remote node sent it.
    ///
    /// Returns how many connections accepted it into their echo channel.
    pub async fn simulate_incoming(&self, event: &Event) -> usize {
        let senders: Vec<mpsc::Sender<Event>> =
            self.links.lock().values().flatten().cloned().collect();
        let mut accepted = 0;
        for tx in senders {
            if tx.send(event.clone()).await.is_ok() {
                accepted += 1;
            }
        }
        accepted
    }
}

#[async_trait]
impl DriverAdapter for LoopbackDriver {
    async fn connect(&self) -> Result<SessionHandle, VscpError> {
        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.links.lock().insert(handle, None);
        info!(%handle, interface = %self.interface, "loopback connection opened");
        Ok(handle)
    }

    async fn disconnect(&self, handle: SessionHandle) -> Result<(), VscpError> {
        // Dropping the sender ends the echo task.
        match self.links.lock().remove(&handle) {
            Some(_) => {
                info!(%handle, "loopback connection closed");
                Ok(())
            }
            None => Err(VscpError::InvalidHandle),
        }
    }

    async fn transmit(&self, handle: SessionHandle, event: &Event) -> Result<(), VscpError> {
        let tx = match self.links.lock().get(&handle) {
            None => return Err(VscpError::InvalidHandle),
            Some(None) => return Err(VscpError::NotConnected),
            Some(Some(tx)) => tx.clone(),
        };
        tx.send(event.clone())
            .await
            .map_err(|_| VscpError::WriteError)
    }

    async fn start_incoming(
        &self,
        handle: SessionHandle,
        sink: IncomingSink,
    ) -> Result<(), VscpError> {
        let (tx, mut rx) = mpsc::channel::<Event>(ECHO_CHANNEL_CAPACITY);
        {
            let mut links = self.links.lock();
            let slot = links.get_mut(&handle).ok_or(VscpError::InvalidHandle)?;
            *slot = Some(tx);
        }

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !sink.deliver(event) && !sink.is_open() {
                    break;
                }
            }
            debug!(%handle, "loopback echo task finished");
        });
        Ok(())
    }

    async fn list_interfaces(&self) -> Result<Vec<String>, VscpError> {
        Ok(vec![self.interface.clone()])
    }

    async fn version(&self) -> Result<VersionInfo, VscpError> {
        Ok(LOOPBACK_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handles_are_unique_and_increasing() {
        let driver = LoopbackDriver::new("loopback");

        let a = driver.connect().await.unwrap();
        let b = driver.connect().await.unwrap();

        assert_ne!(a, b);
        assert!(b.0 > a.0);
        assert_eq!(driver.open_connections(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_handle_is_invalid_handle() {
        let driver = LoopbackDriver::new("loopback");
        assert_eq!(
            driver.disconnect(SessionHandle(99)).await,
            Err(VscpError::InvalidHandle)
        );
    }

    #[tokio::test]
    async fn test_transmit_on_unknown_handle_is_invalid_handle() {
        let driver = LoopbackDriver::new("loopback");
        assert_eq!(
            driver.transmit(SessionHandle(5), &Event::new(1, 1)).await,
            Err(VscpError::InvalidHandle)
        );
    }

    #[tokio::test]
    async fn test_reports_version_and_configured_interface() {
        let driver = LoopbackDriver::new("tcp://127.0.0.1:9598");

        assert_eq!(driver.version().await.unwrap().to_string(), "15.0.3.0");
        assert_eq!(
            driver.list_interfaces().await.unwrap(),
            vec!["tcp://127.0.0.1:9598".to_string()]
        );
    }
}
