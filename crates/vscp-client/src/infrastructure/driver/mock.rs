//! Mock driver adapter for unit and integration testing.
//!
//! # Why a mock driver?
//!
//! Real transports need a VSCP daemon on the other end.  The `MockDriver`
//! replaces the wire with in-memory recording: every connect, disconnect,
//! and transmitted event is pushed into a `Mutex<Vec<...>>` so assertions can
//! inspect exactly what the session asked for and in what order.
//!
//! Inbound traffic is simulated with [`MockDriver::deliver`], which pushes
//! through the sink of the most recent connection, exactly as a real driver
//! would (including the session's active filter).
//!
//! # Failure injection
//!
//! - `set_should_fail(true)` makes every trait method return
//!   [`VscpError::OperationFailed`].
//! - `set_transmit_delay(d)` makes `transmit` sleep first, to exercise the
//!   session's send timeout.
//! - `set_connect_delay(d)` does the same for `connect` and the connection
//!   timeout.
//! - `set_fail_start_incoming(true)` fails only `start_incoming`, leaving a
//!   connection the session has to close again.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use vscp_core::{Event, VscpError};

use crate::application::driver::{DriverAdapter, SessionHandle, VersionInfo};
use crate::application::session::IncomingSink;

/// Version reported by the mock.
pub const MOCK_VERSION: VersionInfo = VersionInfo::new(0, 0, 0, 1);

/// A driver that records all calls without any I/O.
#[derive(Default)]
pub struct MockDriver {
    /// Handles returned by `connect`, in order.
    pub connects: Mutex<Vec<SessionHandle>>,
    /// Handles passed to `disconnect`, in order.
    pub disconnects: Mutex<Vec<SessionHandle>>,
    /// `(handle, event)` pairs passed to `transmit`.
    pub transmitted: Mutex<Vec<(SessionHandle, Event)>>,
    /// Interfaces returned by `list_interfaces`.
    pub interfaces: Vec<String>,
    sinks: Mutex<Vec<IncomingSink>>,
    next_handle: AtomicU32,
    should_fail: AtomicBool,
    transmit_delay: Mutex<Option<Duration>>,
    connect_delay: Mutex<Option<Duration>>,
    fail_start_incoming: AtomicBool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interfaces(interfaces: Vec<String>) -> Self {
        Self {
            interfaces,
            ..Self::default()
        }
    }

    /// When `true`, every trait method fails with `OperationFailed`.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_transmit_delay(&self, delay: Option<Duration>) {
        *self.transmit_delay.lock() = delay;
    }

    pub fn set_connect_delay(&self, delay: Option<Duration>) {
        *self.connect_delay.lock() = delay;
    }

    /// When `true`, `start_incoming` fails with `OperationFailed`.
    pub fn set_fail_start_incoming(&self, fail: bool) {
        self.fail_start_incoming.store(fail, Ordering::SeqCst);
    }

    /// Pushes `event` through the latest connection's sink.
    ///
    /// Returns whether the session queued it; `false` when no connection
    /// was ever started.
    pub fn deliver(&self, event: Event) -> bool {
        let sink = self.sinks.lock().last().cloned();
        sink.map(|s| s.deliver(event)).unwrap_or(false)
    }

    /// Snapshot of the transmitted events without their handles.
    pub fn transmitted_events(&self) -> Vec<Event> {
        self.transmitted
            .lock()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn check(&self) -> Result<(), VscpError> {
        if self.should_fail.load(Ordering::SeqCst) {
            Err(VscpError::OperationFailed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DriverAdapter for MockDriver {
    async fn connect(&self) -> Result<SessionHandle, VscpError> {
        self.check()?;
        let delay = *self.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.connects.lock().push(handle);
        Ok(handle)
    }

    async fn disconnect(&self, handle: SessionHandle) -> Result<(), VscpError> {
        self.check()?;
        self.disconnects.lock().push(handle);
        Ok(())
    }

    async fn transmit(&self, handle: SessionHandle, event: &Event) -> Result<(), VscpError> {
        self.check()?;
        let delay = *self.transmit_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.transmitted.lock().push((handle, event.clone()));
        Ok(())
    }

    async fn start_incoming(
        &self,
        _handle: SessionHandle,
        sink: IncomingSink,
    ) -> Result<(), VscpError> {
        self.check()?;
        if self.fail_start_incoming.load(Ordering::SeqCst) {
            return Err(VscpError::OperationFailed);
        }
        self.sinks.lock().push(sink);
        Ok(())
    }

    async fn list_interfaces(&self) -> Result<Vec<String>, VscpError> {
        self.check()?;
        Ok(self.interfaces.clone())
    }

    async fn version(&self) -> Result<VersionInfo, VscpError> {
        self.check()?;
        Ok(MOCK_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_connect_and_disconnect() {
        // Arrange
        let mock = MockDriver::new();

        // Act
        let h = mock.connect().await.unwrap();
        mock.disconnect(h).await.unwrap();

        // Assert
        assert_eq!(*mock.connects.lock(), vec![h]);
        assert_eq!(*mock.disconnects.lock(), vec![h]);
    }

    #[tokio::test]
    async fn test_mock_should_fail_returns_operation_failed() {
        let mock = MockDriver::new();
        mock.set_should_fail(true);

        assert_eq!(mock.connect().await, Err(VscpError::OperationFailed));
        assert_eq!(mock.version().await, Err(VscpError::OperationFailed));
        assert!(mock.connects.lock().is_empty());
    }

    #[tokio::test]
    async fn test_mock_records_transmitted_events_in_order() {
        let mock = MockDriver::new();
        let h = mock.connect().await.unwrap();

        mock.transmit(h, &Event::new(1, 1)).await.unwrap();
        mock.transmit(h, &Event::new(1, 2)).await.unwrap();

        let types: Vec<u16> = mock.transmitted_events().iter().map(|e| e.vscp_type).collect();
        assert_eq!(types, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_delay_holds_connect_back() {
        let mock = MockDriver::new();
        mock.set_connect_delay(Some(Duration::from_secs(3)));
        let started = tokio::time::Instant::now();

        mock.connect().await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[test]
    fn test_deliver_without_sink_is_false() {
        let mock = MockDriver::new();
        assert!(!mock.deliver(Event::new(1, 1)));
    }
}
