//! Notifications a session publishes to its observers.
//!
//! Observers call [`crate::Session::subscribe`] and get a
//! `tokio::sync::broadcast::Receiver`.  Every subscriber sees every
//! notification sent after it subscribed.  A subscriber that falls more than
//! the channel capacity behind receives `RecvError::Lagged` and skips ahead;
//! the session itself never blocks on a slow observer.

use vscp_core::Event;

/// Capacity of the broadcast channel behind [`crate::Session::subscribe`].
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// Something observable happened on a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    /// The session transitioned to `Connected`.
    Connected,
    /// The session transitioned to `Disconnected`.
    Disconnected,
    /// An event was handed to the driver.
    EventSent(Event),
    /// `receive` returned an event.
    EventReceived(Event),
    /// A driver or timeout failure, with a human-readable description.
    Error(String),
}
