//! Lock-free session counters.
//!
//! # Thread safety (for beginners)
//!
//! Sends and receives can run on different tasks at the same time, so every
//! counter is an `AtomicU64`.  `fetch_add` reads, adds, and writes in one
//! indivisible step, so two tasks bumping `sent` together never lose an
//! increment.  `Ordering::Relaxed` is enough: the counters are reported, not
//! used to order other memory accesses.
//!
//! The connection timestamp is the only non-integer field and sits behind a
//! short `parking_lot::Mutex`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Live counters owned by a session.
#[derive(Debug, Default)]
pub(crate) struct SessionStatistics {
    sent: AtomicU64,
    received: AtomicU64,
    errors: AtomicU64,
    connected_at: Mutex<Option<DateTime<Utc>>>,
}

impl SessionStatistics {
    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_connected(&self, at: DateTime<Utc>) {
        *self.connected_at.lock() = Some(at);
    }

    pub(crate) fn mark_disconnected(&self) {
        *self.connected_at.lock() = None;
    }

    /// Copies the counters into a plain value.
    ///
    /// Each counter is read atomically, but the snapshot as a whole is not:
    /// a send that completes mid-snapshot may or may not be included.
    pub(crate) fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            connected_at: *self.connected_at.lock(),
        }
    }
}

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatisticsSnapshot {
    /// Events handed to the driver successfully.
    pub sent: u64,
    /// Events returned by `receive`.
    pub received: u64,
    /// Driver or timeout failures.
    pub errors: u64,
    /// When the current connection was established; `None` while disconnected.
    pub connected_at: Option<DateTime<Utc>>,
}
