//! Session: the VSCP client use case.
//!
//! A [`Session`] owns one logical connection to a VSCP daemon or device
//! through an injected [`DriverAdapter`].  It is meant to be shared behind an
//! `Arc` and driven from several tasks at once:
//!
//! - any number of producers append to the receive queue, either the driver
//!   (through an [`IncomingSink`]) or the application via
//!   [`Session::inject_event`];
//! - any number of consumers call [`Session::receive`].
//!
//! # The receive queue
//!
//! The queue is a `VecDeque<Event>` behind a `parking_lot::Mutex`.  The lock
//! is only ever held for a push or a pop, never across an `.await`.  When the
//! queue is full the oldest event is evicted inside the same critical section
//! as the append, so the queue never holds more than `max_queue_size` events.
//!
//! # Waking a waiting receive
//!
//! Producers call `Notify::notify_one` after every append.  A consumer
//! registers its `Notified` future (`enable()`) *before* it re-checks the
//! queue, so an append that lands between the check and the `.await` still
//! wakes it.  Each event is popped by exactly one consumer.
//!
//! # Filtering
//!
//! The active filter is stored here but applied by the driver at ingestion
//! through [`IncomingSink::deliver`].  `receive` never re-filters, and
//! `inject_event` bypasses the filter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, warn};
use vscp_core::protocol::{capabilities, MAX_DATA};
use vscp_core::{Event, EventFilter, VscpError};

use super::config::{timeout_millis, ConfigError, SessionConfig, SessionConfigUpdate};
use super::driver::{DriverAdapter, SessionHandle, VersionInfo};
use super::notifications::{SessionNotification, NOTIFICATION_CHANNEL_CAPACITY};
use super::statistics::{SessionStatistics, StatisticsSnapshot};

// ── Connection state ──────────────────────────────────────────────────────────

/// The two states of a session.  Both are re-enterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
}

// ── Shared inbox ──────────────────────────────────────────────────────────────

/// Queue contents and the live handle, guarded together.
///
/// A sink compares its handle and appends under one lock, and `close`
/// clears the handle and the queue under that same lock, so nothing a closed
/// connection delivers can outlive the disconnect.
#[derive(Debug, Default)]
struct Slots {
    events: VecDeque<Event>,
    handle: Option<SessionHandle>,
}

impl Slots {
    /// Appends `event`, evicting from the front while at `capacity`.
    ///
    /// Returns how many events were evicted.
    fn append(&mut self, event: Event, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.events.len() >= capacity.max(1) {
            self.events.pop_front();
            evicted += 1;
        }
        self.events.push_back(event);
        evicted
    }
}

/// State shared between the session and every sink handed to the driver.
#[derive(Debug)]
struct Inbox {
    slots: Mutex<Slots>,
    capacity: AtomicUsize,
    ready: Notify,
    filter: RwLock<Option<EventFilter>>,
    /// Mirror of the debug flag so sinks can gate per-event logging.
    debug: AtomicBool,
}

impl Inbox {
    fn new(capacity: usize, debug: bool) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            capacity: AtomicUsize::new(capacity),
            ready: Notify::new(),
            filter: RwLock::new(None),
            debug: AtomicBool::new(debug),
        }
    }

    /// Appends unconditionally.  Returns how many events were evicted.
    fn push(&self, event: Event) -> usize {
        let evicted = {
            let mut slots = self.slots.lock();
            slots.append(event, self.capacity.load(Ordering::Relaxed))
        };
        self.ready.notify_one();
        evicted
    }

    /// Appends only while `handle` is the live connection.
    ///
    /// Returns the eviction count, or `None` when the connection is closed.
    fn push_for(&self, handle: SessionHandle, event: Event) -> Option<usize> {
        let evicted = {
            let mut slots = self.slots.lock();
            if slots.handle != Some(handle) {
                return None;
            }
            slots.append(event, self.capacity.load(Ordering::Relaxed))
        };
        self.ready.notify_one();
        Some(evicted)
    }

    fn pop(&self) -> Option<Event> {
        self.slots.lock().events.pop_front()
    }

    fn len(&self) -> usize {
        self.slots.lock().events.len()
    }

    fn clear(&self) {
        self.slots.lock().events.clear();
    }

    /// Changes the bound, dropping the oldest entries that no longer fit.
    fn resize(&self, capacity: usize) {
        let mut slots = self.slots.lock();
        self.capacity.store(capacity, Ordering::Relaxed);
        while slots.events.len() > capacity {
            slots.events.pop_front();
        }
    }

    fn current_handle(&self) -> Option<SessionHandle> {
        self.slots.lock().handle
    }

    fn set_handle(&self, handle: Option<SessionHandle>) {
        self.slots.lock().handle = handle;
    }

    /// Takes the live handle and empties the queue in one step.
    fn close(&self) -> Option<SessionHandle> {
        let handle = {
            let mut slots = self.slots.lock();
            let handle = slots.handle.take();
            if handle.is_some() {
                slots.events.clear();
            }
            handle
        };
        if handle.is_some() {
            self.ready.notify_waiters();
        }
        handle
    }

    fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Waits until an event can be popped.
    ///
    /// Returns `None` once the session is no longer connected, so a pending
    /// receive ends promptly on disconnect instead of running out its timeout.
    async fn next_event(&self) -> Option<Event> {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut slots = self.slots.lock();
                if slots.handle.is_none() {
                    return None;
                }
                if let Some(event) = slots.events.pop_front() {
                    return Some(event);
                }
            }
            notified.await;
        }
    }
}

// ── Ingestion sink ────────────────────────────────────────────────────────────

/// Handle through which a driver pushes inbound events into a session.
///
/// A sink is bound to the [`SessionHandle`] it was created for.  Once that
/// connection is closed, `deliver` drops everything, so a driver task that
/// outlives its connection cannot refill the queue.
#[derive(Debug, Clone)]
pub struct IncomingSink {
    inbox: Arc<Inbox>,
    handle: SessionHandle,
}

impl IncomingSink {
    /// Offers one inbound event to the session.
    ///
    /// The event is queued when the sink's connection is still the current
    /// one and the active filter (if any) accepts it.  Returns whether the
    /// event was queued.
    pub fn deliver(&self, event: Event) -> bool {
        let filter = *self.inbox.filter.read();
        if let Some(filter) = filter {
            if !filter.matches(&event) {
                return false;
            }
        }

        match self.inbox.push_for(self.handle, event) {
            None => {
                debug!(handle = %self.handle, "dropping event for a closed connection");
                false
            }
            Some(evicted) => {
                if evicted > 0 && self.inbox.debug_enabled() {
                    debug!(evicted, "receive queue full, dropped oldest events");
                }
                true
            }
        }
    }

    /// The connection this sink delivers for.
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// `false` once the connection this sink belongs to has been closed.
    pub fn is_open(&self) -> bool {
        self.inbox.current_handle() == Some(self.handle)
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A VSCP Level-2 client session.
pub struct Session {
    driver: Arc<dyn DriverAdapter>,
    config: RwLock<SessionConfig>,
    inbox: Arc<Inbox>,
    /// Serializes connect/disconnect so two callers cannot both open a link.
    lifecycle: tokio::sync::Mutex<()>,
    stats: SessionStatistics,
    notifications: broadcast::Sender<SessionNotification>,
}

impl Session {
    /// Creates a disconnected session.
    ///
    /// # Errors
    ///
    /// Returns [`VscpError::InvalidParameter`] when `config` fails
    /// validation (a zero `max_queue_size`).
    pub fn new(config: SessionConfig, driver: Arc<dyn DriverAdapter>) -> Result<Self, VscpError> {
        if let Err(e) = config.validate() {
            warn!("rejecting session config: {e}");
            return Err(VscpError::InvalidParameter);
        }
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Ok(Self {
            driver,
            inbox: Arc::new(Inbox::new(config.max_queue_size, config.debug_enabled())),
            config: RwLock::new(config),
            lifecycle: tokio::sync::Mutex::new(()),
            stats: SessionStatistics::default(),
            notifications,
        })
    }

    // ── State ─────────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        if self.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inbox.current_handle().is_some()
    }

    /// The driver handle of the live connection, if any.
    pub fn handle(&self) -> Option<SessionHandle> {
        self.inbox.current_handle()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Opens the connection.  Succeeds without doing anything when already
    /// connected.
    ///
    /// The driver's `connect` is bounded by the configured connection
    /// timeout (unbounded when it is zero).
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or [`VscpError::Timeout`] when the
    /// connection timeout expires.  Either way the session stays
    /// disconnected.
    pub async fn connect(&self) -> Result<(), VscpError> {
        let _guard = self.lifecycle.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        let (interface, connect_timeout) = {
            let cfg = self.config.read();
            (cfg.interface.clone(), cfg.connection_timeout())
        };

        let attempt = self.driver.connect();
        let outcome = match connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(VscpError::Timeout),
            },
            None => attempt.await,
        };
        let handle = match outcome {
            Ok(handle) => handle,
            Err(e) => {
                self.report_failure("connect", e);
                return Err(e);
            }
        };

        // Publish the handle before starting delivery so the sink accepts
        // events the driver pushes immediately.
        self.inbox.set_handle(Some(handle));
        let sink = IncomingSink {
            inbox: Arc::clone(&self.inbox),
            handle,
        };
        if let Err(e) = self.driver.start_incoming(handle, sink).await {
            self.inbox.set_handle(None);
            if let Err(close_err) = self.driver.disconnect(handle).await {
                debug!(%handle, "closing half-open connection failed: {close_err}");
            }
            self.report_failure("start incoming delivery", e);
            return Err(e);
        }

        self.stats.mark_connected(Utc::now());
        info!(%handle, interface = %interface, "session connected");
        self.publish(SessionNotification::Connected);
        Ok(())
    }

    /// Closes the connection.  Succeeds without doing anything when already
    /// disconnected.
    ///
    /// Local state is always torn down: the handle is cleared, the queue is
    /// emptied, and pending receives return [`VscpError::NotConnected`].
    ///
    /// # Errors
    ///
    /// Returns the driver's error when its `disconnect` fails.  The session
    /// is disconnected regardless.
    pub async fn disconnect(&self) -> Result<(), VscpError> {
        let _guard = self.lifecycle.lock().await;
        let Some(handle) = self.inbox.close() else {
            return Ok(());
        };
        self.stats.mark_disconnected();

        let result = self.driver.disconnect(handle).await;
        if let Err(e) = result {
            self.report_failure("disconnect", e);
        }

        info!(%handle, "session disconnected");
        self.publish(SessionNotification::Disconnected);
        result
    }

    // ── Traffic ───────────────────────────────────────────────────────────────

    /// Transmits one event.
    ///
    /// When the event's date is unset (year, month, or day zero) the copy
    /// that goes on the wire is stamped with the current UTC time.  The
    /// caller's event is left untouched.
    ///
    /// `timeout` bounds the driver's `transmit`; `None` uses the configured
    /// response timeout.
    ///
    /// # Errors
    ///
    /// - [`VscpError::NotConnected`] while disconnected.
    /// - [`VscpError::InvalidParameter`] when the payload exceeds 512 bytes.
    /// - [`VscpError::Timeout`] when the driver does not finish in time.
    /// - [`VscpError::WriteError`] when the driver reports a failure.
    pub async fn send(&self, event: &Event, timeout: Option<Duration>) -> Result<(), VscpError> {
        let handle = self.inbox.current_handle().ok_or(VscpError::NotConnected)?;
        if event.payload_size() > MAX_DATA {
            return Err(VscpError::InvalidParameter);
        }

        let mut outgoing = event.clone();
        if !outgoing.has_timestamp() {
            outgoing.set_current_time();
        }

        let limit = timeout.unwrap_or_else(|| self.response_timeout());
        match tokio::time::timeout(limit, self.driver.transmit(handle, &outgoing)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.report_failure("transmit", e);
                return Err(VscpError::WriteError);
            }
            Err(_) => {
                self.report_failure("transmit", VscpError::Timeout);
                return Err(VscpError::Timeout);
            }
        }

        self.stats.record_sent();
        if self.debug_enabled() {
            debug!(
                vscp_class = outgoing.vscp_class,
                vscp_type = outgoing.vscp_type,
                size = outgoing.payload_size(),
                "event sent"
            );
        }
        self.publish(SessionNotification::EventSent(outgoing));
        Ok(())
    }

    /// Pops the oldest queued event, waiting for one if the queue is empty.
    ///
    /// `None` uses the configured response timeout.
    ///
    /// # Errors
    ///
    /// - [`VscpError::NotConnected`] while disconnected, or when the session
    ///   disconnects during the wait.
    /// - [`VscpError::Timeout`] when nothing arrives in time.
    pub async fn receive(&self, timeout: Option<Duration>) -> Result<Event, VscpError> {
        if !self.is_connected() {
            return Err(VscpError::NotConnected);
        }
        let limit = timeout.unwrap_or_else(|| self.response_timeout());

        let event = match tokio::time::timeout(limit, self.inbox.next_event()).await {
            Ok(Some(event)) => event,
            Ok(None) => return Err(VscpError::NotConnected),
            Err(_) => return Err(VscpError::Timeout),
        };

        self.stats.record_received();
        if self.debug_enabled() {
            debug!(
                vscp_class = event.vscp_class,
                vscp_type = event.vscp_type,
                size = event.payload_size(),
                "event received"
            );
        }
        self.publish(SessionNotification::EventReceived(event.clone()));
        Ok(event)
    }

    /// Appends a copy of `event` to the receive queue.
    ///
    /// Works in any state and ignores the active filter.  At capacity the
    /// oldest queued event is evicted.  A waiting `receive` is woken.
    pub fn inject_event(&self, event: &Event) {
        let evicted = self.inbox.push(event.clone());
        if evicted > 0 && self.debug_enabled() {
            debug!(evicted, "receive queue full, dropped oldest events");
        }
    }

    /// Empties the receive queue.
    pub fn clear(&self) {
        self.inbox.clear();
    }

    /// Number of queued events.
    ///
    /// # Errors
    ///
    /// Returns [`VscpError::NotConnected`] while disconnected.
    pub fn count(&self) -> Result<usize, VscpError> {
        if !self.is_connected() {
            return Err(VscpError::NotConnected);
        }
        Ok(self.inbox.len())
    }

    // ── Filter ────────────────────────────────────────────────────────────────

    /// Replaces the active receive filter.
    ///
    /// Events already queued are kept; the filter applies to what the driver
    /// delivers from now on.
    ///
    /// # Errors
    ///
    /// Returns [`VscpError::NotConnected`] while disconnected.
    pub fn set_filter(&self, filter: EventFilter) -> Result<(), VscpError> {
        if !self.is_connected() {
            return Err(VscpError::NotConnected);
        }
        *self.inbox.filter.write() = Some(filter);
        if self.debug_enabled() {
            debug!(?filter, "receive filter set");
        }
        Ok(())
    }

    /// Removes the active filter so every delivered event is queued.
    pub fn clear_filter(&self) {
        *self.inbox.filter.write() = None;
    }

    pub fn filter(&self) -> Option<EventFilter> {
        *self.inbox.filter.read()
    }

    // ── Driver queries ────────────────────────────────────────────────────────

    /// Version of the underlying driver.
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn version(&self) -> Result<VersionInfo, VscpError> {
        self.driver.version().await
    }

    /// Interfaces reachable through the driver.
    ///
    /// # Errors
    ///
    /// Returns [`VscpError::NotConnected`] while disconnected, otherwise the
    /// driver's error.
    pub async fn interfaces(&self) -> Result<Vec<String>, VscpError> {
        if !self.is_connected() {
            return Err(VscpError::NotConnected);
        }
        self.driver.list_interfaces().await
    }

    /// Capability bits of this client.
    pub fn capabilities(&self) -> u32 {
        capabilities::LEVEL2
    }

    // ── Observability ─────────────────────────────────────────────────────────

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    /// Subscribes to [`SessionNotification`]s emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.notifications.subscribe()
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// A copy of the current configuration.
    pub fn config(&self) -> SessionConfig {
        self.config.read().clone()
    }

    /// Re-initializes interface, flags, and response timeout.
    ///
    /// The queue, filter, statistics, and connection are kept.  A new
    /// interface only takes effect on the next `connect`.
    pub fn init(&self, interface: impl Into<String>, flags: u32, response_timeout: Duration) {
        {
            let mut cfg = self.config.write();
            cfg.interface = interface.into();
            cfg.flags = flags;
            cfg.response_timeout_ms = timeout_millis(response_timeout);
        }
        self.sync_debug_flag();
    }

    /// Replaces the whole configuration, resizing the queue if needed.
    ///
    /// # Errors
    ///
    /// Returns [`VscpError::InvalidParameter`] when `config` fails
    /// validation; the current configuration is kept.
    pub fn reconfigure(&self, config: SessionConfig) -> Result<(), VscpError> {
        if let Err(e) = config.validate() {
            warn!("rejecting session config: {e}");
            return Err(VscpError::InvalidParameter);
        }
        self.apply_config(config);
        Ok(())
    }

    /// JSON dump of the configuration plus `connected` and `stats`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn config_as_json(&self) -> Result<String, ConfigError> {
        let dump = ConfigDump {
            config: self.config(),
            connected: self.is_connected(),
            stats: self.statistics(),
        };
        Ok(serde_json::to_string_pretty(&dump)?)
    }

    /// Applies the configuration keys present in a JSON object.
    ///
    /// Missing keys keep their current values, and keys that are not
    /// configuration (such as `connected` and `stats` from
    /// [`Session::config_as_json`]) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] when the result fails validation; the current
    /// configuration is kept in both cases.
    pub fn init_from_json(&self, text: &str) -> Result<(), ConfigError> {
        let update = SessionConfigUpdate::from_json(text)?;
        let config = update.apply_to(&self.config())?;
        self.apply_config(config);
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        self.config.read().response_timeout()
    }

    pub fn set_response_timeout(&self, timeout: Duration) {
        self.config.write().response_timeout_ms = timeout_millis(timeout);
    }

    /// `None` when `connect` is unbounded.
    pub fn connection_timeout(&self) -> Option<Duration> {
        self.config.read().connection_timeout()
    }

    /// Sets the connect bound; `Duration::ZERO` removes it.
    pub fn set_connection_timeout(&self, timeout: Duration) {
        self.config.write().connection_timeout_ms = timeout_millis(timeout);
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn debug_enabled(&self) -> bool {
        self.inbox.debug_enabled()
    }

    fn sync_debug_flag(&self) {
        let debug = self.config.read().debug_enabled();
        self.inbox.debug.store(debug, Ordering::Relaxed);
    }

    fn apply_config(&self, config: SessionConfig) {
        self.inbox.resize(config.max_queue_size);
        *self.config.write() = config;
        self.sync_debug_flag();
    }

    fn publish(&self, notification: SessionNotification) {
        // No subscribers is not an error.
        let _ = self.notifications.send(notification);
    }

    fn report_failure(&self, operation: &str, error: VscpError) {
        self.stats.record_error();
        warn!(operation, code = error.code(), "session operation failed: {error}");
        self.publish(SessionNotification::Error(format!("{operation}: {error}")));
    }
}

/// Shape of [`Session::config_as_json`].
#[derive(Serialize)]
struct ConfigDump {
    #[serde(flatten)]
    config: SessionConfig,
    connected: bool,
    stats: StatisticsSnapshot,
}
