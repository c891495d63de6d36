//! Application layer of the VSCP client.
//!
//! # What lives here?
//!
//! - **`session`** – the [`session::Session`] use case: connection state
//!   machine, bounded receive queue, active filter, send/receive.
//!
//! - **`driver`** – the [`driver::DriverAdapter`] port.  Concrete transports
//!   (TCP, UDP, in-process loopback) implement it in the infrastructure layer
//!   and are injected into the session at construction time.
//!
//! - **`config`** – [`config::SessionConfig`], the interface/flags/timeouts
//!   the session runs with, plus its TOML and JSON export.
//!
//! - **`statistics`** and **`notifications`** – what observers can read or
//!   subscribe to while the session runs.
//!
//! Nothing in this layer performs I/O directly; everything that touches the
//! outside world goes through the driver adapter.

pub mod config;
pub mod driver;
pub mod notifications;
pub mod session;
pub mod statistics;
