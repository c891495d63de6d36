//! vscp-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does vscp-client do? (for beginners)
//!
//! A VSCP *Level-2 client* is the piece of software an application uses to
//! talk to a VSCP daemon or device.  It does not know how bytes travel on the
//! wire; that is the job of a *driver adapter*.  What the client owns is the
//! bookkeeping around a connection:
//!
//! 1. A small state machine (`Disconnected` ↔ `Connected`) that gates which
//!    operations are allowed.
//! 2. A bounded receive queue.  When the queue is full the oldest event is
//!    dropped so the newest traffic is always kept.
//! 3. The active receive filter, which the driver applies to every inbound
//!    event before it is queued.
//! 4. Counters (sent, received, errors) and a stream of notifications
//!    (connected, disconnected, event sent/received, error) for observers.
//!
//! # Layers
//!
//! ```text
//! application/     Session, DriverAdapter trait, SessionConfig
//! infrastructure/
//!   driver/        LoopbackDriver (in-process echo), MockDriver (tests)
//!   storage/       TOML configuration file load/save
//! ```

/// Application layer: the client session and the ports it depends on.
pub mod application;

/// Infrastructure layer: driver adapters and configuration storage.
pub mod infrastructure;

pub use application::config::{ConfigError, SessionConfig, SessionConfigUpdate};
pub use application::driver::{DriverAdapter, SessionHandle, VersionInfo};
pub use application::notifications::SessionNotification;
pub use application::session::{IncomingSink, Session, SessionState};
pub use application::statistics::StatisticsSnapshot;
