//! Infrastructure layer for the VSCP client.
//!
//! Contains the concrete driver adapters and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vscp_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`driver`** – implementations of `DriverAdapter`.  `LoopbackDriver`
//!   echoes every transmitted event back to the session in-process; it is the
//!   driver the demo binary runs against.  `MockDriver` records calls for
//!   tests and can be switched to fail.
//!
//! - **`storage`** – TOML configuration file load/save.

pub mod driver;
pub mod storage;
