//! Persistent storage for the client.
//!
//! - **`config`** – reads and writes the TOML configuration file.

pub mod config;
