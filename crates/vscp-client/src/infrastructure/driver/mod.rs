//! Driver adapters.
//!
//! Each adapter implements [`crate::application::driver::DriverAdapter`].
//! Network transports (TCP to a VSCP daemon, UDP multicast) plug in here the
//! same way.

pub mod loopback;
pub mod mock;

pub use loopback::LoopbackDriver;
pub use mock::MockDriver;
