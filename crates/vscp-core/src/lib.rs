//! # vscp-core
//!
//! Shared library for the VSCP Level-2 client containing the event envelope,
//! the mask/filter match engine, and the binary frame codec.
//!
//! This crate has no async runtime and performs no I/O.  The session state
//! machine and the driver adapters live in `vscp-client`.
//!
//! # Architecture overview (for beginners)
//!
//! VSCP (Very Simple Control Protocol) is a messaging scheme for home and
//! building automation devices.  Every message is an *event*: a small record
//! carrying a class, a type, the 16-byte GUID of the device that produced it,
//! a timestamp, and up to 512 bytes of payload.  A single header byte packs
//! the event priority and a few flags.
//!
//! This crate defines:
//!
//! - **`protocol::event`** – the [`Event`] record, its header bit-fields, and
//!   the self-describing JSON record used for persistence and framing by
//!   external callers.
//!
//! - **`protocol::filter`** – the [`EventFilter`] mask/value pair and the
//!   [`EventFilter::matches`] predicate that decides whether an event should
//!   be delivered.
//!
//! - **`protocol::guid`** – the fixed-size [`Guid`] device identifier and its
//!   `xx:yy:zz:...` string form.
//!
//! - **`protocol::codec`** – a compact big-endian binary frame for driver
//!   adapters that need to put events on a byte stream.
//!
//! - **`error`** – the VSCP error kinds shared by every layer.

pub mod error;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `vscp_core::Event` instead of `vscp_core::protocol::event::Event`.
pub use error::VscpError;
pub use protocol::codec::{decode_event, encode_event, CodecError};
pub use protocol::event::{Event, EventTimestamp};
pub use protocol::filter::EventFilter;
pub use protocol::guid::Guid;
