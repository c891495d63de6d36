//! Protocol module containing the event envelope, filter, GUID, and codec.

pub mod codec;
pub mod constants;
pub mod event;
pub mod filter;
pub mod guid;

pub use codec::{decode_event, encode_event, CodecError};
pub use constants::*;
pub use event::{Event, EventTimestamp};
pub use filter::EventFilter;
pub use guid::Guid;
