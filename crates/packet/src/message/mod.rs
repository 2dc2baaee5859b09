//! Message — AIS payload decoding.
//!
//! Only the header and the position-bearing reports are decoded into typed
//! fields; every other message id is surfaced as its header.

pub mod model;
pub mod traits;
pub mod sixbit;
pub mod decoder;

pub use model::{
    BaseStationReport, DecodeError, DecodedMessage, Location, MessageHeader, PositionCapable,
    PositionReport, PositionTime, VesselClass,
};
pub use traits::MessageDecoder;
pub use decoder::StandardDecoder;

/// Highest message id defined by ITU-R M.1371.
pub const MAX_MESSAGE_ID: u8 = 27;
