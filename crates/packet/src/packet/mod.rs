//! Packet module — lazily decoded AIS packets and the collaborators behind them.

pub mod cache;
pub mod codec;
pub mod model;
pub mod reader;
pub mod tags;

#[cfg(test)]
pub(crate) mod fake;

pub use cache::{CacheState, Memo};
pub use codec::Codec;
pub use model::{AssemblyFailure, Packet, NO_TIMESTAMP, TIMESTAMP_UNSET};
pub use reader::{PacketReader, ReaderStats};
pub use tags::{PacketTags, SourceType, TagBlockExtractor, TagExtractor};
