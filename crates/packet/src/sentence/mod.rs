/// NMEA sentence assembly
///
/// Turns raw text lines into structural [`Sentence`]s: tag-block prefixes,
/// proprietary lines and multi-fragment VDM/VDO sentences are accumulated
/// until a message boundary is found.
///
/// # Architecture
///
/// - `traits.rs`: the assembler contract consumed by packets
/// - `model.rs`: `Sentence`, `TagBlock` and `ParseError`
/// - `checksum.rs`: NMEA XOR checksums
/// - `vdm.rs`: the standard VDM/VDO assembler

pub mod traits;
pub mod model;
pub mod checksum;
pub mod vdm;

// Re-export commonly used types
pub use traits::{AssemblerFactory, SentenceAssembler};
pub use model::{ParseError, Sentence, TagBlock};
pub use vdm::{VdmAssembler, VdmAssemblerFactory};

// Constants
pub const MAX_FRAGMENTS: u8 = 9;
pub const MAX_FILL_BITS: u8 = 5;
