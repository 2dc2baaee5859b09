//! Filter module — runtime pipeline stages built from filter configurations.

pub mod clock;
pub mod engine;
pub mod message_type;
pub mod past;
pub mod tagging;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{FilterInstance, PacketFilter, PacketTransformer, Pipeline, PipelineStats, Verdict};
pub use message_type::MessageTypeFilter;
pub use past::PastFilter;
pub use tagging::PacketTagging;
