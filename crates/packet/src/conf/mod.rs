//! Conf module — filter configurations, their TOML document form, and reader config loading.

pub mod document;
pub mod error;
pub mod load;
pub mod model;

pub use document::{FilterDocument, PipelineDocument, TaggingDocument};
pub use error::ConfigError;
pub use model::{
    FilterConfiguration, MessageTypeFilterConfiguration, PastFilterConfiguration, ReaderConfig,
    SourceTags, TagPolicy, TaggingConfiguration, TaggingFilterConfiguration, DEFAULT_THRESHOLD_MS,
};
