//! Model — filter configurations and the reader configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::document::FilterDocument;
use super::error::ConfigError;
use crate::filter::{
    Clock, FilterInstance, MessageTypeFilter, PacketTagging, PastFilter, SystemClock,
};
use crate::message::MAX_MESSAGE_ID;
use crate::packet::reader::DEFAULT_MAX_LINES;
use crate::packet::{PacketTags, SourceType};
use crate::sentence::TagBlock;

/// One day.
pub const DEFAULT_THRESHOLD_MS: u64 = 86_400_000;

/// Declarative description of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterConfiguration {
    Past(PastFilterConfiguration),
    Tagging(TaggingFilterConfiguration),
    MessageType(MessageTypeFilterConfiguration),
}

impl FilterConfiguration {
    pub fn kind(&self) -> &'static str {
        match self {
            FilterConfiguration::Past(_) => PastFilterConfiguration::KIND,
            FilterConfiguration::Tagging(_) => TaggingFilterConfiguration::KIND,
            FilterConfiguration::MessageType(_) => MessageTypeFilterConfiguration::KIND,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            FilterConfiguration::Past(_) | FilterConfiguration::Tagging(_) => Ok(()),
            FilterConfiguration::MessageType(c) => c.validate(),
        }
    }

    /// Build the runtime stage, timing against the system clock.
    pub fn instantiate(&self) -> FilterInstance {
        self.instantiate_with_clock(Arc::new(SystemClock))
    }

    pub fn instantiate_with_clock(&self, clock: Arc<dyn Clock>) -> FilterInstance {
        match self {
            FilterConfiguration::Past(c) => c.instantiate_with_clock(clock),
            FilterConfiguration::Tagging(c) => c.instantiate(),
            FilterConfiguration::MessageType(c) => c.instantiate(),
        }
    }
}

/// Rejects packets dated too far ahead of now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastFilterConfiguration {
    pub threshold_ms: u64,
}

impl PastFilterConfiguration {
    pub const KIND: &'static str = "past";

    pub fn new(threshold_ms: u64) -> Self {
        Self { threshold_ms }
    }

    pub fn instantiate(&self) -> FilterInstance {
        self.instantiate_with_clock(Arc::new(SystemClock))
    }

    pub fn instantiate_with_clock(&self, clock: Arc<dyn Clock>) -> FilterInstance {
        FilterInstance::new(Self::KIND).with_filter(PastFilter::new(self.threshold_ms, clock))
    }
}

impl Default for PastFilterConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MS)
    }
}

/// How configured tags combine with the tags a packet already carries.
/// The packet timestamp is kept under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TagPolicy {
    /// Prepend a tag block holding only the tags the packet lacks
    #[default]
    PrependMissing,
    /// Replace existing tag blocks with the configured tags
    Overwrite,
    /// Merge, configured values win
    MergeOverride,
    /// Merge, existing values win
    MergePreserve,
}

impl TagPolicy {
    pub const ALL: [TagPolicy; 4] = [
        TagPolicy::PrependMissing,
        TagPolicy::Overwrite,
        TagPolicy::MergeOverride,
        TagPolicy::MergePreserve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagPolicy::PrependMissing => "prepend_missing",
            TagPolicy::Overwrite => "overwrite",
            TagPolicy::MergeOverride => "merge_override",
            TagPolicy::MergePreserve => "merge_preserve",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// Source metadata a tagging stage writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTags {
    pub source_id: Option<String>,
    pub source_bs: Option<u32>,
    pub source_country: Option<String>,
    pub source_type: Option<SourceType>,
    pub source_region: Option<String>,
}

impl SourceTags {
    pub fn to_tag_block(&self) -> TagBlock {
        PacketTags {
            timestamp: None,
            source_id: self.source_id.clone(),
            source_bs: self.source_bs,
            source_country: self.source_country.clone(),
            source_type: self.source_type,
            source_region: self.source_region.clone(),
        }
        .to_tag_block()
    }

    pub fn is_empty(&self) -> bool {
        *self == SourceTags::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggingConfiguration {
    pub policy: TagPolicy,
    pub tags: SourceTags,
}

impl TaggingConfiguration {
    pub fn new(policy: TagPolicy, tags: SourceTags) -> Self {
        Self { policy, tags }
    }

    pub fn instantiate(&self) -> PacketTagging {
        PacketTagging::new(self.policy, &self.tags)
    }
}

/// Tags every packet; never rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggingFilterConfiguration {
    pub tagging: TaggingConfiguration,
}

impl TaggingFilterConfiguration {
    pub const KIND: &'static str = "tagging";

    pub fn new(tagging: TaggingConfiguration) -> Self {
        Self { tagging }
    }

    pub fn instantiate(&self) -> FilterInstance {
        FilterInstance::new(Self::KIND).with_transformer(self.tagging.instantiate())
    }
}

/// Accepts only packets whose decoded message id is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTypeFilterConfiguration {
    pub message_ids: Vec<u8>,
}

impl MessageTypeFilterConfiguration {
    pub const KIND: &'static str = "message_type";

    pub fn new(message_ids: impl IntoIterator<Item = u8>) -> Self {
        Self {
            message_ids: message_ids.into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_ids.is_empty() {
            return Err(ConfigError::invalid(Self::KIND, "message_ids", "must not be empty"));
        }
        if let Some(id) = self
            .message_ids
            .iter()
            .find(|id| !(1..=MAX_MESSAGE_ID).contains(*id))
        {
            return Err(ConfigError::invalid(
                Self::KIND,
                "message_ids",
                format!("{} is not in 1..={}", id, MAX_MESSAGE_ID),
            ));
        }
        Ok(())
    }

    pub fn instantiate(&self) -> FilterInstance {
        FilterInstance::new(Self::KIND).with_filter(MessageTypeFilter::new(&self.message_ids))
    }
}

/// Configuration of the `aisreader` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub filters: Vec<FilterDocument>,
    pub max_packet_lines: usize,
    /// Write rejected packets to stderr
    pub write_rejected: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            max_packet_lines: DEFAULT_MAX_LINES,
            write_rejected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FixedClock;
    use crate::packet::fake::*;
    use crate::packet::Packet;

    // ── Past ─────────────────────────────────────────────────────

    #[test]
    fn test_past_default_threshold() {
        assert_eq!(PastFilterConfiguration::default().threshold_ms, 86_400_000);
    }

    #[test]
    fn test_past_instantiate() {
        let config = FilterConfiguration::Past(PastFilterConfiguration::new(5_000));
        assert_eq!(config.kind(), "past");
        assert!(config.validate().is_ok());

        let stage = config.instantiate_with_clock(Arc::new(FixedClock::new(TIME_2013_MS - 60_000)));
        assert_eq!(stage.name(), "past");
        let packet = Packet::from_text(&format!("{}{}", TAG_2013, POSITION_LINE));
        assert!(!stage.evaluate(packet).is_accepted());
    }

    #[test]
    fn test_past_instantiate_with_system_clock() {
        // 2013 is long past
        let stage = PastFilterConfiguration::new(0).instantiate();
        let packet = Packet::from_text(&format!("{}{}", TAG_2013, POSITION_LINE));
        assert!(stage.evaluate(packet).is_accepted());
    }

    // ── Tagging ──────────────────────────────────────────────────

    #[test]
    fn test_tag_policy_names() {
        for policy in TagPolicy::ALL {
            assert_eq!(TagPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(TagPolicy::parse("append"), None);
        assert_eq!(TagPolicy::default(), TagPolicy::PrependMissing);
    }

    #[test]
    fn test_tagging_always_accepts() {
        let config = FilterConfiguration::Tagging(TaggingFilterConfiguration::new(TaggingConfiguration::new(
            TagPolicy::PrependMissing,
            SourceTags {
                source_id: Some("AISD".to_string()),
                ..Default::default()
            },
        )));
        let stage = config.instantiate();
        assert_eq!(stage.name(), "tagging");

        let verdict = stage.evaluate(Packet::from_text(POSITION_LINE));
        assert!(verdict.is_accepted());
        let tags = verdict.packet().tags().cloned().unwrap_or_default();
        assert_eq!(tags.source_id.as_deref(), Some("AISD"));

        assert!(stage.evaluate(Packet::from_text("garbage")).is_accepted());
    }

    #[test]
    fn test_source_tags_block_has_no_timestamp() {
        let tags = SourceTags {
            source_type: Some(SourceType::Satellite),
            ..Default::default()
        };
        let block = tags.to_tag_block();
        assert_eq!(block.get("c"), None);
        assert_eq!(block.get("st"), Some("SAT"));
        assert!(SourceTags::default().is_empty());
    }

    // ── Message type ─────────────────────────────────────────────

    #[test]
    fn test_message_type_validation() {
        assert!(MessageTypeFilterConfiguration::new([1, 2, 3, 18]).validate().is_ok());
        assert!(MessageTypeFilterConfiguration::new([]).validate().is_err());
        assert!(MessageTypeFilterConfiguration::new([0]).validate().is_err());
        assert!(MessageTypeFilterConfiguration::new([28]).validate().is_err());
    }

    #[test]
    fn test_message_type_instantiate() {
        let stage = FilterConfiguration::MessageType(MessageTypeFilterConfiguration::new([1])).instantiate();
        assert!(stage.evaluate(Packet::from_text(POSITION_LINE)).is_accepted());
        assert!(!stage.evaluate(Packet::from_text(NO_LOCATION_LINE)).is_accepted());
    }

    // ── Reader config ────────────────────────────────────────────

    #[test]
    fn test_reader_config_defaults() {
        let config: ReaderConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReaderConfig::default());
        assert_eq!(config.max_packet_lines, 64);
        assert!(!config.write_rejected);
        assert!(config.filters.is_empty());
    }
}
