//! Tags — packet metadata carried in tag blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sentence::{Sentence, TagBlock};

pub const KEY_TIMESTAMP: &str = "c";
pub const KEY_SOURCE_ID: &str = "si";
pub const KEY_SOURCE_BS: &str = "sb";
pub const KEY_SOURCE_COUNTRY: &str = "sc";
pub const KEY_SOURCE_TYPE: &str = "st";
pub const KEY_SOURCE_REGION: &str = "sr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Terrestrial receivers
    #[serde(rename = "LIVE")]
    Terrestrial,
    #[serde(rename = "SAT")]
    Satellite,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Terrestrial => "LIVE",
            SourceType::Satellite => "SAT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIVE" => Some(SourceType::Terrestrial),
            "SAT" => Some(SourceType::Satellite),
            _ => None,
        }
    }
}

/// Metadata derived from (or written into) a packet's tag block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketTags {
    pub timestamp: Option<DateTime<Utc>>,
    pub source_id: Option<String>,
    /// MMSI of the receiving base station
    pub source_bs: Option<u32>,
    pub source_country: Option<String>,
    pub source_type: Option<SourceType>,
    pub source_region: Option<String>,
}

impl PacketTags {
    /// Read tags from a tag block. Unparseable values are left unset.
    pub fn from_tag_block(block: &TagBlock) -> Self {
        let text = |key: &str| block.get(key).map(str::to_string);
        Self {
            timestamp: None,
            source_id: text(KEY_SOURCE_ID),
            source_bs: block.get(KEY_SOURCE_BS).and_then(|v| v.parse().ok()),
            source_country: text(KEY_SOURCE_COUNTRY),
            source_type: block.get(KEY_SOURCE_TYPE).and_then(SourceType::parse),
            source_region: text(KEY_SOURCE_REGION),
        }
    }

    /// Tag block with every set field. The timestamp is written in seconds,
    /// or in milliseconds when it has a sub-second part.
    pub fn to_tag_block(&self) -> TagBlock {
        let mut block = TagBlock::new();
        if let Some(ts) = self.timestamp {
            let value = if ts.timestamp_subsec_millis() == 0 {
                ts.timestamp()
            } else {
                ts.timestamp_millis()
            };
            block.insert_missing(KEY_TIMESTAMP, &value.to_string());
        }
        if let Some(id) = &self.source_id {
            block.insert_missing(KEY_SOURCE_ID, id);
        }
        if let Some(bs) = self.source_bs {
            block.insert_missing(KEY_SOURCE_BS, &bs.to_string());
        }
        if let Some(country) = &self.source_country {
            block.insert_missing(KEY_SOURCE_COUNTRY, country);
        }
        if let Some(kind) = self.source_type {
            block.insert_missing(KEY_SOURCE_TYPE, kind.as_str());
        }
        if let Some(region) = &self.source_region {
            block.insert_missing(KEY_SOURCE_REGION, region);
        }
        block
    }

    pub fn is_empty(&self) -> bool {
        *self == PacketTags::default()
    }
}

pub trait TagExtractor: Send + Sync {
    fn extract(&self, sentence: &Sentence) -> PacketTags;
}

/// Reads the `c`, `si`, `sb`, `sc`, `st` and `sr` tag block keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagBlockExtractor;

impl TagExtractor for TagBlockExtractor {
    fn extract(&self, sentence: &Sentence) -> PacketTags {
        PacketTags {
            timestamp: sentence.timestamp(),
            ..PacketTags::from_tag_block(&sentence.tag_block)
        }
    }
}
