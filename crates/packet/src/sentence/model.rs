use chrono::{DateTime, Utc};
use thiserror::Error;

use super::checksum;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized line: {0}")]
    Unrecognized(String),

    #[error("Checksum mismatch: expected {expected:02X}, found {found:?}")]
    Checksum { expected: u8, found: String },

    #[error("Malformed sentence: {0}")]
    MalformedSentence(String),

    #[error("Fragment {fragment} of {count} out of order (expected fragment {expected})")]
    FragmentOutOfOrder { fragment: u8, count: u8, expected: u8 },

    #[error("Malformed tag block: {0}")]
    MalformedTagBlock(String),
}

/// Ordered `key:value` pairs from NMEA 4.0 style `\...\` tag blocks.
///
/// When several blocks are merged the first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagBlock {
    entries: Vec<(String, String)>,
}

impl TagBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text between the two backslashes, e.g. `c:1356994800*54`.
    /// A trailing checksum is optional but must match when present.
    pub fn parse(inner: &str) -> Result<Self, ParseError> {
        let body = match checksum::split(inner) {
            Some((body, found)) => {
                checksum::verify(body, found)?;
                body
            }
            None => inner,
        };

        let mut block = TagBlock::new();
        for field in body.split(',').filter(|f| !f.is_empty()) {
            let (key, value) = field
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedTagBlock(inner.to_string()))?;
            if key.is_empty() {
                return Err(ParseError::MalformedTagBlock(inner.to_string()));
            }
            block.insert_missing(key, value);
        }
        Ok(block)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert unless the key is already present. Returns true if inserted.
    pub fn insert_missing(&mut self, key: &str, value: &str) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.entries.push((key.to_string(), value.to_string()));
        true
    }

    pub fn merge(&mut self, other: &TagBlock) {
        for (key, value) in &other.entries {
            self.insert_missing(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a complete `\...*HH\` block.
    pub fn render(&self) -> String {
        let body = self
            .entries
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        format!("\\{}*{:02X}\\", body, checksum::checksum(&body))
    }
}

/// A completed VDM/VDO message with everything that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Two-letter talker id (`AI`, `BS`, ...)
    pub talker: String,
    /// `VDM` or `VDO`
    pub formatter: String,
    pub fragment_count: u8,
    pub sequence_id: Option<u8>,
    pub channel: Option<char>,
    /// Sixbit payload of all fragments, concatenated
    pub payload: String,
    /// Fill bits of the last fragment
    pub fill_bits: u8,
    pub tag_block: TagBlock,
    /// Proprietary `$P...` lines, verbatim
    pub proprietary: Vec<String>,
    /// Every raw line consumed to produce this sentence
    pub lines: Vec<String>,
}

impl Sentence {
    /// Wall-clock time from the tag block `c:` field.
    ///
    /// Values of 13 or more digits are milliseconds, anything shorter is
    /// unix seconds.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.tag_block.get("c")?.trim();
        let value: i64 = raw.parse().ok()?;
        if raw.trim_start_matches('-').len() >= 13 {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        }
    }
}
