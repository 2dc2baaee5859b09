use std::sync::Arc;

use bytes::Bytes;

use super::engine::PacketTransformer;
use crate::conf::{SourceTags, TagPolicy};
use crate::packet::tags::KEY_TIMESTAMP;
use crate::packet::Packet;
use crate::sentence::TagBlock;

/// Writes configured source tags into packets.
#[derive(Debug, Clone)]
pub struct PacketTagging {
    policy: TagPolicy,
    tags: TagBlock,
}

impl PacketTagging {
    pub fn new(policy: TagPolicy, tags: &SourceTags) -> Self {
        Self {
            policy,
            tags: tags.to_tag_block(),
        }
    }

    pub fn policy(&self) -> TagPolicy {
        self.policy
    }

    /// Packets without a sentence come back unchanged.
    pub fn tag(&self, packet: Packet) -> Packet {
        let Some(sentence) = packet.sentence() else {
            tracing::trace!("tagging: no sentence, leaving packet untouched");
            return packet;
        };
        let existing = &sentence.tag_block;

        let (block, lines) = match self.policy {
            TagPolicy::PrependMissing => {
                let mut missing = TagBlock::new();
                for (key, value) in self.tags.iter() {
                    if existing.get(key).is_none() {
                        missing.insert_missing(key, value);
                    }
                }
                if missing.is_empty() {
                    return packet;
                }
                (missing, packet.lines())
            }
            TagPolicy::Overwrite => {
                let mut block = self.tags.clone();
                if let Some(ts) = existing.get(KEY_TIMESTAMP) {
                    block.insert_missing(KEY_TIMESTAMP, ts);
                }
                (block, strip_tag_blocks(packet.lines()))
            }
            TagPolicy::MergeOverride => {
                let mut block = self.tags.clone();
                block.merge(existing);
                (block, strip_tag_blocks(packet.lines()))
            }
            TagPolicy::MergePreserve => {
                let mut block = existing.clone();
                block.merge(&self.tags);
                (block, strip_tag_blocks(packet.lines()))
            }
        };

        let mut text = String::new();
        if !block.is_empty() {
            text.push_str(&block.render());
            text.push_str("\r\n");
        }
        text.push_str(&lines.join("\r\n"));
        Packet::from_bytes_with_codec(Bytes::from(text), Arc::clone(packet.codec()))
    }
}

impl PacketTransformer for PacketTagging {
    fn transform(&self, packet: Packet) -> Packet {
        self.tag(packet)
    }
}

/// Remove `\...\` prefixes; lines that were only a tag block are dropped.
fn strip_tag_blocks(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter_map(|line| {
            let Some(rest) = line.strip_prefix('\\') else {
                return Some(line);
            };
            match rest.find('\\') {
                Some(end) if rest[end + 1..].is_empty() => None,
                Some(end) => Some(rest[end + 1..].to_string()),
                None => Some(line),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::fake::*;
    use crate::packet::SourceType;

    const EXISTING: &str = "\\si:SRC1,c:1356994800*2B\\";
    const PGHP: &str = "$PGHP,1,2013,1,1,0,0,0,0,219,,,1,1*28";

    fn configured() -> SourceTags {
        SourceTags {
            source_id: Some("AISD".to_string()),
            source_country: Some("DNK".to_string()),
            source_type: Some(SourceType::Terrestrial),
            ..Default::default()
        }
    }

    fn tag(policy: TagPolicy, text: &str) -> Packet {
        PacketTagging::new(policy, &configured()).tag(Packet::from_text(text))
    }

    fn tag_value(packet: &Packet, key: &str) -> Option<String> {
        packet.sentence()?.tag_block.get(key).map(str::to_string)
    }

    // ── prepend_missing ──────────────────────────────────────────

    #[test]
    fn test_prepend_missing_on_untagged_packet() {
        let packet = tag(TagPolicy::PrependMissing, POSITION_LINE);
        let lines = packet.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\\si:AISD,sc:DNK,st:LIVE*"));
        assert_eq!(lines[1], POSITION_LINE);

        let tags = packet.tags().unwrap();
        assert_eq!(tags.source_id.as_deref(), Some("AISD"));
        assert_eq!(tags.source_type, Some(SourceType::Terrestrial));
        assert!(packet.is_valid_message());
    }

    #[test]
    fn test_prepend_missing_keeps_existing_values() {
        let packet = tag(TagPolicy::PrependMissing, &format!("{}{}", EXISTING, POSITION_LINE));
        assert_eq!(tag_value(&packet, "si").as_deref(), Some("SRC1"));
        assert_eq!(tag_value(&packet, "sc").as_deref(), Some("DNK"));
        assert_eq!(packet.best_timestamp(), TIME_2013_MS);
        // Original line untouched
        assert_eq!(packet.lines()[1], format!("{}{}", EXISTING, POSITION_LINE));
    }

    #[test]
    fn test_prepend_missing_with_nothing_missing_is_identity() {
        let text = format!("\\si:A,sc:B,st:SAT*{:02X}\\{}", crate::sentence::checksum::checksum("si:A,sc:B,st:SAT"), POSITION_LINE);
        let packet = tag(TagPolicy::PrependMissing, &text);
        assert_eq!(packet.text(), text);
        assert_eq!(tag_value(&packet, "st").as_deref(), Some("SAT"));
    }

    // ── overwrite ────────────────────────────────────────────────

    #[test]
    fn test_overwrite_replaces_tags_but_keeps_timestamp() {
        let text = format!("\\s:AISD,c:1356994800*2E\\{}", POSITION_LINE);
        let packet = tag(TagPolicy::Overwrite, &text);
        assert_eq!(tag_value(&packet, "s"), None);
        assert_eq!(tag_value(&packet, "si").as_deref(), Some("AISD"));
        assert_eq!(packet.best_timestamp(), TIME_2013_MS);
        assert_eq!(packet.lines().last().map(String::as_str), Some(POSITION_LINE));
    }

    #[test]
    fn test_overwrite_drops_standalone_tag_lines() {
        let text = format!("{}\r\n{}", EXISTING, POSITION_LINE);
        let packet = tag(TagPolicy::Overwrite, &text);
        assert_eq!(packet.lines().len(), 2);
        assert_eq!(tag_value(&packet, "si").as_deref(), Some("AISD"));
        assert_eq!(packet.best_timestamp(), TIME_2013_MS);
    }

    // ── merge ────────────────────────────────────────────────────

    #[test]
    fn test_merge_override_configured_wins() {
        let packet = tag(TagPolicy::MergeOverride, &format!("{}{}", EXISTING, POSITION_LINE));
        assert_eq!(tag_value(&packet, "si").as_deref(), Some("AISD"));
        assert_eq!(tag_value(&packet, "sc").as_deref(), Some("DNK"));
        assert_eq!(packet.best_timestamp(), TIME_2013_MS);
    }

    #[test]
    fn test_merge_preserve_existing_wins() {
        let packet = tag(TagPolicy::MergePreserve, &format!("{}{}", EXISTING, POSITION_LINE));
        assert_eq!(tag_value(&packet, "si").as_deref(), Some("SRC1"));
        assert_eq!(tag_value(&packet, "sc").as_deref(), Some("DNK"));
        assert_eq!(packet.best_timestamp(), TIME_2013_MS);
    }

    // ── Untouched packets ────────────────────────────────────────

    #[test]
    fn test_proprietary_lines_survive() {
        let text = format!("{}\r\n{}{}", PGHP, EXISTING, POSITION_LINE);
        for policy in TagPolicy::ALL {
            let packet = tag(policy, &text);
            let sentence = packet.sentence().expect("still assembles");
            assert_eq!(sentence.proprietary, vec![PGHP.to_string()]);
        }
    }

    #[test]
    fn test_unassembled_packet_is_unchanged() {
        for policy in TagPolicy::ALL {
            let packet = tag(policy, STATIC_FIRST);
            assert_eq!(packet.text(), STATIC_FIRST);
        }
    }

    #[test]
    fn test_strip_tag_blocks() {
        let lines = vec![
            "\\c:1*31\\".to_string(),
            "\\c:1*31\\!AIVDM".to_string(),
            "$PGHP".to_string(),
            "\\unterminated".to_string(),
        ];
        assert_eq!(strip_tag_blocks(lines), vec!["!AIVDM", "$PGHP", "\\unterminated"]);
    }
}
