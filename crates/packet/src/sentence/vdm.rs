//! Vdm — the standard line assembler for `!xxVDM` / `!xxVDO` sentences.

use super::checksum;
use super::model::{ParseError, Sentence, TagBlock};
use super::traits::{AssemblerFactory, SentenceAssembler};
use super::{MAX_FILL_BITS, MAX_FRAGMENTS};

/// One line held until its message completes.
#[derive(Debug)]
struct BufferedLine {
    text: String,
    tags: Option<TagBlock>,
    proprietary: Option<String>,
}

/// The message currently being assembled from fragments.
#[derive(Debug)]
struct Pending {
    talker: String,
    formatter: String,
    count: u8,
    next: u8,
    sequence_id: Option<u8>,
    channel: Option<char>,
    payload: String,
    /// Number of buffered lines that belong to this message
    lines_end: usize,
}

/// One parsed `!` sentence line.
#[derive(Debug)]
struct Fragment {
    talker: String,
    formatter: String,
    count: u8,
    number: u8,
    sequence_id: Option<u8>,
    channel: Option<char>,
    payload: String,
    fill_bits: u8,
}

impl Fragment {
    fn parse(sentence: &str) -> Result<Self, ParseError> {
        let malformed = |reason: &str| ParseError::MalformedSentence(format!("{}: {}", reason, sentence));

        let body_and_sum = sentence.strip_prefix('!').ok_or_else(|| malformed("missing '!'"))?;
        let (body, found) = checksum::split(body_and_sum).ok_or_else(|| malformed("missing checksum"))?;
        checksum::verify(body, found)?;

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != 7 {
            return Err(malformed("expected 7 fields"));
        }

        let address = fields[0];
        if address.len() != 5 || !address.is_ascii() {
            return Err(malformed("bad address field"));
        }
        let (talker, formatter) = address.split_at(2);
        if formatter != "VDM" && formatter != "VDO" {
            return Err(malformed("not a VDM/VDO sentence"));
        }

        let count: u8 = fields[1].parse().map_err(|_| malformed("bad fragment count"))?;
        let number: u8 = fields[2].parse().map_err(|_| malformed("bad fragment number"))?;
        if count == 0 || count > MAX_FRAGMENTS || number == 0 || number > count {
            return Err(malformed("fragment numbering out of range"));
        }

        let sequence_id = match fields[3] {
            "" => None,
            seq => Some(seq.parse().map_err(|_| malformed("bad sequential message id"))?),
        };
        let channel = fields[4].chars().next();

        let fill_bits: u8 = fields[6].parse().map_err(|_| malformed("bad fill bits"))?;
        if fill_bits > MAX_FILL_BITS {
            return Err(malformed("fill bits out of range"));
        }

        Ok(Self {
            talker: talker.to_string(),
            formatter: formatter.to_string(),
            count,
            number,
            sequence_id,
            channel,
            payload: fields[5].to_string(),
            fill_bits,
        })
    }
}

/// Line-at-a-time VDM/VDO assembler.
///
/// Accepts leading `\...\` tag blocks (standalone or prefixing a sentence),
/// proprietary `$P...` lines and multi-fragment sentences. Any error resets
/// the assembler so the next line starts a fresh message.
#[derive(Debug, Default)]
pub struct VdmAssembler {
    lines: Vec<BufferedLine>,
    pending: Option<Pending>,
}

impl VdmAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all buffered lines and any partial message.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.pending = None;
    }

    fn accept(&mut self, line: &str) -> Result<Option<Sentence>, ParseError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let (tags, rest) = match line.strip_prefix('\\') {
            Some(tagged) => {
                let end = tagged
                    .find('\\')
                    .ok_or_else(|| ParseError::MalformedTagBlock(line.to_string()))?;
                (Some(TagBlock::parse(&tagged[..end])?), &tagged[end + 1..])
            }
            None => (None, line),
        };

        if rest.is_empty() {
            self.buffer(line, tags, None);
            return Ok(None);
        }

        if rest.starts_with("$P") {
            self.buffer(line, tags, Some(rest.to_string()));
            return Ok(None);
        }

        if !rest.starts_with('!') {
            return Err(ParseError::Unrecognized(line.to_string()));
        }

        let fragment = Fragment::parse(rest)?;

        if fragment.number == 1 {
            if let Some(stale) = self.pending.take() {
                tracing::debug!(
                    expected = stale.next,
                    count = stale.count,
                    "vdm: new message started, discarding incomplete fragments"
                );
                self.lines.drain(..stale.lines_end);
            }
            self.buffer(line, tags, None);
            self.pending = Some(Pending {
                talker: fragment.talker.clone(),
                formatter: fragment.formatter.clone(),
                count: fragment.count,
                next: 2,
                sequence_id: fragment.sequence_id,
                channel: fragment.channel,
                payload: fragment.payload.clone(),
                lines_end: self.lines.len(),
            });
        } else {
            let pending = match self.pending.as_mut() {
                Some(p)
                    if p.next == fragment.number
                        && p.count == fragment.count
                        && p.sequence_id == fragment.sequence_id =>
                {
                    p
                }
                other => {
                    return Err(ParseError::FragmentOutOfOrder {
                        fragment: fragment.number,
                        count: fragment.count,
                        expected: other.map(|p| p.next).unwrap_or(1),
                    });
                }
            };
            pending.payload.push_str(&fragment.payload);
            pending.next += 1;
            self.buffer(line, tags, None);
            if let Some(p) = self.pending.as_mut() {
                p.lines_end = self.lines.len();
            }
        }

        if fragment.number < fragment.count {
            return Ok(None);
        }

        Ok(self.complete(fragment.fill_bits))
    }

    fn buffer(&mut self, line: &str, tags: Option<TagBlock>, proprietary: Option<String>) {
        self.lines.push(BufferedLine {
            text: line.to_string(),
            tags,
            proprietary,
        });
    }

    fn complete(&mut self, fill_bits: u8) -> Option<Sentence> {
        let pending = self.pending.take()?;

        let mut tag_block = TagBlock::new();
        let mut proprietary = Vec::new();
        let mut lines = Vec::with_capacity(self.lines.len());
        for buffered in self.lines.drain(..) {
            if let Some(tags) = &buffered.tags {
                tag_block.merge(tags);
            }
            if let Some(p) = buffered.proprietary {
                proprietary.push(p);
            }
            lines.push(buffered.text);
        }

        Some(Sentence {
            talker: pending.talker,
            formatter: pending.formatter,
            fragment_count: pending.count,
            sequence_id: pending.sequence_id,
            channel: pending.channel,
            payload: pending.payload,
            fill_bits,
            tag_block,
            proprietary,
            lines,
        })
    }
}

impl SentenceAssembler for VdmAssembler {
    fn feed_line(&mut self, line: &str) -> Result<Option<Sentence>, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let result = self.accept(line);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn buffered_lines(&self) -> usize {
        self.lines.len()
    }
}

/// Hands out fresh [`VdmAssembler`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct VdmAssemblerFactory;

impl AssemblerFactory for VdmAssemblerFactory {
    fn assembler(&self) -> Box<dyn SentenceAssembler> {
        Box::new(VdmAssembler::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "!AIVDM,1,1,,A,13@ndh@P1sPq>70Oq`49:GDt0000,0*52";
    const FIRST: &str = "!AIVDM,2,1,3,A,53@ndi000000000000000000000000000000000000000000000000000000,0*33";
    const SECOND: &str = "!AIVDM,2,2,3,A,00000000000,2*27";

    fn feed_all(assembler: &mut VdmAssembler, lines: &[&str]) -> Vec<Result<Option<Sentence>, ParseError>> {
        lines.iter().map(|l| assembler.feed_line(l)).collect()
    }

    // ── Single fragment ──────────────────────────────────────────

    #[test]
    fn test_single_fragment_completes() {
        let mut assembler = VdmAssembler::new();
        let sentence = assembler.feed_line(SINGLE).unwrap().expect("should complete");
        assert_eq!(sentence.talker, "AI");
        assert_eq!(sentence.formatter, "VDM");
        assert_eq!(sentence.channel, Some('A'));
        assert_eq!(sentence.payload, "13@ndh@P1sPq>70Oq`49:GDt0000");
        assert_eq!(sentence.fill_bits, 0);
        assert_eq!(sentence.lines, vec![SINGLE.to_string()]);
        assert_eq!(assembler.buffered_lines(), 0);
    }

    #[test]
    fn test_trailing_crlf_is_ignored() {
        let mut assembler = VdmAssembler::new();
        let line = format!("{}\r\n", SINGLE);
        assert!(assembler.feed_line(&line).unwrap().is_some());
    }

    #[test]
    fn test_blank_lines_ignored() {
        let mut assembler = VdmAssembler::new();
        assert_eq!(assembler.feed_line("   ").unwrap(), None);
        assert_eq!(assembler.buffered_lines(), 0);
    }

    // ── Multi fragment ───────────────────────────────────────────

    #[test]
    fn test_two_fragments() {
        let mut assembler = VdmAssembler::new();
        assert_eq!(assembler.feed_line(FIRST).unwrap(), None);
        let sentence = assembler.feed_line(SECOND).unwrap().expect("should complete");
        assert_eq!(sentence.fragment_count, 2);
        assert_eq!(sentence.sequence_id, Some(3));
        assert_eq!(sentence.payload.len(), 71);
        assert_eq!(sentence.fill_bits, 2);
        assert_eq!(sentence.lines.len(), 2);
    }

    #[test]
    fn test_new_first_fragment_discards_incomplete() {
        let mut assembler = VdmAssembler::new();
        assert_eq!(assembler.feed_line(FIRST).unwrap(), None);
        let sentence = assembler.feed_line(SINGLE).unwrap().expect("should complete");
        assert_eq!(sentence.lines, vec![SINGLE.to_string()]);
    }

    #[test]
    fn test_orphan_second_fragment_is_error() {
        let mut assembler = VdmAssembler::new();
        let err = assembler.feed_line(SECOND).unwrap_err();
        assert_eq!(
            err,
            ParseError::FragmentOutOfOrder { fragment: 2, count: 2, expected: 1 }
        );
        // Recovers on the next message
        assert!(assembler.feed_line(SINGLE).unwrap().is_some());
    }

    // ── Prefix lines ─────────────────────────────────────────────

    #[test]
    fn test_inline_tag_block() {
        let mut assembler = VdmAssembler::new();
        let line = format!("\\c:1356994800*54\\{}", SINGLE);
        let sentence = assembler.feed_line(&line).unwrap().unwrap();
        assert_eq!(sentence.tag_block.get("c"), Some("1356994800"));
        assert_eq!(sentence.timestamp().unwrap().timestamp(), 1_356_994_800);
    }

    #[test]
    fn test_standalone_tag_block_and_proprietary_lines() {
        let mut assembler = VdmAssembler::new();
        let results = feed_all(
            &mut assembler,
            &["\\si:SRC1,c:1356994800*2B\\", "$PGHP,1,2013,1,1,0,0,0,0,219,,,1,1*28", SINGLE],
        );
        let sentence = results.into_iter().last().unwrap().unwrap().unwrap();
        assert_eq!(sentence.tag_block.get("si"), Some("SRC1"));
        assert_eq!(sentence.proprietary.len(), 1);
        assert!(sentence.proprietary[0].starts_with("$PGHP"));
        assert_eq!(sentence.lines.len(), 3);
    }

    // ── Errors ───────────────────────────────────────────────────

    #[test]
    fn test_bad_checksum_rejected() {
        let mut assembler = VdmAssembler::new();
        let err = assembler
            .feed_line("!AIVDM,1,1,,A,13@ndh@P1sPq>70Oq`49:GDt0000,0*00")
            .unwrap_err();
        assert!(matches!(err, ParseError::Checksum { .. }));
    }

    #[test]
    fn test_unrecognized_line() {
        let mut assembler = VdmAssembler::new();
        let err = assembler.feed_line("hello world").unwrap_err();
        assert!(matches!(err, ParseError::Unrecognized(_)));
    }

    #[test]
    fn test_unterminated_tag_block() {
        let mut assembler = VdmAssembler::new();
        let err = assembler.feed_line("\\c:1356994800").unwrap_err();
        assert!(matches!(err, ParseError::MalformedTagBlock(_)));
    }

    #[test]
    fn test_discarded_fragments_leave_the_buffer() {
        let mut assembler = VdmAssembler::new();
        for _ in 0..4 {
            assert_eq!(assembler.feed_line(FIRST).unwrap(), None);
            assert_eq!(assembler.buffered_lines(), 1);
        }
        assert!(assembler.feed_line(SECOND).unwrap().is_some());
    }

    #[test]
    fn test_error_resets_buffered_prefix() {
        let mut assembler = VdmAssembler::new();
        assembler.feed_line("\\c:1356994800*54\\").unwrap();
        assert_eq!(assembler.buffered_lines(), 1);
        assert!(assembler.feed_line("garbage").is_err());
        assert_eq!(assembler.buffered_lines(), 0);
    }

    #[test]
    fn test_factory_hands_out_independent_assemblers() {
        let factory = VdmAssemblerFactory;
        let mut first = factory.assembler();
        let mut second = factory.assembler();
        assert_eq!(first.feed_line(FIRST).unwrap(), None);
        assert!(second.feed_line(SECOND).is_err());
    }
}
