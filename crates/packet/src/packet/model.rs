use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{self, AtomicI64};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::cache::Memo;
use super::codec::Codec;
use super::tags::PacketTags;
use crate::message::{DecodeError, DecodedMessage, PositionTime};
use crate::sentence::{ParseError, Sentence};

/// `best_timestamp` before it has been resolved.
pub const TIMESTAMP_UNSET: i64 = i64::MIN;
/// `best_timestamp` of a packet that carries no time.
pub const NO_TIMESTAMP: i64 = -1;

/// Why a packet has no structural form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyFailure {
    #[error("no complete sentence in packet")]
    Incomplete,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The lines of a single AIS message, including leading proprietary lines
/// and tag blocks.
///
/// Construction never parses. Every derived view (sentence, tags, decoded
/// message, timestamp) is computed on first access and cached for the life
/// of the packet.
pub struct Packet {
    raw: Bytes,
    codec: Arc<Codec>,
    sentence: Memo<Sentence, AssemblyFailure>,
    tags: Memo<Option<PacketTags>>,
    message: Memo<DecodedMessage, DecodeError>,
    /// Deterministic, so racing first writers store the same value
    best_timestamp: AtomicI64,
}

impl Packet {
    fn new(raw: Bytes, codec: Arc<Codec>, sentence: Memo<Sentence, AssemblyFailure>) -> Self {
        Self {
            raw,
            codec,
            sentence,
            tags: Memo::new(),
            message: Memo::new(),
            best_timestamp: AtomicI64::new(TIMESTAMP_UNSET),
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_bytes_with_codec(bytes, Codec::shared())
    }

    pub fn from_bytes_with_codec(bytes: impl Into<Bytes>, codec: Arc<Codec>) -> Self {
        Self::new(bytes.into(), codec, Memo::new())
    }

    /// Non-ASCII characters are stored as `?`.
    pub fn from_text(text: &str) -> Self {
        Self::from_text_with_codec(text, Codec::shared())
    }

    pub fn from_text_with_codec(text: &str, codec: Arc<Codec>) -> Self {
        let ascii: Vec<u8> = text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect();
        Self::from_bytes_with_codec(ascii, codec)
    }

    /// A packet for a sentence an assembler has already completed. The raw
    /// text is the sentence's lines joined with CRLF.
    pub fn from_sentence(sentence: Sentence, codec: Arc<Codec>) -> Self {
        let raw = Bytes::from(sentence.lines.join("\r\n"));
        Self::new(raw, codec, Memo::seeded(Ok(sentence)))
    }

    /// The exact bytes this packet was built from.
    pub fn to_bytes(&self) -> Bytes {
        self.raw.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Raw lines, split on LF or CRLF. Trailing empty lines are dropped.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.text().lines().map(str::to_string).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    pub fn codec(&self) -> &Arc<Codec> {
        &self.codec
    }

    /// The assembled sentence, or `None` if the lines never complete one.
    pub fn sentence(&self) -> Option<&Sentence> {
        self.sentence.get_or_compute(|| self.assemble()).ok()
    }

    /// Why [`sentence`](Self::sentence) is `None`, if it is.
    pub fn assembly_failure(&self) -> Option<&AssemblyFailure> {
        self.sentence.get_or_compute(|| self.assemble()).err()
    }

    fn assemble(&self) -> Result<Sentence, AssemblyFailure> {
        let mut assembler = self.codec.assembler();
        for line in self.lines() {
            match assembler.feed_line(&line) {
                Ok(Some(sentence)) => return Ok(sentence),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, line = %line, "packet: failed to assemble sentence");
                    return Err(e.into());
                }
            }
        }
        tracing::trace!("packet: lines ended before the sentence completed");
        Err(AssemblyFailure::Incomplete)
    }

    pub fn tags(&self) -> Option<&PacketTags> {
        self.tags
            .get_or_init(|| self.sentence().map(|s| self.codec.extract_tags(s)))
            .as_ref()
    }

    /// Decode the message. Decoding is attempted once; both success and
    /// failure are cached. `Ok(None)` when there is no sentence.
    pub fn decoded_message(&self) -> Result<Option<&DecodedMessage>, DecodeError> {
        let Some(sentence) = self.sentence() else {
            return Ok(None);
        };
        self.message
            .get_or_compute(|| self.codec.decode(sentence))
            .map(Some)
            .map_err(Clone::clone)
    }

    /// Like [`decoded_message`](Self::decoded_message) but both failure
    /// kinds read as `None`.
    pub fn try_decoded_message(&self) -> Option<&DecodedMessage> {
        self.decoded_message().ok().flatten()
    }

    pub fn is_valid_message(&self) -> bool {
        self.try_decoded_message().is_some()
    }

    /// Wall-clock time embedded in the sentence.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.sentence().and_then(Sentence::timestamp)
    }

    /// Milliseconds since epoch, or `-1` if the packet carries no time.
    pub fn best_timestamp(&self) -> i64 {
        let cached = self.best_timestamp.load(atomic::Ordering::Relaxed);
        if cached != TIMESTAMP_UNSET {
            return cached;
        }
        let resolved = self
            .timestamp()
            .map(|ts| ts.timestamp_millis())
            .unwrap_or(NO_TIMESTAMP);
        self.best_timestamp.store(resolved, atomic::Ordering::Relaxed);
        resolved
    }

    pub fn try_position_time(&self) -> Option<PositionTime> {
        let location = self.try_decoded_message()?.as_position()?.location()?;
        Some(PositionTime {
            location,
            timestamp_ms: self.best_timestamp(),
        })
    }

    /// Ascending by best timestamp; packets without a time sort first.
    pub fn cmp_by_timestamp(&self, other: &Packet) -> Ordering {
        self.best_timestamp().cmp(&other.best_timestamp())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("raw", &self.text())
            .field("sentence_cached", &self.sentence.is_computed())
            .field("message_cached", &self.message.is_computed())
            .finish_non_exhaustive()
    }
}
