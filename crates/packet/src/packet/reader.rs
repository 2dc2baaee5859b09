//! Reader — groups a line stream into packets.

use std::io::{self, BufRead};
use std::sync::Arc;

use super::codec::Codec;
use super::model::Packet;
use crate::sentence::SentenceAssembler;

/// Default bound on lines buffered for one packet.
pub const DEFAULT_MAX_LINES: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    pub lines: u64,
    pub packets: u64,
    pub parse_errors: u64,
    /// Buffers dropped for exceeding the line bound
    pub overflows: u64,
}

/// Iterator of packets over a line-oriented input.
///
/// Each packet holds exactly the lines its sentence consumed, and its
/// sentence is already cached. Lines that fail to parse are dropped along
/// with whatever was buffered before them.
pub struct PacketReader<R> {
    input: R,
    codec: Arc<Codec>,
    assembler: Box<dyn SentenceAssembler>,
    max_lines: usize,
    buf: Vec<u8>,
    stats: ReaderStats,
}

impl<R: BufRead> PacketReader<R> {
    pub fn new(input: R) -> Self {
        Self::with_codec(input, Codec::shared())
    }

    pub fn with_codec(input: R, codec: Arc<Codec>) -> Self {
        let assembler = codec.assembler();
        Self {
            input,
            codec,
            assembler,
            max_lines: DEFAULT_MAX_LINES,
            buf: Vec::new(),
            stats: ReaderStats::default(),
        }
    }

    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines.max(1);
        self
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    fn restart(&mut self) {
        self.assembler = self.codec.assembler();
    }
}

impl<R: BufRead> Iterator for PacketReader<R> {
    type Item = io::Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.input.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    let buffered = self.assembler.buffered_lines();
                    if buffered > 0 {
                        tracing::debug!(lines = buffered, "reader: input ended inside a packet");
                        self.restart();
                    }
                    return None;
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            }
            self.stats.lines += 1;

            let line = String::from_utf8_lossy(&self.buf).into_owned();
            match self.assembler.feed_line(&line) {
                Ok(Some(sentence)) => {
                    self.stats.packets += 1;
                    return Some(Ok(Packet::from_sentence(sentence, Arc::clone(&self.codec))));
                }
                Ok(None) => {
                    if self.assembler.buffered_lines() > self.max_lines {
                        tracing::debug!(max_lines = self.max_lines, "reader: packet too long, dropping buffered lines");
                        self.stats.overflows += 1;
                        self.restart();
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, line = %line.trim_end(), "reader: dropping unparseable line");
                    self.stats.parse_errors += 1;
                    self.restart();
                }
            }
        }
    }
}
