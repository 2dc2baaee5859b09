//! Codec — the collaborators a packet derives its views with.

use std::fmt;
use std::sync::{Arc, LazyLock};

use super::tags::{PacketTags, TagBlockExtractor, TagExtractor};
use crate::message::{DecodeError, DecodedMessage, MessageDecoder, StandardDecoder};
use crate::sentence::{AssemblerFactory, Sentence, SentenceAssembler, VdmAssemblerFactory};

static STANDARD: LazyLock<Arc<Codec>> = LazyLock::new(|| Arc::new(Codec::standard()));

/// Sentence assembler factory, tag extractor and message decoder.
#[derive(Clone)]
pub struct Codec {
    assemblers: Arc<dyn AssemblerFactory>,
    tags: Arc<dyn TagExtractor>,
    decoder: Arc<dyn MessageDecoder>,
}

impl Codec {
    pub fn new(
        assemblers: Arc<dyn AssemblerFactory>,
        tags: Arc<dyn TagExtractor>,
        decoder: Arc<dyn MessageDecoder>,
    ) -> Self {
        Self { assemblers, tags, decoder }
    }

    /// VDM assembler, tag block extractor and standard decoder.
    pub fn standard() -> Self {
        Self::new(
            Arc::new(VdmAssemblerFactory),
            Arc::new(TagBlockExtractor),
            Arc::new(StandardDecoder),
        )
    }

    /// The process-wide standard codec used by `Packet::from_bytes`/`from_text`.
    pub fn shared() -> Arc<Codec> {
        Arc::clone(&STANDARD)
    }

    pub fn with_assemblers(mut self, assemblers: Arc<dyn AssemblerFactory>) -> Self {
        self.assemblers = assemblers;
        self
    }

    pub fn with_tag_extractor(mut self, tags: Arc<dyn TagExtractor>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn MessageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn assembler(&self) -> Box<dyn SentenceAssembler> {
        self.assemblers.assembler()
    }

    pub fn extract_tags(&self, sentence: &Sentence) -> PacketTags {
        self.tags.extract(sentence)
    }

    pub fn decode(&self, sentence: &Sentence) -> Result<DecodedMessage, DecodeError> {
        self.decoder.decode(sentence)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}
