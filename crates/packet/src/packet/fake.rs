//! Fake — instrumented collaborators and canned sentences for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::codec::Codec;
use crate::message::{DecodeError, DecodedMessage, MessageDecoder};
use crate::sentence::{AssemblerFactory, Sentence, SentenceAssembler, VdmAssemblerFactory};

// ── Canned lines ────────────────────────────────────────────────

/// Message 1, MMSI 219000001, 55.75N 12.5E
pub const POSITION_LINE: &str = "!AIVDM,1,1,,A,13@ndh@P1sPq>70Oq`49:GDt0000,0*52";
/// Message 3 with longitude/latitude "not available"
pub const NO_LOCATION_LINE: &str = "!AIVDM,1,1,,A,33@ndhPP1sdtSF0l4Q@9:GDt0000,0*4E";
/// Message 5 split over two fragments
pub const STATIC_FIRST: &str =
    "!AIVDM,2,1,3,A,53@ndi000000000000000000000000000000000000000000000000000000,0*33";
pub const STATIC_SECOND: &str = "!AIVDM,2,2,3,A,00000000000,2*27";
/// Message id 0 (semantic decode error)
pub const UNKNOWN_ID_LINE: &str = "!AIVDM,1,1,,A,03@ndi@000000000000000000000,0*76";
/// Payload with a '~' (malformed payload)
pub const BAD_PAYLOAD_LINE: &str = "!AIVDM,1,1,,A,13u?etPv2;0n:dDPwUM1U1Cb06~D,0*63";
/// 2013-01-01T00:00:00Z
pub const TAG_2013: &str = "\\c:1356994800*54\\";
pub const TIME_2013_MS: i64 = 1_356_994_800_000;

// ── Counting assembler factory ──────────────────────────────────

/// Wraps the VDM assembler factory and counts how many assemblers it handed out.
#[derive(Default)]
pub struct CountingAssemblers {
    created: AtomicUsize,
}

impl CountingAssemblers {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl AssemblerFactory for CountingAssemblers {
    fn assembler(&self) -> Box<dyn SentenceAssembler> {
        self.created.fetch_add(1, Ordering::SeqCst);
        VdmAssemblerFactory.assembler()
    }
}

// ── Scripted decoder ────────────────────────────────────────────

/// Returns the same outcome for every sentence and counts calls.
pub struct ScriptedDecoder {
    outcome: Result<DecodedMessage, DecodeError>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn new(outcome: Result<DecodedMessage, DecodeError>) -> Self {
        Self { outcome, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessageDecoder for ScriptedDecoder {
    fn decode(&self, _sentence: &Sentence) -> Result<DecodedMessage, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Standard codec with a counting assembler factory.
pub fn counting_codec() -> (Arc<Codec>, Arc<CountingAssemblers>) {
    let assemblers = Arc::new(CountingAssemblers::default());
    let codec = Codec::standard().with_assemblers(assemblers.clone());
    (Arc::new(codec), assemblers)
}

/// Standard codec with a scripted decoder.
pub fn scripted_codec(outcome: Result<DecodedMessage, DecodeError>) -> (Arc<Codec>, Arc<ScriptedDecoder>) {
    let decoder = Arc::new(ScriptedDecoder::new(outcome));
    let codec = Codec::standard().with_decoder(decoder.clone());
    (Arc::new(codec), decoder)
}
