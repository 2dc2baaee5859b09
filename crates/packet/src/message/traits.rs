use crate::sentence::Sentence;

pub use super::model::{DecodeError, DecodedMessage};

pub trait MessageDecoder: Send + Sync {
    /// Decode the sentence payload into a typed message.
    fn decode(&self, sentence: &Sentence) -> Result<DecodedMessage, DecodeError>;
}
