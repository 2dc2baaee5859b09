pub use super::model::{ParseError, Sentence};

pub trait SentenceAssembler: Send {
    /// Feed one line. `Ok(None)` means more input is needed; a completed
    /// sentence resets the assembler for the next message.
    fn feed_line(&mut self, line: &str) -> Result<Option<Sentence>, ParseError>;

    /// Lines held for the message currently being assembled. Lines of a
    /// discarded partial message are not counted.
    fn buffered_lines(&self) -> usize;
}

/// Produces fresh assemblers. Packets re-derive their structural form from
/// scratch, so they never share assembler state.
pub trait AssemblerFactory: Send + Sync {
    fn assembler(&self) -> Box<dyn SentenceAssembler>;
}
