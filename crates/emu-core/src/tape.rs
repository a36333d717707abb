//! Tape block source.

/// An opaque provider of tape blocks for the ROM loading trap.
///
/// Each block is the raw on-tape byte stream: flag byte, payload,
/// checksum byte. Blocks are consumed FIFO; container parsing (TAP/TZX)
/// happens outside the core.
pub trait TapeProvider {
    /// The next block, or `None` when the tape is exhausted.
    fn next_block(&mut self) -> Option<Vec<u8>>;
}
