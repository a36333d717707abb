//! Tape deck: a FIFO of raw tape blocks for the ROM loading trap.
//!
//! Each block is the on-tape byte stream (flag, payload, checksum).
//! Container parsing (TAP/TZX) happens outside the core; the deck just
//! hands blocks out in order.

use emu_core::TapeProvider;

/// Virtual tape deck holding parsed blocks and a cursor.
#[derive(Default)]
pub struct TapeDeck {
    blocks: Vec<Vec<u8>>,
    index: usize,
}

impl TapeDeck {
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            index: 0,
        }
    }

    /// Append a raw block (flag + payload + checksum).
    pub fn insert_block(&mut self, block: Vec<u8>) {
        self.blocks.push(block);
    }

    /// Rewind to the first block.
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Remove all blocks.
    pub fn eject(&mut self) {
        self.blocks.clear();
        self.index = 0;
    }

    /// Whether any blocks remain to be read.
    #[must_use]
    pub fn has_blocks(&self) -> bool {
        self.index < self.blocks.len()
    }
}

impl TapeProvider for TapeDeck {
    fn next_block(&mut self) -> Option<Vec<u8>> {
        let block = self.blocks.get(self.index)?.clone();
        self.index += 1;
        Some(block)
    }
}
