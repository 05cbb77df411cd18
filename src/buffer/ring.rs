//! Write buffer ring
//!
//! Fixed-capacity byte ring sized to a whole number of device blocks.

use crate::error::{LogError, Result};

use super::AlignedBuf;

/// Bytes appended but not yet written to the device
///
/// ## Invariants
/// - `capacity` is a multiple of `block_size`, so a block never wraps
/// - `0 <= filled <= capacity`
/// - `tail` and `file_offset` are always block aligned
/// - `head == (tail + filled) % capacity`
#[derive(Debug)]
pub struct WriteBuffer {
    /// Ring storage (block aligned)
    data: AlignedBuf,
    /// Device block size
    block_size: usize,
    /// Next write position (producer)
    head: usize,
    /// Next block to drain (consumer)
    tail: usize,
    /// Bytes between tail and head
    filled: usize,
    /// Device offset where the block at `tail` lands
    file_offset: u64,
}

impl WriteBuffer {
    /// Allocate a ring of `blocks` device blocks
    pub fn new(block_size: usize, blocks: usize) -> Result<Self> {
        if block_size == 0 || blocks == 0 {
            return Err(LogError::Config(format!(
                "write buffer needs a positive block size and block count (got {}x{})",
                blocks, block_size
            )));
        }
        let capacity = block_size
            .checked_mul(blocks)
            .ok_or(LogError::OutOfMemory("write buffer"))?;

        Ok(Self {
            data: AlignedBuf::zeroed(capacity, block_size)?,
            block_size,
            head: 0,
            tail: 0,
            filled: 0,
            file_offset: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.filled
    }

    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// Logical end of the log: everything on the device plus everything buffered
    pub fn logical_end(&self) -> u64 {
        self.file_offset + self.filled as u64
    }

    /// At least one complete block is waiting at `tail`
    pub fn has_full_block(&self) -> bool {
        self.filled >= self.block_size
    }

    /// Copy as much of `bytes` as fits, returning the number of bytes taken
    ///
    /// Copies whole contiguous spans, splitting only at the ring wrap.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.free());
        let capacity = self.capacity();

        let mut copied = 0;
        while copied < n {
            let span = (capacity - self.head).min(n - copied);
            self.data.as_mut_slice()[self.head..self.head + span]
                .copy_from_slice(&bytes[copied..copied + span]);
            self.head = (self.head + span) % capacity;
            copied += span;
        }

        self.filled += n;
        n
    }

    /// The oldest complete block. Only meaningful when `has_full_block()`.
    pub fn front_block(&self) -> &[u8] {
        &self.data.as_slice()[self.tail..self.tail + self.block_size]
    }

    /// Release the oldest block after it reached the device
    pub fn pop_block(&mut self) {
        debug_assert!(self.has_full_block());
        self.tail = (self.tail + self.block_size) % self.capacity();
        self.filled -= self.block_size;
        self.file_offset += self.block_size as u64;
    }

    /// Zero-fill the trailing partial block up to the next block boundary
    ///
    /// Returns the number of padding bytes added (0 when already aligned).
    pub fn pad_to_block(&mut self) -> usize {
        let partial = self.filled % self.block_size;
        if partial == 0 {
            return 0;
        }

        let pad = self.block_size - partial;
        let capacity = self.capacity();
        self.data.as_mut_slice()[self.head..self.head + pad].fill(0);
        self.head = (self.head + pad) % capacity;
        self.filled += pad;
        pad
    }

    /// Undo `pad_to_block` once the padded block has been drained
    ///
    /// The partial bytes come back into the buffer and `file_offset` steps
    /// back one block, so the next drain rewrites that same device block
    /// with the padding replaced by real data.
    pub fn retract(&mut self, pad: usize) {
        debug_assert_eq!(self.filled, 0);
        debug_assert!(pad > 0 && pad < self.block_size);

        let capacity = self.capacity();
        self.head = (self.head + capacity - pad) % capacity;
        self.tail = (self.tail + capacity - self.block_size) % capacity;
        self.filled = self.block_size - pad;
        self.file_offset -= self.block_size as u64;
    }
}
