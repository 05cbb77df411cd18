//! Write Buffer Module
//!
//! Bounded ring of bytes between `append` callers and the background writer.
//!
//! ## Responsibilities
//! - Accept appended bytes in order, wrapping at the end of the ring
//! - Hand complete blocks to the writer, oldest first
//! - Pad a trailing partial block for a flush, then retract the padding
//!
//! ## Layout
//! ```text
//!            tail (next block to drain)      head (next append)
//!              │                               │
//! ┌────────────▼───────────────────────────────▼──────────────┐
//! │   free     │ blk N │ blk N+1 │ partial N+2 │     free     │
//! └───────────────────────────────────────────────────────────┘
//!   capacity = write_buffer_blocks × block_size
//!   [tail, head) wrapped = buffered bytes not yet on the device
//!   file_offset = device offset of the block at `tail`
//! ```

mod aligned;
mod ring;

pub use aligned::AlignedBuf;
pub use ring::WriteBuffer;
