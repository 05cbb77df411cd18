//! Block Device Module
//!
//! The raw block device the log sits on.
//!
//! ## Responsibilities
//! - Report the device block size (fixed for the device's lifetime)
//! - Block-aligned positional reads and writes
//! - Durability barrier (`sync`)
//!
//! ## Alignment
//! Every `read_at`/`write_at` call must start on a block boundary and cover
//! a whole number of blocks. Misaligned requests fail with
//! [`LogError::Misaligned`] before touching the device.
//!
//! Closing a device is dropping it.

mod file;
mod memory;

pub use file::FileDevice;
pub use memory::MemoryDevice;

use crate::error::{LogError, Result};

/// Block-addressed device with synchronous, block-aligned I/O
pub trait BlockDevice: Send + Sync {
    /// Device block size in bytes
    fn block_size(&self) -> usize;

    /// Read `buf.len()` bytes starting at byte `offset`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Write all of `buf` starting at byte `offset`
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()>;

    /// Flush pending writes to stable storage
    fn sync(&self) -> Result<()>;
}

/// Reject requests that do not start and end on block boundaries
pub(crate) fn check_aligned(offset: u64, len: usize, block_size: usize) -> Result<()> {
    let bs = block_size as u64;
    if bs == 0 || offset % bs != 0 || len as u64 % bs != 0 {
        return Err(LogError::Misaligned {
            offset,
            len,
            block_size,
        });
    }
    Ok(())
}
