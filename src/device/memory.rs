//! In-memory block device for tests and benchmarks.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{LogError, Result};

use super::{check_aligned, BlockDevice};

/// An in-memory block device.
///
/// Clones share the same storage, so a test can hand one clone to a log
/// and keep another to inspect exactly what reached the "disk".
///
/// Writes and reads can be made to fail on demand to exercise error paths.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    block_size: usize,
    data: RwLock<Vec<u8>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    blocks_written: AtomicU64,
    blocks_read: AtomicU64,
}

impl MemoryDevice {
    /// Creates an empty device with the given block size.
    pub fn new(block_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                block_size,
                data: RwLock::new(Vec::new()),
                fail_writes: AtomicBool::new(false),
                fail_reads: AtomicBool::new(false),
                blocks_written: AtomicU64::new(0),
                blocks_read: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a copy of everything written so far.
    pub fn data(&self) -> Vec<u8> {
        self.inner.data.read().clone()
    }

    /// Bytes of device space touched by writes.
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of block writes issued (a block rewritten twice counts twice).
    pub fn blocks_written(&self) -> u64 {
        self.inner.blocks_written.load(Ordering::SeqCst)
    }

    /// Number of block reads issued.
    pub fn blocks_read(&self) -> u64 {
        self.inner.blocks_read.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl BlockDevice for MemoryDevice {
    fn block_size(&self) -> usize {
        self.inner.block_size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(LogError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected read failure",
            )));
        }
        check_aligned(offset, buf.len(), self.inner.block_size)?;

        let data = self.inner.data.read();
        let start = offset as usize;
        let end = start.saturating_add(buf.len());
        if end > data.len() {
            return Err(LogError::Device(format!(
                "read beyond device end: offset={} len={} size={}",
                offset,
                buf.len(),
                data.len()
            )));
        }
        buf.copy_from_slice(&data[start..end]);

        self.inner
            .blocks_read
            .fetch_add((buf.len() / self.inner.block_size) as u64, Ordering::SeqCst);
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(LogError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        check_aligned(offset, buf.len(), self.inner.block_size)?;

        let mut data = self.inner.data.write();
        let start = offset as usize;
        let end = start + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);

        self.inner
            .blocks_written
            .fetch_add((buf.len() / self.inner.block_size) as u64, Ordering::SeqCst);
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        // Nothing is ever pending
        Ok(())
    }
}
