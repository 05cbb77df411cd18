//! Engine Module
//!
//! The storage handle that ties the write buffer, background writer, read
//! cache and device together.
//!
//! ## Responsibilities
//! - Open a device and start its background writer
//! - Queue appends in order, blocking while the write buffer is full
//! - Flush: pad the trailing partial block, wait for the writer, retract
//! - Read any previously appended range through the read cache
//! - Shut down without losing buffered bytes

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::{Bytes, BytesMut};
use parking_lot::{Condvar, Mutex};

use crate::buffer::{AlignedBuf, WriteBuffer};
use crate::cache::ReadCache;
use crate::config::Config;
use crate::device::{BlockDevice, FileDevice};
use crate::error::{LogError, Result};
use crate::writer::{self, WriterState};

/// An open append-only log
///
/// ## Concurrency Model
///
/// - **Appends and flushes**: serialized by `append_lock`, so the bytes of
///   one `append` are never interleaved with another's and a flush never
///   sees a half-queued append
/// - **Buffer, cache, writer flags**: one mutex (`state`) with three condition
///   variables: space available, full block available, flush complete
/// - **Device I/O**: serialized by a separate device lock, taken by the
///   writer's block writes and by cache-miss reads
///
/// `LogFs` is `Send + Sync`; share it by reference or `Arc` across threads.
pub struct LogFs {
    /// State shared with the background writer
    shared: Arc<Shared>,

    /// Writer thread, `None` once shut down
    writer: Option<JoinHandle<()>>,
}

/// State shared between callers and the background writer
pub(crate) struct Shared {
    /// Buffer, cache and coordination flags
    pub(crate) state: Mutex<State>,

    /// Signalled when the writer frees buffer space
    pub(crate) space_avail: Condvar,

    /// Signalled when a full block is ready (or stop is requested)
    pub(crate) item_avail: Condvar,

    /// Signalled when a pending flush has fully drained
    pub(crate) flushed: Condvar,

    /// Serializes appends and flushes
    append_lock: Mutex<()>,

    /// The raw device
    device: Box<dyn BlockDevice>,

    /// Serializes device I/O, independent of `state`
    device_lock: Mutex<()>,

    /// Device block size, fixed at open
    pub(crate) block_size: usize,

    pub(crate) counters: Counters,
}

/// Everything guarded by the buffer lock
pub(crate) struct State {
    pub(crate) ring: WriteBuffer,
    pub(crate) cache: ReadCache,
    pub(crate) writer: WriterState,

    /// Writer should exit once no full block remains
    pub(crate) stop: bool,

    /// A flush is waiting for the ring to drain
    pub(crate) flush_pending: bool,

    /// Padding bytes currently counted in `ring.filled()`
    pad: usize,

    /// Why the handle is degraded, if it is
    pub(crate) failure: Option<String>,
}

impl State {
    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(LogError::Degraded(reason.clone())),
            None => Ok(()),
        }
    }
}

impl Shared {
    pub(crate) fn write_block(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let _device = self.device_lock.lock();
        self.device.write_at(offset, buf)
    }

    fn read_block(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let _device = self.device_lock.lock();
        self.device.read_at(offset, buf)
    }

    fn sync_device(&self) -> Result<()> {
        let _device = self.device_lock.lock();
        self.device.sync()
    }
}

/// Running totals, updated lock-free
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) bytes_appended: AtomicU64,
    pub(crate) blocks_written: AtomicU64,
    pub(crate) flushes: AtomicU64,
    pub(crate) cache_hits: AtomicU64,
    pub(crate) cache_misses: AtomicU64,
}

/// Snapshot of a handle's activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Bytes accepted by `append`
    pub bytes_appended: u64,
    /// Block writes completed by the background writer (padded rewrites included)
    pub blocks_written: u64,
    /// Flushes that had buffered bytes to push out
    pub flushes: u64,
    /// Block lookups served from the read cache
    pub cache_hits: u64,
    /// Block lookups that went to the device
    pub cache_misses: u64,
}

impl LogFs {
    /// Open the device at `path` with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Open the device at `path`
    ///
    /// The path must name an existing regular file or block device unless
    /// `config.create` is set.
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let device = FileDevice::open(path.as_ref(), &config)?;
        Self::with_device(device, config)
    }

    /// Start a log on an already opened device
    ///
    /// The block size always comes from the device; `config.block_size`
    /// only applies when opening by path.
    ///
    /// Everything allocated before a failure is released on return, and the
    /// device is closed (dropped) with it.
    pub fn with_device<D>(device: D, config: Config) -> Result<Self>
    where
        D: BlockDevice + 'static,
    {
        config.validate()?;

        let block_size = device.block_size();
        if block_size == 0 {
            return Err(LogError::Device(
                "device reported a zero block size".to_string(),
            ));
        }

        let ring = WriteBuffer::new(block_size, config.write_buffer_blocks)?;
        let cache = ReadCache::new(config.read_cache_blocks, block_size)?;
        let scratch = AlignedBuf::zeroed(block_size, block_size)?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                ring,
                cache,
                writer: WriterState::Waiting,
                stop: false,
                flush_pending: false,
                pad: 0,
                failure: None,
            }),
            space_avail: Condvar::new(),
            item_avail: Condvar::new(),
            flushed: Condvar::new(),
            append_lock: Mutex::new(()),
            device: Box::new(device),
            device_lock: Mutex::new(()),
            block_size,
            counters: Counters::default(),
        });

        let handle = writer::spawn(Arc::clone(&shared), scratch)?;

        tracing::debug!(
            "Opened log (block_size={}, write_buffer_blocks={}, read_cache_blocks={})",
            block_size,
            config.write_buffer_blocks,
            config.read_cache_blocks
        );

        Ok(Self {
            shared,
            writer: Some(handle),
        })
    }

    /// Append bytes to the end of the log
    ///
    /// Returns the logical offset of the first appended byte. Returns once
    /// every byte is queued, not once it is on the device. Blocks while the
    /// write buffer is full.
    ///
    /// A device failure in the background writer is never reported by the
    /// append that queued the bytes; it surfaces at the next flush, read or
    /// close, and every call after that fails with [`LogError::Degraded`].
    pub fn append(&self, bytes: &[u8]) -> Result<u64> {
        let shared = &*self.shared;
        let _append = shared.append_lock.lock();

        let mut state = shared.state.lock();
        state.check_failure()?;

        let offset = state.ring.logical_end();
        let mut rest = bytes;

        while !rest.is_empty() {
            while state.ring.free() == 0 && state.failure.is_none() {
                shared.space_avail.wait(&mut state);
            }
            state.check_failure()?;

            let taken = state.ring.push(rest);
            rest = &rest[taken..];

            if state.ring.has_full_block() {
                shared.item_avail.notify_one();
            }
        }

        shared
            .counters
            .bytes_appended
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        Ok(offset)
    }

    /// Force every appended byte onto the device
    ///
    /// A trailing partial block is zero-padded and written, then the padding
    /// is retracted so the next append continues in the same block and the
    /// next drain rewrites it.
    pub fn flush(&self) -> Result<()> {
        self.flush_to_device().map(|_| ())
    }

    /// Flush and return the logical end covered by the flush
    fn flush_to_device(&self) -> Result<u64> {
        let shared = &*self.shared;
        let _append = shared.append_lock.lock();

        let mut state = shared.state.lock();
        state.check_failure()?;

        if state.ring.filled() == 0 {
            return Ok(state.ring.logical_end());
        }

        let pad = state.ring.pad_to_block();
        state.pad = pad;
        state.flush_pending = true;
        shared.item_avail.notify_one();

        while state.ring.filled() > 0 && state.failure.is_none() {
            shared.flushed.wait(&mut state);
        }
        state.flush_pending = false;
        state.check_failure()?;

        if pad > 0 {
            state.ring.retract(pad);
        }
        state.pad = 0;

        shared.counters.flushes.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Flushed log to offset {} (pad={})", state.ring.logical_end(), pad);

        Ok(state.ring.logical_end())
    }

    /// Read `buf.len()` bytes starting at logical `offset`
    ///
    /// Flushes first, so every append that completed before this call is
    /// visible. The range must lie within the log; anything past the end
    /// fails with [`LogError::ReadPastEnd`].
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let size = self.flush_to_device()?;

        let end = offset.checked_add(buf.len() as u64);
        if end.map_or(true, |end| end > size) {
            return Err(LogError::ReadPastEnd {
                offset,
                len: buf.len(),
                size,
            });
        }

        let shared = &*self.shared;
        let block_size = shared.block_size;
        let mut state = shared.state.lock();
        state.check_failure()?;

        let mut pos = 0;
        let mut cursor = offset;
        while pos < buf.len() {
            let block_id = cursor / block_size as u64;
            let within = (cursor % block_size as u64) as usize;
            let n = (block_size - within).min(buf.len() - pos);

            let (block, hit) = state.cache.get_or_fill(block_id, |slot| {
                tracing::trace!("Read cache miss for block {}", block_id);
                shared.read_block(block_id * block_size as u64, slot)
            })?;
            buf[pos..pos + n].copy_from_slice(&block[within..within + n]);

            let counter = if hit {
                &shared.counters.cache_hits
            } else {
                &shared.counters.cache_misses
            };
            counter.fetch_add(1, Ordering::Relaxed);

            pos += n;
            cursor += n as u64;
        }

        Ok(())
    }

    /// Read `len` bytes at `offset` into a new buffer
    pub fn read_bytes(&self, offset: u64, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        self.read(offset, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Flush, stop the background writer and sync the device
    ///
    /// Buffered bytes are never discarded. On a degraded handle the writer is
    /// still stopped and joined, and the degradation error is returned.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.writer.take() else {
            return Ok(());
        };

        let flushed = self.flush();

        self.shared.state.lock().stop = true;
        self.shared.item_avail.notify_all();
        let joined = handle.join().map_err(|_| LogError::WriterPanicked);

        let synced = if self.is_degraded() {
            Ok(())
        } else {
            self.shared.sync_device()
        };

        tracing::debug!("Closed log at offset {}", self.len());

        flushed?;
        joined?;
        synced
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Device block size in bytes
    pub fn block_size(&self) -> usize {
        self.shared.block_size
    }

    /// Logical length of the log (appended bytes, on device or buffered)
    pub fn len(&self) -> u64 {
        let state = self.shared.state.lock();
        state.ring.logical_end() - state.pad as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A background write failed; every further operation fails
    pub fn is_degraded(&self) -> bool {
        self.shared.state.lock().failure.is_some()
    }

    /// Current state of the background writer
    pub fn writer_state(&self) -> WriterState {
        self.shared.state.lock().writer
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> LogStats {
        let counters = &self.shared.counters;
        LogStats {
            bytes_appended: counters.bytes_appended.load(Ordering::Relaxed),
            blocks_written: counters.blocks_written.load(Ordering::Relaxed),
            flushes: counters.flushes.load(Ordering::Relaxed),
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: counters.cache_misses.load(Ordering::Relaxed),
        }
    }
}

impl Drop for LogFs {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Error closing log on drop: {}", e);
        }
    }
}
