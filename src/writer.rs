//! Background Writer
//!
//! Single worker thread that drains complete blocks from the write buffer
//! to the device, oldest first.
//!
//! ## State Machine
//! ```text
//!            full block ready              block written
//!  ┌─────────┐ ─────────────▶ ┌─────────┐ ─────────────┐
//!  │ WAITING │                │ WRITING │              │
//!  └─────────┘ ◀───────────── └─────────┘ ◀────────────┘
//!       │                          │
//!       │ stop, no full block      │ device write failed
//!       ▼                          ▼
//!  ┌─────────┐              (handle degraded)
//!  │ EXITED  │ ◀─────────────────────┘
//!  └─────────┘
//! ```
//!
//! The buffer lock is released while a device write is in flight, so
//! appenders keep filling free space. The cache slot for the block being
//! written is invalidated before and after the write: the second pass
//! drops any copy a concurrent cache fill installed mid-write.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::MutexGuard;

use crate::buffer::AlignedBuf;
use crate::engine::Shared;
use crate::error::Result;

/// Where the background writer is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// No complete block is buffered
    Waiting,
    /// Draining one block to the device
    Writing,
    /// Stopped (after a stop request or a failed write)
    Exited,
}

/// Start the writer thread for `shared`
///
/// `scratch` is the block-sized staging buffer the writer copies each block
/// into before releasing the buffer lock.
pub(crate) fn spawn(shared: Arc<Shared>, scratch: AlignedBuf) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("logfs-writer".to_string())
        .spawn(move || run(&shared, scratch))?;
    Ok(handle)
}

fn run(shared: &Shared, mut scratch: AlignedBuf) {
    // Declared first so it drops after the state guard below
    let _exit = ExitGuard { shared };

    let block_size = shared.block_size as u64;
    let mut state = shared.state.lock();

    loop {
        state.writer = WriterState::Waiting;
        while !state.ring.has_full_block() && !state.stop {
            shared.item_avail.wait(&mut state);
        }
        if !state.ring.has_full_block() {
            // Stop requested and nothing left to drain
            break;
        }

        state.writer = WriterState::Writing;
        let offset = state.ring.file_offset();
        let block_id = offset / block_size;

        state.cache.invalidate(block_id);
        scratch.as_mut_slice().copy_from_slice(state.ring.front_block());

        let result = MutexGuard::unlocked(&mut state, || {
            shared.write_block(offset, scratch.as_slice())
        });

        state.cache.invalidate(block_id);

        match result {
            Ok(()) => {
                state.ring.pop_block();
                shared.counters.blocks_written.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Wrote block {} at offset {}", block_id, offset);

                shared.space_avail.notify_all();
                if state.flush_pending && state.ring.filled() == 0 {
                    shared.flushed.notify_all();
                }
            }
            Err(e) => {
                tracing::error!("Write of block {} at offset {} failed: {}", block_id, offset, e);
                state.failure = Some(format!("write of block {} failed: {}", block_id, e));
                break;
            }
        }
    }
}

/// Marks the writer exited and wakes every waiter, including on panic
struct ExitGuard<'a> {
    shared: &'a Shared,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        if thread::panicking() && state.failure.is_none() {
            state.failure = Some("background writer panicked".to_string());
        }
        state.writer = WriterState::Exited;
        drop(state);

        self.shared.space_avail.notify_all();
        self.shared.item_avail.notify_all();
        self.shared.flushed.notify_all();
        tracing::debug!("Background writer exited");
    }
}
