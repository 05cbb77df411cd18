//! Direct-mapped read cache implementation

use crate::buffer::AlignedBuf;
use crate::error::{LogError, Result};

/// One block-sized cache slot
#[derive(Debug)]
pub struct CacheSlot {
    /// Device block currently held, `None` when the slot is invalid
    block_id: Option<u64>,
    /// Block contents (block aligned)
    data: AlignedBuf,
}

impl CacheSlot {
    pub fn is_valid(&self) -> bool {
        self.block_id.is_some()
    }

    pub fn block_id(&self) -> Option<u64> {
        self.block_id
    }

    fn holds(&self, block_id: u64) -> bool {
        self.block_id == Some(block_id)
    }
}

/// Direct-mapped cache of device blocks
///
/// Invariant: a valid slot's bytes equal the device's bytes for its
/// `block_id` as of the last write or read of that block.
#[derive(Debug)]
pub struct ReadCache {
    slots: Vec<CacheSlot>,
    block_size: usize,
}

impl ReadCache {
    /// Allocate `slots` zeroed, invalid slots of `block_size` bytes each
    pub fn new(slots: usize, block_size: usize) -> Result<Self> {
        if slots == 0 {
            return Err(LogError::Config(
                "read cache needs at least one slot".to_string(),
            ));
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(slots)
            .map_err(|_| LogError::OutOfMemory("read cache"))?;
        for _ in 0..slots {
            entries.push(CacheSlot {
                block_id: None,
                data: AlignedBuf::zeroed(block_size, block_size)?,
            });
        }

        Ok(Self {
            slots: entries,
            block_size,
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Slot index that is home to `block_id`
    pub fn slot_index(&self, block_id: u64) -> usize {
        (block_id % self.slots.len() as u64) as usize
    }

    pub fn slot(&self, index: usize) -> Option<&CacheSlot> {
        self.slots.get(index)
    }

    /// Cached bytes for `block_id`, if its slot holds it
    pub fn get(&self, block_id: u64) -> Option<&[u8]> {
        let slot = &self.slots[self.slot_index(block_id)];
        if slot.holds(block_id) {
            Some(slot.data.as_slice())
        } else {
            None
        }
    }

    /// Return the cached block, filling the slot through `fill` on a miss
    ///
    /// The boolean is `true` for a hit. If `fill` fails the slot is left
    /// invalid and the error is returned.
    pub fn get_or_fill<F>(&mut self, block_id: u64, fill: F) -> Result<(&[u8], bool)>
    where
        F: FnOnce(&mut [u8]) -> Result<()>,
    {
        let index = self.slot_index(block_id);
        let slot = &mut self.slots[index];

        let hit = slot.holds(block_id);
        if !hit {
            slot.block_id = None;
            fill(slot.data.as_mut_slice())?;
            slot.block_id = Some(block_id);
        }

        Ok((slot.data.as_slice(), hit))
    }

    /// Drop the cached copy of `block_id`, returning whether one was held
    ///
    /// Other blocks sharing the slot are left alone.
    pub fn invalidate(&mut self, block_id: u64) -> bool {
        let index = self.slot_index(block_id);
        let slot = &mut self.slots[index];
        if slot.holds(block_id) {
            slot.block_id = None;
            true
        } else {
            false
        }
    }
}
