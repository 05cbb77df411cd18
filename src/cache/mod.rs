//! Read Cache Module
//!
//! Fixed-size, direct-mapped cache of device blocks.
//!
//! ## Responsibilities
//! - Serve repeated reads of a block without touching the device
//! - Map every block id to exactly one slot (`block_id % slots`)
//! - Drop a slot's copy when the writer rewrites that block
//!
//! There is no replacement policy: a miss simply overwrites whatever
//! occupied the slot.

mod direct;

pub use direct::{CacheSlot, ReadCache};
