//! Tests for the write buffer ring and the read cache
//!
//! These tests verify:
//! - Ring accounting (head, tail, filled, file_offset) across wrap-around
//! - Pad-to-block and retract bookkeeping
//! - Direct-mapped slot selection, eviction and invalidation

use logfs::buffer::WriteBuffer;
use logfs::cache::ReadCache;
use logfs::LogError;

// =============================================================================
// WriteBuffer Tests
// =============================================================================

#[test]
fn test_new_ring_is_empty() {
    let ring = WriteBuffer::new(512, 4).unwrap();

    assert_eq!(ring.capacity(), 2048);
    assert_eq!(ring.free(), 2048);
    assert_eq!(ring.filled(), 0);
    assert_eq!(ring.logical_end(), 0);
    assert!(!ring.has_full_block());
}

#[test]
fn test_ring_rejects_zero_sizes() {
    assert!(matches!(WriteBuffer::new(0, 4), Err(LogError::Config(_))));
    assert!(matches!(WriteBuffer::new(512, 0), Err(LogError::Config(_))));
}

#[test]
fn test_push_pop_and_wrap() {
    let mut ring = WriteBuffer::new(4, 2).unwrap();

    assert_eq!(ring.push(&[1, 2, 3, 4, 5, 6]), 6);
    assert!(ring.has_full_block());
    assert_eq!(ring.front_block(), &[1, 2, 3, 4]);

    ring.pop_block();
    assert_eq!(ring.tail(), 4);
    assert_eq!(ring.filled(), 2);
    assert_eq!(ring.file_offset(), 4);

    // Wraps past the end of the ring
    assert_eq!(ring.push(&[7, 8, 9, 10, 11]), 5);
    assert_eq!(ring.head(), 3);
    assert_eq!(ring.filled(), 7);
    assert_eq!(ring.front_block(), &[5, 6, 7, 8]);

    ring.pop_block();
    assert_eq!(ring.tail(), 0);
    assert_eq!(ring.filled(), 3);
    assert!(!ring.has_full_block());
    assert_eq!(ring.logical_end(), 11);
}

#[test]
fn test_push_stops_at_capacity() {
    let mut ring = WriteBuffer::new(4, 2).unwrap();

    assert_eq!(ring.push(&[0xEE; 20]), 8);
    assert_eq!(ring.free(), 0);
    assert_eq!(ring.push(&[1]), 0);
}

#[test]
fn test_pad_and_retract() {
    let mut ring = WriteBuffer::new(4, 2).unwrap();
    ring.push(&[1, 2, 3, 4, 5, 6]);
    ring.pop_block();

    let pad = ring.pad_to_block();
    assert_eq!(pad, 2);
    assert_eq!(ring.filled(), 4);
    assert_eq!(ring.head(), 0);
    assert_eq!(ring.front_block(), &[5, 6, 0, 0]);

    ring.pop_block();
    assert_eq!(ring.file_offset(), 8);

    ring.retract(pad);
    assert_eq!(ring.head(), 6);
    assert_eq!(ring.tail(), 4);
    assert_eq!(ring.filled(), 2);
    assert_eq!(ring.file_offset(), 4);
    assert_eq!(ring.logical_end(), 6);

    // Appending resumes exactly where the real data ended
    ring.push(&[7, 8]);
    assert_eq!(ring.front_block(), &[5, 6, 7, 8]);
}

#[test]
fn test_pad_aligned_is_noop() {
    let mut ring = WriteBuffer::new(4, 2).unwrap();
    assert_eq!(ring.pad_to_block(), 0);

    ring.push(&[1, 2, 3, 4]);
    assert_eq!(ring.pad_to_block(), 0);
    assert_eq!(ring.filled(), 4);
}

#[test]
fn test_pad_zeroes_stale_bytes() {
    let mut ring = WriteBuffer::new(4, 2).unwrap();
    ring.push(&[0xFF; 8]);
    ring.pop_block();
    ring.pop_block();

    ring.push(&[0x11]);
    ring.pad_to_block();
    assert_eq!(ring.front_block(), &[0x11, 0, 0, 0]);
}

// =============================================================================
// ReadCache Tests
// =============================================================================

#[test]
fn test_cache_rejects_zero_slots() {
    assert!(matches!(ReadCache::new(0, 512), Err(LogError::Config(_))));
}

#[test]
fn test_cache_miss_then_hit() {
    let mut cache = ReadCache::new(4, 16).unwrap();
    assert!(cache.get(1).is_none());

    let (data, hit) = cache
        .get_or_fill(1, |slot| {
            slot.fill(7);
            Ok(())
        })
        .unwrap();
    assert!(!hit);
    assert!(data.iter().all(|&b| b == 7));

    let (data, hit) = cache
        .get_or_fill(1, |_| Err(LogError::Device("must not be called".to_string())))
        .unwrap();
    assert!(hit);
    assert_eq!(data.len(), 16);
}

#[test]
fn test_cache_collision_evicts() {
    let mut cache = ReadCache::new(4, 16).unwrap();
    assert_eq!(cache.slot_index(1), cache.slot_index(5));

    cache.get_or_fill(1, |slot| { slot.fill(1); Ok(()) }).unwrap();
    cache.get_or_fill(5, |slot| { slot.fill(5); Ok(()) }).unwrap();

    assert!(cache.get(1).is_none());
    assert!(cache.get(5).unwrap().iter().all(|&b| b == 5));
    assert_eq!(cache.slot(1).unwrap().block_id(), Some(5));
}

#[test]
fn test_cache_invalidate_exact_block_only() {
    let mut cache = ReadCache::new(4, 16).unwrap();
    cache.get_or_fill(5, |_| Ok(())).unwrap();

    // Same slot, different block id: left alone
    assert!(!cache.invalidate(9));
    assert!(cache.get(5).is_some());

    assert!(cache.invalidate(5));
    assert!(!cache.invalidate(5));
    assert!(!cache.slot(1).unwrap().is_valid());
}

#[test]
fn test_cache_failed_fill_leaves_slot_invalid() {
    let mut cache = ReadCache::new(4, 16).unwrap();
    cache.get_or_fill(2, |_| Ok(())).unwrap();

    let result = cache.get_or_fill(6, |_| Err(LogError::Device("boom".to_string())));
    assert!(result.is_err());
    assert!(!cache.slot(2).unwrap().is_valid());
    assert!(cache.get(2).is_none());
}
