//! Tests for error handling
//!
//! These tests verify:
//! - A failed background write degrades the handle
//! - Every operation on a degraded handle fails deterministically
//! - Failed cache-fill reads are reported but retryable
//! - Invalid configuration is rejected at open

use logfs::{Config, LogError, LogFs, MemoryDevice};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_log(block_size: usize) -> (MemoryDevice, LogFs) {
    let device = MemoryDevice::new(block_size);
    let log = LogFs::with_device(device.clone(), Config::default()).unwrap();
    (device, log)
}

// =============================================================================
// Degraded Handle Tests
// =============================================================================

#[test]
fn test_write_failure_surfaces_at_flush() {
    let (device, log) = setup_log(512);
    device.fail_writes(true);

    // Append only queues bytes, so it still succeeds
    log.append(&[1u8; 1024]).unwrap();

    assert!(matches!(log.flush(), Err(LogError::Degraded(_))));
    assert!(log.is_degraded());
}

#[test]
fn test_degraded_handle_rejects_everything() {
    let (device, log) = setup_log(512);
    device.fail_writes(true);

    log.append(b"doomed").unwrap();
    assert!(matches!(log.read_bytes(0, 6), Err(LogError::Degraded(_))));

    // Recovery of the device does not revive the handle
    device.fail_writes(false);

    assert!(matches!(log.append(b"more"), Err(LogError::Degraded(_))));
    assert!(matches!(log.flush(), Err(LogError::Degraded(_))));
    assert!(matches!(log.read_bytes(0, 1), Err(LogError::Degraded(_))));
    assert!(matches!(log.close(), Err(LogError::Degraded(_))));
    assert!(device.is_empty());
}

#[test]
fn test_blocked_appender_released_on_failure() {
    let device = MemoryDevice::new(512);
    device.fail_writes(true);
    let config = Config::builder().write_buffer_blocks(1).build();
    let log = LogFs::with_device(device.clone(), config).unwrap();

    // More than the ring holds: the appender waits for space that never
    // comes and must be woken by the writer's failure
    let result = log.append(&[7u8; 4096]);

    assert!(matches!(result, Err(LogError::Degraded(_))));
    assert!(log.is_degraded());
}

#[test]
fn test_degraded_reason_names_block() {
    let (device, log) = setup_log(512);
    device.fail_writes(true);

    log.append(&[0u8; 512]).unwrap();
    match log.flush() {
        Err(LogError::Degraded(reason)) => assert!(reason.contains("block 0")),
        other => panic!("expected degraded error, got {:?}", other),
    }
}

// =============================================================================
// Read Failure Tests
// =============================================================================

#[test]
fn test_read_failure_is_not_terminal() {
    let (device, log) = setup_log(512);

    log.append(b"readable").unwrap();
    log.flush().unwrap();

    device.fail_reads(true);
    assert!(matches!(log.read_bytes(0, 8), Err(LogError::Io(_))));
    assert!(!log.is_degraded());

    device.fail_reads(false);
    assert_eq!(&log.read_bytes(0, 8).unwrap()[..], b"readable");

    // The failed fill left the slot invalid rather than half-filled
    let stats = log.stats();
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.cache_misses, 1);
}

// =============================================================================
// Open Failure Tests
// =============================================================================

#[test]
fn test_zero_write_buffer_rejected() {
    let config = Config::builder().write_buffer_blocks(0).build();
    let result = LogFs::with_device(MemoryDevice::new(512), config);
    assert!(matches!(result, Err(LogError::Config(_))));
}

#[test]
fn test_zero_read_cache_rejected() {
    let config = Config::builder().read_cache_blocks(0).build();
    let result = LogFs::with_device(MemoryDevice::new(512), config);
    assert!(matches!(result, Err(LogError::Config(_))));
}

#[test]
fn test_non_power_of_two_block_size_rejected() {
    let config = Config::builder().block_size(1000).build();
    assert!(matches!(config.validate(), Err(LogError::Config(_))));
}

#[test]
fn test_zero_block_size_device_rejected() {
    let result = LogFs::with_device(MemoryDevice::new(0), Config::default());
    assert!(matches!(result, Err(LogError::Device(_))));
}

#[test]
fn test_oversized_write_buffer_fails_cleanly() {
    let config = Config::builder().write_buffer_blocks(usize::MAX / 512).build();
    let result = LogFs::with_device(MemoryDevice::new(4096), config);
    assert!(matches!(result, Err(LogError::OutOfMemory(_))));
}
