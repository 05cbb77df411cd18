//! Error types for logfs
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for logfs operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("Device error: {0}")]
    Device(String),

    #[error("Misaligned device access: offset={offset} len={len} block_size={block_size}")]
    Misaligned {
        offset: u64,
        len: usize,
        block_size: usize,
    },

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Read beyond end of log: offset={offset} len={len} size={size}")]
    ReadPastEnd { offset: u64, len: usize, size: u64 },

    #[error("Log is degraded: {0}")]
    Degraded(String),

    #[error("Out of memory allocating {0}")]
    OutOfMemory(&'static str),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Background writer panicked")]
    WriterPanicked,
}
