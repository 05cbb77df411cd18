//! # logfs
//!
//! An append-only, log-structured storage layer over a raw block device:
//! - Buffered, order-preserving appends
//! - Random-offset reads consistent with every completed append
//! - Asynchronous background writer draining whole blocks
//! - Direct-mapped read cache of device blocks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Callers (append / read / close)              │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │ append                      │ read
//!                 ▼                             ▼
//!   ┌──────────────────────────┐     ┌────────────────────────┐
//!   │       Write Buffer       │     │   Flush Coordinator    │
//!   │  (ring, block multiple)  │◀────│  (pad, drain, retract) │
//!   └────────────┬─────────────┘     └───────────┬────────────┘
//!                │ full blocks                   │ then
//!                ▼                               ▼
//!   ┌──────────────────────────┐     ┌────────────────────────┐
//!   │    Background Writer     │────▶│       Read Cache       │
//!   │   (one thread / handle)  │ inv │   (direct-mapped)      │
//!   └────────────┬─────────────┘     └───────────┬────────────┘
//!                │ write                         │ miss: read
//!                ▼                               ▼
//!   ┌─────────────────────────────────────────────────────────┐
//!   │                      Block Device                        │
//!   └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use logfs::{Config, LogFs, MemoryDevice};
//!
//! let device = MemoryDevice::new(512);
//! let log = LogFs::with_device(device, Config::default()).unwrap();
//!
//! let offset = log.append(b"hello world").unwrap();
//! let data = log.read_bytes(offset, 11).unwrap();
//! assert_eq!(&data[..], b"hello world");
//!
//! log.close().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod device;
pub mod buffer;
pub mod cache;
pub mod writer;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogError, Result};
pub use config::Config;
pub use device::{BlockDevice, FileDevice, MemoryDevice};
pub use engine::{LogFs, LogStats};
pub use writer::WriterState;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logfs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
