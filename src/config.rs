//! Configuration for logfs
//!
//! Centralized configuration with sensible defaults.

use crate::error::{LogError, Result};

/// Main configuration for a logfs handle
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Write Buffer Configuration
    // -------------------------------------------------------------------------
    /// Write buffer capacity, in device blocks
    pub write_buffer_blocks: usize,

    // -------------------------------------------------------------------------
    // Read Cache Configuration
    // -------------------------------------------------------------------------
    /// Number of direct-mapped read cache slots (one block each)
    pub read_cache_blocks: usize,

    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Block size override for file-backed devices.
    /// `None` uses the size the filesystem reports.
    pub block_size: Option<usize>,

    /// Create the backing file if it does not exist
    pub create: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_buffer_blocks: 32,
            read_cache_blocks: 256,
            block_size: None,
            create: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.write_buffer_blocks == 0 {
            return Err(LogError::Config(
                "write_buffer_blocks must be at least 1".to_string(),
            ));
        }
        if self.read_cache_blocks == 0 {
            return Err(LogError::Config(
                "read_cache_blocks must be at least 1".to_string(),
            ));
        }
        if let Some(size) = self.block_size {
            if size == 0 || !size.is_power_of_two() {
                return Err(LogError::Config(format!(
                    "invalid block_size={} (must be a power of two)",
                    size
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the write buffer capacity (in blocks)
    pub fn write_buffer_blocks(mut self, blocks: usize) -> Self {
        self.config.write_buffer_blocks = blocks;
        self
    }

    /// Set the number of read cache slots
    pub fn read_cache_blocks(mut self, blocks: usize) -> Self {
        self.config.read_cache_blocks = blocks;
        self
    }

    /// Override the device block size (file-backed devices only)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = Some(size);
        self
    }

    /// Create the backing file if it is missing
    pub fn create(mut self, create: bool) -> Self {
        self.config.create = create;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
