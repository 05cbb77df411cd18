//! File Device
//!
//! Block device backed by a regular file or a block special file.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileExt, FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{LogError, Result};

use super::{check_aligned, BlockDevice};

/// Used when the filesystem reports no usable preferred I/O size
const FALLBACK_BLOCK_SIZE: usize = 4096;

/// Path-backed block device using `pread`/`pwrite` style I/O
///
/// Positional I/O keeps no shared seek cursor, so concurrent reads and
/// writes never disturb each other's position.
#[derive(Debug)]
pub struct FileDevice {
    path: PathBuf,
    file: File,
    block_size: usize,
}

impl FileDevice {
    /// Open the device at `path`
    ///
    /// The path must name a regular file or a block device. A missing
    /// regular file is created only when `config.create` is set.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create)
            .open(path)
            .map_err(|e| {
                LogError::Device(format!("unable to open {}: {}", path.display(), e))
            })?;

        let metadata = file.metadata()?;
        let file_type = metadata.file_type();
        if !file_type.is_file() && !file_type.is_block_device() {
            return Err(LogError::Device(format!(
                "{} is not a regular file or block device",
                path.display()
            )));
        }

        let block_size = match config.block_size {
            Some(size) => size,
            None => {
                let reported = metadata.blksize() as usize;
                if reported == 0 || !reported.is_power_of_two() {
                    FALLBACK_BLOCK_SIZE
                } else {
                    reported
                }
            }
        };

        tracing::debug!(
            "Opened device {} (block_size={}, len={})",
            path.display(),
            block_size,
            metadata.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            block_size,
        })
    }

    /// Path the device was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockDevice for FileDevice {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_aligned(offset, buf.len(), self.block_size)?;
        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        check_aligned(offset, buf.len(), self.block_size)?;
        self.file.write_all_at(buf, offset)?;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
