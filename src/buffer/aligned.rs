//! Block-aligned heap buffers.

use crate::error::{LogError, Result};

/// Zero-initialized heap region whose first byte sits on an `align` boundary
///
/// Over-allocates by one `align` unit and slices into it, so the region stays
/// aligned however the allocator places it. Alignment is best effort for
/// non power-of-two sizes.
#[derive(Debug)]
pub struct AlignedBuf {
    raw: Vec<u8>,
    start: usize,
    len: usize,
}

impl AlignedBuf {
    /// Allocate `len` zeroed bytes aligned to `align`
    ///
    /// Fails with [`LogError::OutOfMemory`] instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn zeroed(len: usize, align: usize) -> Result<Self> {
        let total = len
            .checked_add(align)
            .ok_or(LogError::OutOfMemory("aligned buffer"))?;

        let mut raw = Vec::new();
        raw.try_reserve_exact(total)
            .map_err(|_| LogError::OutOfMemory("aligned buffer"))?;
        raw.resize(total, 0);

        let start = if align.is_power_of_two() {
            raw.as_ptr().align_offset(align).min(align)
        } else {
            0
        };

        Ok(Self { raw, start, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.raw[self.start..self.start + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.raw[self.start..self.start + self.len]
    }

    /// Whether the first byte sits on an `align` boundary
    pub fn is_aligned_to(&self, align: usize) -> bool {
        align != 0 && (self.as_slice().as_ptr() as usize) % align == 0
    }
}
