//! Reusable staging buffer for string I/O.

use tracing::debug;

use crate::error::Result;

/// Capacity a new buffer starts with unless configured otherwise.
///
/// Real tables rarely hold a string above ~3.4 KB, so the common case never grows.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Growable byte region owned by a single codec.
///
/// The buffer doubles whenever a string does not fit and never shrinks, so its capacity
/// is always at least the largest string seen and at least the initial floor.
#[derive(Debug, Clone)]
pub struct ScratchBuffer {
    data: Box<[u8]>,
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ScratchBuffer {
    /// Create a buffer with the default floor
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with `floor` bytes of capacity (at least one byte)
    pub fn with_capacity(floor: usize) -> Self {
        Self {
            data: vec![0; floor.max(1)].into_boxed_slice(),
        }
    }

    /// Current capacity in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Make room for at least `len` bytes, replacing the allocation if needed.
    pub fn reserve(&mut self, len: usize) {
        if len <= self.data.len() {
            return;
        }

        let mut capacity = self.data.len();
        while capacity < len {
            capacity = capacity.saturating_mul(2);
        }

        debug!(from = self.data.len(), to = capacity, "growing scratch buffer");
        self.data = vec![0; capacity].into_boxed_slice();
    }

    /// Borrow the first `len` bytes for filling, growing first.
    pub fn fill(&mut self, len: usize) -> &mut [u8] {
        self.reserve(len);
        &mut self.data[..len]
    }

    /// Copy `value` into the buffer and return the staged bytes.
    pub fn stage(&mut self, value: &str) -> &[u8] {
        let bytes = value.as_bytes();
        let staged = self.fill(bytes.len());
        staged.copy_from_slice(bytes);
        staged
    }

    /// Decode the first `len` bytes as UTF-8.
    ///
    /// With `lossy` set, malformed sequences become U+FFFD instead of failing.
    pub fn decode(&self, len: usize, lossy: bool) -> Result<String> {
        let bytes = &self.data[..len];
        if lossy {
            return Ok(String::from_utf8_lossy(bytes).into_owned());
        }
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }
}
