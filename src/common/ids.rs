//! Deterministic hash helpers for seeding per-pair computations.

/// Extremely small non-cryptographic hash (FNV-1a, 32 bit).
#[derive(Copy, Clone, Debug)]
pub struct SimpleHash(u32);

impl SimpleHash {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ (*b as u32)).wrapping_mul(16_777_619);
        }
    }

    /// Feed a little-endian integer into the hash function.
    pub fn update_u64(&mut self, value: u64) {
        self.update(&value.to_le_bytes());
    }

    /// Finalise the hash and return a 32-bit value.
    pub fn finish32(&self) -> u32 {
        self.0
    }
}

impl Default for SimpleHash {
    fn default() -> Self {
        Self::new()
    }
}
