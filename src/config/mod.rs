/// Highest directory depth an extendible hash table will grow to. Bounds the
/// directory at 2^20 slots.
pub const MAX_GLOBAL_DEPTH: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct LruKConfig {
    /// Number of frames the owning pool has; frame ids range over 0..num_frames.
    pub num_frames: usize,
    /// How many past accesses each frame's backward distance looks at.
    pub k: usize,
}

impl Default for LruKConfig {
    fn default() -> Self {
        LruKConfig {
            num_frames: 5000,
            k: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HashTableConfig {
    /// Key-value pairs a single bucket holds before it must split.
    pub bucket_size: usize,
    pub max_global_depth: u32,
}

impl Default for HashTableConfig {
    fn default() -> Self {
        HashTableConfig {
            bucket_size: 64,
            max_global_depth: MAX_GLOBAL_DEPTH,
        }
    }
}
