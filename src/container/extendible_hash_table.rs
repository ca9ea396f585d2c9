use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};

use log::debug;
use parking_lot::Mutex;

use crate::config::HashTableConfig;
use crate::error::{BufkitError, BufkitResult};

/// Stable handle into the bucket arena. Directory slots hold handles, so
/// repointing a slot after a split is a plain integer rewrite.
type BucketId = usize;

#[derive(Debug)]
struct Bucket<K, V> {
    /// How many low hash bits this bucket was split on; never exceeds the
    /// directory's global depth.
    local_depth: u32,
    items: Vec<(K, V)>,
}

#[derive(Debug)]
struct Directory<K, V> {
    global_depth: u32,
    /// 2^global_depth slots; several slots may hold the same handle.
    slots: Vec<BucketId>,
    /// Grow-only arena; buckets are created on split and never removed.
    buckets: Vec<Bucket<K, V>>,
}

/// In-memory extendible hash table addressed by the low bits of a stable
/// hash.
///
/// A full bucket splits into itself and a sibling; the directory doubles only
/// when the full bucket's local depth has caught up with the global depth.
/// Growth rehashes one bucket at a time, never the whole table. The default
/// build hasher is deterministic across instances and runs.
#[derive(Debug)]
pub struct ExtendibleHashTable<K, V, S = BuildHasherDefault<DefaultHasher>> {
    bucket_size: usize,
    max_global_depth: u32,
    hash_builder: S,
    directory: Mutex<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V> {
    pub fn new(bucket_size: usize) -> Self {
        Self::new_with_config(HashTableConfig {
            bucket_size,
            ..Default::default()
        })
    }

    pub fn new_with_config(config: HashTableConfig) -> Self {
        Self::with_hasher(config, BuildHasherDefault::default())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S> {
    pub fn with_hasher(config: HashTableConfig, hash_builder: S) -> Self {
        assert!(config.bucket_size > 0, "bucket size must be greater than 0");
        ExtendibleHashTable {
            bucket_size: config.bucket_size,
            max_global_depth: config.max_global_depth,
            hash_builder,
            directory: Mutex::new(Directory {
                global_depth: 0,
                slots: vec![0],
                buckets: vec![Bucket {
                    local_depth: 0,
                    items: Vec::new(),
                }],
            }),
        }
    }

    pub fn global_depth(&self) -> u32 {
        self.directory.lock().global_depth
    }

    /// Local depth of the bucket the directory slot `slot` points to.
    pub fn local_depth(&self, slot: usize) -> u32 {
        let dir = self.directory.lock();
        dir.buckets[dir.slots[slot]].local_depth
    }

    pub fn num_buckets(&self) -> usize {
        self.directory.lock().buckets.len()
    }

    fn slot_of(hash: u64, global_depth: u32) -> usize {
        (hash as usize) & ((1usize << global_depth) - 1)
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    fn hash(&self, key: &K) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Directory slot `key` routes to at the current global depth: the low
    /// `global_depth` bits of its hash. Low-order addressing is what lets a
    /// doubling copy the slot array verbatim into the upper half.
    pub fn index_of(&self, key: &K) -> usize {
        Self::slot_of(self.hash(key), self.directory.lock().global_depth)
    }

    pub fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash(key);
        let dir = self.directory.lock();
        let bucket = &dir.buckets[dir.slots[Self::slot_of(hash, dir.global_depth)]];
        bucket
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let mut dir = self.directory.lock();
        let bucket_id = dir.slots[Self::slot_of(hash, dir.global_depth)];
        let bucket = &mut dir.buckets[bucket_id];
        if let Some(pos) = bucket.items.iter().position(|(k, _)| k == key) {
            bucket.items.remove(pos);
            true
        } else {
            false
        }
    }

    /// Insert `value` under `key`, overwriting any previous value. A full
    /// target bucket splits and the insert retries; one insert may cascade
    /// through several splits when the redistribution stays lopsided.
    pub fn insert(&self, key: K, value: V) -> BufkitResult<()> {
        let hash = self.hash(&key);
        let mut dir = self.directory.lock();
        loop {
            let bucket_id = dir.slots[Self::slot_of(hash, dir.global_depth)];

            {
                let bucket = &mut dir.buckets[bucket_id];
                if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = value;
                    return Ok(());
                }
                if bucket.items.len() < self.bucket_size {
                    bucket.items.push((key, value));
                    return Ok(());
                }
            }

            // The target bucket is full. If it is the only bucket at its
            // depth the directory must double before it can split.
            if dir.buckets[bucket_id].local_depth == dir.global_depth {
                if dir.global_depth >= self.max_global_depth {
                    return Err(BufkitError::CapacityExceeded(format!(
                        "global depth is at its maximum of {}",
                        self.max_global_depth
                    )));
                }
                dir.global_depth += 1;
                let lower = dir.slots.clone();
                dir.slots.extend(lower);
                debug!(
                    "directory doubled to {} slots (global depth {})",
                    dir.slots.len(),
                    dir.global_depth
                );
            }

            // Split: entries whose newly significant hash bit is set move to
            // the sibling, and so do the slots whose index has that bit set.
            let local_depth = dir.buckets[bucket_id].local_depth + 1;
            dir.buckets[bucket_id].local_depth = local_depth;
            let sibling_id = dir.buckets.len();

            let drained = std::mem::take(&mut dir.buckets[bucket_id].items);
            let hash_bit = 1u64 << (local_depth - 1);
            let (moved, kept): (Vec<_>, Vec<_>) = drained
                .into_iter()
                .partition(|(k, _)| self.hash(k) & hash_bit != 0);
            dir.buckets[bucket_id].items = kept;
            dir.buckets.push(Bucket {
                local_depth,
                items: moved,
            });

            let slot_bit = 1usize << (local_depth - 1);
            for (index, slot) in dir.slots.iter_mut().enumerate() {
                if *slot == bucket_id && index & slot_bit != 0 {
                    *slot = sibling_id;
                }
            }
            debug!(
                "split bucket {} into sibling {} at local depth {}",
                bucket_id, sibling_id, local_depth
            );
        }
    }
}
