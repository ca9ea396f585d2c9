//! In-memory building blocks for a buffer-pool manager: an LRU-K frame
//! replacer and an extendible hash table for page-table lookups.

pub mod cache;
pub mod config;
pub mod container;
pub mod error;

pub use cache::lru_k::LruKReplacer;
pub use cache::{FrameId, Replacer};
pub use config::{HashTableConfig, LruKConfig};
pub use container::extendible_hash_table::ExtendibleHashTable;
pub use error::{BufkitError, BufkitResult};
