//! chained-hash-table: a single-owner hash table that resolves collisions
//! by separate chaining and grows by doubling its bucket array.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, verifiable key-value container whose bucket layout is
//!   observable (`bucket`, `bucket_index`, `Display` dump) so placement and
//!   growth can be checked directly.
//! - Layers:
//!   - Entry arena: a `SlotMap` owns every `(key, value, hash, next)` entry.
//!     Chain links are arena keys, so chains have exactly one owner and
//!     removal never fights the borrow checker.
//!   - Buckets: a `Vec` of optional chain heads, `capacity` long.
//!   - ProbeGuard: debug-only detection of user `Hash`/`Eq` code reaching
//!     back into the table while a chain is being walked.
//!
//! Constraints
//! - Single-threaded: the table is `Send` but not `Sync`. Share it behind
//!   a `Mutex` that is held for the whole operation.
//! - O(1) expected lookup/insert/remove, O(chain length) worst case.
//! - Unique keys: inserting an existing key overwrites its value in place
//!   and returns the old one; `len` counts distinct keys.
//! - New entries go to the tail of their chain, so a chain lists its keys
//!   in arrival order.
//!
//! Growth
//! - Before a new key is stored, if `(len + 1) / capacity >= 1.0` the bucket
//!   array doubles. Every entry is relinked into the bucket its hash selects
//!   under the new capacity, visiting old buckets in order and each chain
//!   head to tail, which keeps relative order within each new bucket.
//! - Both new arrays are reserved fallibly before any entry moves. If the
//!   allocation fails, the table is left as it was, a warning is logged and
//!   the entry is placed under the old capacity.
//! - Capacity never shrinks.
//!
//! Hasher invariants
//! - Each entry stores its `u64` hash. Bucket index is `hash % capacity`.
//!   `K: Hash` runs once per call and never during growth.
//!
//! Logging
//! - Uses the `log` facade (`trace!` on construction, `debug!` on growth,
//!   `warn!` on failed growth). The crate never installs a logger.
//!
//! Non-goals
//! - No open addressing, no shrink-on-remove, no internal locking.
//! - `iter` follows bucket order then chain order; nothing else about
//!   ordering is promised. `iter_mut` visits in arena order.

mod error;
mod probe_guard;
mod table;
mod table_proptest;

// Public surface
pub use error::TableError;
pub use table::{ChainedHashTable, Chain, Iter, IterMut, DEFAULT_CAPACITY, MAX_LOAD_FACTOR};
