//! chained-hashmap: a single-threaded, insertion-ordered hash map built
//! from a record store and a separately chained bucket index, with stable
//! handles to individual records.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep record identity and hash indexing in separate layers so
//!   that rehashing never moves a record and never invalidates a handle.
//! - Layers:
//!   - RecordStore<K, V>: generational slot arena threaded with an
//!     intrusive doubly-linked list. Owns every `(key, value)` record,
//!     keeps insertion order, and hands out locators that stay valid until
//!     that record is erased.
//!   - BucketIndex: `space` buckets, each an ordered `Vec` of locators
//!     whose key hash maps to that bucket (`hash % space`).
//!   - ChainedHashMap<K, V, S>: public API. Inserts append to the store and
//!     register in the index; lookups hash once and scan one bucket.
//!
//! Constraints
//! - Single-threaded, no interior mutability.
//! - Duplicate keys are allowed. `insert` never checks for an existing
//!   key; key-based operations resolve to the oldest live record with
//!   that key. See [`ChainedHashMap::insert`].
//! - Keys are immutable post-insert; there is no `key_mut`.
//!
//! Growth policy
//! - `space` starts at [`MIN_SPACE`] and doubles when, after an insert,
//!   `len() > 2 * space`. The whole index is then discarded and rebuilt by
//!   walking the store in insertion order. Erasing never shrinks `space`;
//!   only `clear` resets it.
//!
//! Hasher and rehashing invariants
//! - Each record caches the `u64` hash of its key, computed once with the
//!   map's `BuildHasher`. Rebuilds reuse the cached value, so `K: Hash` is
//!   never invoked after insertion.
//!
//! Handle validity
//! - A [`Handle`] resolves until its record is erased or the map is
//!   cleared. Inserts, lookups, growth and the removal of other records
//!   leave it untouched. Stale handles resolve to `None`.
//!
//! Errors
//! - [`ChainedHashMap::at`] is the only fallible accessor and fails with
//!   [`KeyNotFound`]. `find` and `erase` report absence through `None`.

mod bucket_index;
pub mod chained_hash_map;
mod chained_hash_map_proptest;
mod record_store;

// Public surface
pub use bucket_index::MIN_SPACE;
pub use chained_hash_map::{ChainedHashMap, Handle, KeyNotFound};
