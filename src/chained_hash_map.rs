//! ChainedHashMap: insertion-ordered map over a record store and a bucket index.

use crate::bucket_index::BucketIndex;
use crate::record_store::{self, Locator, RecordStore};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::Equivalent;
use std::collections::hash_map::RandomState;

/// Stable reference to one record of a [`ChainedHashMap`].
///
/// A handle survives every operation on its map except erasing that record
/// (or `clear`). Once the record is gone the accessors return `None`; a new
/// record reusing the storage slot is never reachable through an old handle.
///
/// Handles are only meaningful for the map that produced them. Passing one
/// to a different map is not detected: it may resolve to `None` or to an
/// unrelated record of that map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(Locator);

impl Handle {
    pub(crate) fn new(loc: Locator) -> Self {
        Handle(loc)
    }
    pub(crate) fn locator(&self) -> Locator {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a K> {
        map.records.get(self.0).map(|r| &r.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V> {
        map.records.get(self.0).map(|r| &r.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ChainedHashMap<K, V, S>) -> Option<&'a mut V> {
        map.records.get_mut(self.0).map(|r| &mut r.value)
    }

    pub fn entry<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        map.records.get(self.0).map(|r| (&r.key, &r.value))
    }

    /// Handle of the record inserted right after this one, `None` at the end.
    pub fn next<K, V, S>(&self, map: &ChainedHashMap<K, V, S>) -> Option<Handle> {
        map.records.next_of(self.0).map(Handle::new)
    }
}

/// Returned by [`ChainedHashMap::at`] when no record has the requested key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl std::error::Error for KeyNotFound {}

/// Hash map with separate chaining and insertion-ordered iteration.
///
/// Duplicate keys are not rejected: `insert` always appends a new record.
/// Every key-based operation (`find`, `get`, `at`, `erase`,
/// `get_or_insert_default`) acts on the oldest live record with that key;
/// later duplicates remain visible in iteration and reachable through their
/// own handles. Use `get_or_insert_default` or check `contains_key` first
/// when unique keys are wanted.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    index: BucketIndex,
    records: RecordStore<K, V>,
}

impl<K, V> ChainedHashMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S: Default> Default for ChainedHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: BucketIndex::new(),
            records: RecordStore::new(),
        }
    }

    /// The hash builder supplied at construction.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current number of buckets. Starts at [`MIN_SPACE`](crate::MIN_SPACE)
    /// and doubles whenever `len() > 2 * bucket_count()` after an insert.
    pub fn bucket_count(&self) -> usize {
        self.index.space()
    }

    /// Drop every record and return to the minimum bucket count.
    /// All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.reset();
    }

    /// Handle to the oldest record, `None` when empty.
    pub fn first(&self) -> Option<Handle> {
        self.records.first().map(Handle::new)
    }

    /// Handle to the newest record, `None` when empty.
    pub fn last(&self) -> Option<Handle> {
        self.records.last().map(Handle::new)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.records.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.records.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.records.iter(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.records.iter(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.records.iter_mut(),
        }
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, q: &Q) -> Option<Locator>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.make_hash(q);
        let records = &self.records;
        self.index.find(hash, |loc| {
            records
                .get(loc)
                .map(|r| r.hash == hash && q.equivalent(&r.key))
                .unwrap_or(false)
        })
    }

    /// Append `(key, value)` and return a handle to the new record.
    ///
    /// No uniqueness check is made: inserting a key that is already present
    /// creates a second, independent record. Lookups keep resolving to the
    /// older one until it is erased.
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        let hash = self.make_hash(&key);
        let loc = self.records.append(key, value, hash);
        self.index.register(loc, hash);
        self.grow_if_needed();
        Handle::new(loc)
    }

    /// Double the bucket count once `len() > 2 * space`, re-registering every
    /// record in insertion order. Records themselves never move.
    fn grow_if_needed(&mut self) {
        let space = self.index.space();
        if self.records.len() <= space * 2 {
            return;
        }
        let records = &self.records;
        self.index
            .rebuild(space * 2, records.iter().map(|(loc, r)| (loc, r.hash)));
        debug_assert!(self.check_invariants());
    }

    /// Handle to the first record whose key equals `q`, or `None`.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.locate(q).map(Handle::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let loc = self.locate(q)?;
        self.records.get(loc).map(|r| &r.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let loc = self.locate(q)?;
        self.records.get_mut(loc).map(|r| &mut r.value)
    }

    /// Read-only access that fails with [`KeyNotFound`] for a missing key.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Subscript access: the value of the first record with `key`, inserting
    /// `(key, V::default())` first when there is none.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Like [`get_or_insert_default`](Self::get_or_insert_default); `default`
    /// only runs when the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let loc = match self.locate(&key) {
            Some(loc) => loc,
            None => self.insert(key, default()).locator(),
        };
        // `loc` was just found or inserted and nothing in between erases.
        match self.records.get_mut(loc) {
            Some(r) => &mut r.value,
            None => unreachable!("locator returned by lookup or insert is live"),
        }
    }

    /// Remove the first record whose key equals `q`. Absent keys are a no-op.
    /// Other records with the same key are left in place.
    pub fn erase<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.make_hash(q);
        let records = &self.records;
        let loc = self.index.unregister(hash, |loc| {
            records
                .get(loc)
                .map(|r| r.hash == hash && q.equivalent(&r.key))
                .unwrap_or(false)
        })?;
        self.records.erase(loc)
    }

    /// Remove the specific record behind `handle`, e.g. a later duplicate that
    /// key-based `erase` cannot reach. Stale handles are a no-op.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let loc = handle.locator();
        let hash = self.records.get(loc)?.hash;
        let unlinked = self.index.unregister_locator(loc, hash);
        debug_assert!(unlinked, "live record missing from its bucket");
        self.records.erase(loc)
    }

    /// Verify the structural invariants between the bucket index and the
    /// record store: every live record sits in exactly one bucket, the one
    /// selected by its cached hash, and nothing else is indexed. Never calls
    /// into `K: Hash` or `K: Eq`.
    pub(crate) fn check_invariants(&self) -> bool {
        let mut seen = slotmap::SecondaryMap::<Locator, ()>::new();
        let mut indexed = 0usize;
        for (b, bucket) in self.index.buckets() {
            for &loc in bucket {
                let Some(r) = self.records.get(loc) else {
                    return false;
                };
                if self.index.bucket_for(r.hash) != b || seen.insert(loc, ()).is_some() {
                    return false;
                }
                indexed += 1;
            }
        }
        indexed == self.records.len() && self.records.len() <= 2 * self.index.space()
    }

    /// Re-hash every key and compare with the cached hash. Calls `K: Hash`,
    /// so it stays out of the debug checks on the insert path.
    #[cfg(test)]
    pub(crate) fn check_cached_hashes(&self) -> bool {
        self.records
            .iter()
            .all(|(_, r)| r.hash == self.make_hash(&r.key))
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Deep copy: a fresh index and store built by re-inserting every record in
/// iteration order, hashed with a clone of the source's hash builder.
impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Clone + Eq + Hash,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut out = Self::with_hasher(self.hasher.clone());
        out.extend(self.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    /// Copy assignment: keeps this map's hash builder, drops its records and
    /// re-inserts the source's.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    inner: record_store::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, r)| (&r.key, &r.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, r)| (&r.key, &r.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in insertion order.
pub struct IterMut<'a, K, V> {
    inner: record_store::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, r)| (&r.key, &mut r.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, r)| (&r.key, &mut r.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: record_store::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, r)| &r.key)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, r)| &r.key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: record_store::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, r)| &r.value)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, r)| &r.value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: record_store::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, r)| &mut r.value)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, r)| &mut r.value)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in insertion order.
pub struct IntoIter<K, V> {
    inner: record_store::IntoRecords<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.records.into_records(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
