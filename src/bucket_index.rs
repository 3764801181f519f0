//! BucketIndex: separate-chaining index of locators into the record store.
//!
//! Each bucket is an ordered `Vec` of locators. The index stores no keys; the
//! caller supplies the cached hash and a predicate that inspects the record
//! behind a locator, so collisions are resolved by scanning the bucket rather
//! than by trusting hash equality.

use crate::record_store::Locator;

/// Bucket count of an empty or freshly cleared index.
pub const MIN_SPACE: usize = 32;

#[derive(Debug, Clone)]
pub(crate) struct BucketIndex {
    buckets: Vec<Vec<Locator>>,
}

impl BucketIndex {
    pub(crate) fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); MIN_SPACE],
        }
    }

    /// Current number of buckets (`space`).
    pub(crate) fn space(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn bucket_for(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn register(&mut self, loc: Locator, hash: u64) {
        let b = self.bucket_for(hash);
        self.buckets[b].push(loc);
    }

    /// First locator in `hash`'s bucket accepted by `matches`.
    pub(crate) fn find(&self, hash: u64, mut matches: impl FnMut(Locator) -> bool) -> Option<Locator> {
        self.buckets[self.bucket_for(hash)]
            .iter()
            .copied()
            .find(|&loc| matches(loc))
    }

    /// Remove and return the first locator in `hash`'s bucket accepted by
    /// `matches`. The remaining locators keep their relative order.
    pub(crate) fn unregister(
        &mut self,
        hash: u64,
        mut matches: impl FnMut(Locator) -> bool,
    ) -> Option<Locator> {
        let b = self.bucket_for(hash);
        let bucket = &mut self.buckets[b];
        let pos = bucket.iter().position(|&loc| matches(loc))?;
        Some(bucket.remove(pos))
    }

    /// Remove exactly `loc` from `hash`'s bucket.
    pub(crate) fn unregister_locator(&mut self, loc: Locator, hash: u64) -> bool {
        self.unregister(hash, |l| l == loc).is_some()
    }

    /// Drop every bucket, resize to `new_space` and re-register each
    /// `(locator, hash)` pair in the order given.
    pub(crate) fn rebuild(&mut self, new_space: usize, entries: impl IntoIterator<Item = (Locator, u64)>) {
        debug_assert!(new_space >= MIN_SPACE);
        self.buckets.clear();
        self.buckets.resize_with(new_space, Vec::new);
        for (loc, hash) in entries {
            self.register(loc, hash);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.buckets.clear();
        self.buckets.resize_with(MIN_SPACE, Vec::new);
    }

    pub(crate) fn buckets(&self) -> impl Iterator<Item = (usize, &[Locator])> {
        self.buckets.iter().enumerate().map(|(i, b)| (i, b.as_slice()))
    }
}

impl Default for BucketIndex {
    fn default() -> Self {
        Self::new()
    }
}
