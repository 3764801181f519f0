//! RecordStore: insertion-ordered record storage with stable locators.
//!
//! Records live in a generational `SlotMap` and are threaded onto an
//! intrusive doubly-linked list (`prev`/`next` locators stored in each
//! node). The slot map never moves a live record's identity, so a locator
//! stays valid until that exact record is erased, and a stale locator never
//! resolves to a record that later reuses the slot.

use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Stable reference to one record in the store.
pub(crate) type Locator = DefaultKey;

#[derive(Debug)]
pub(crate) struct Record<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<Locator>,
    next: Option<Locator>,
}

#[derive(Debug)]
pub(crate) struct RecordStore<K, V> {
    slots: SlotMap<DefaultKey, Record<K, V>>,
    head: Option<Locator>,
    tail: Option<Locator>,
}

impl<K, V> RecordStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a record at the back and return its locator.
    pub(crate) fn append(&mut self, key: K, value: V, hash: u64) -> Locator {
        let prev = self.tail;
        let loc = self.slots.insert(Record {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev.and_then(|p| self.slots.get_mut(p)) {
            Some(node) => node.next = Some(loc),
            None => self.head = Some(loc),
        }
        self.tail = Some(loc);
        loc
    }

    /// Unlink and return exactly the record at `loc`. Stale locators are a no-op.
    pub(crate) fn erase(&mut self, loc: Locator) -> Option<(K, V)> {
        let node = self.slots.remove(loc)?;
        match node.prev.and_then(|p| self.slots.get_mut(p)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.slots.get_mut(n)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        Some((node.key, node.value))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn get(&self, loc: Locator) -> Option<&Record<K, V>> {
        self.slots.get(loc)
    }

    pub(crate) fn get_mut(&mut self, loc: Locator) -> Option<&mut Record<K, V>> {
        self.slots.get_mut(loc)
    }

    pub(crate) fn first(&self) -> Option<Locator> {
        self.head
    }

    pub(crate) fn last(&self) -> Option<Locator> {
        self.tail
    }

    /// Locator of the record inserted right after `loc`, if both are live.
    pub(crate) fn next_of(&self, loc: Locator) -> Option<Locator> {
        self.slots.get(loc).and_then(|r| r.next)
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.slots.len(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.slots.len();
        let mut refs = SecondaryMap::with_capacity(len);
        for (loc, record) in self.slots.iter_mut() {
            refs.insert(loc, record);
        }
        IterMut {
            refs,
            front: self.head,
            back: self.tail,
            remaining: len,
        }
    }

    pub(crate) fn into_records(self) -> IntoRecords<K, V> {
        IntoRecords { store: self }
    }
}

impl<K, V> Default for RecordStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowing iterator over records in insertion order.
pub(crate) struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Record<K, V>>,
    front: Option<Locator>,
    back: Option<Locator>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Locator, &'a Record<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let loc = self.front?;
        let node = self.slots.get(loc)?;
        self.remaining -= 1;
        self.front = node.next;
        Some((loc, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let loc = self.back?;
        let node = self.slots.get(loc)?;
        self.remaining -= 1;
        self.back = node.prev;
        Some((loc, node))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable iterator over records in insertion order.
///
/// Each record's `&mut` is taken once up front from `SlotMap::iter_mut`
/// and parked in a `SecondaryMap`; walking the list moves them out one at a
/// time, so every yielded reference is disjoint from the others.
pub(crate) struct IterMut<'a, K, V> {
    refs: SecondaryMap<Locator, &'a mut Record<K, V>>,
    front: Option<Locator>,
    back: Option<Locator>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Locator, &'a mut Record<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let loc = self.front?;
        let node = self.refs.remove(loc)?;
        self.remaining -= 1;
        self.front = node.next;
        Some((loc, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let loc = self.back?;
        let node = self.refs.remove(loc)?;
        self.remaining -= 1;
        self.back = node.prev;
        Some((loc, node))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator that pops records from the front.
pub(crate) struct IntoRecords<K, V> {
    store: RecordStore<K, V>,
}

impl<K, V> Iterator for IntoRecords<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.store.first()?;
        self.store.erase(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.store.len();
        (n, Some(n))
    }
}

impl<K, V> DoubleEndedIterator for IntoRecords<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let tail = self.store.last()?;
        self.store.erase(tail)
    }
}

impl<K, V> ExactSizeIterator for IntoRecords<K, V> {}
impl<K, V> FusedIterator for IntoRecords<K, V> {}
