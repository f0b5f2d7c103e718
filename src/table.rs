//! ChainedHashTable: buckets of singly linked chains over an entry arena.

use crate::error::TableError;
use crate::probe_guard::{Probe, ProbeGuard};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use std::collections::TryReserveError;

/// Bucket count used by `new()` and `Default`.
pub const DEFAULT_CAPACITY: usize = 89;

/// Growth threshold: a new key that would bring `len / capacity` to this
/// value doubles the bucket array first.
pub const MAX_LOAD_FACTOR: f64 = 1.0;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

/// Where a key was found: its bucket, the chain predecessor (`None` for
/// the head) and the entry's arena slot.
#[derive(Copy, Clone, Debug)]
struct Location {
    bucket: usize,
    prev: Option<DefaultKey>,
    slot: DefaultKey,
}

#[inline]
fn bucket_for(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

pub struct ChainedHashTable<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<DefaultKey>>, // chain heads
    entries: SlotMap<DefaultKey, Entry<K, V>>,
    guard: ProbeGuard,
}

impl<K, V> ChainedHashTable<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates a table with `capacity` buckets. Zero buckets is rejected.
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> Default for ChainedHashTable<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainedHashTable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        log::trace!("new chained hash table with {DEFAULT_CAPACITY} buckets");
        Self {
            hasher,
            buckets: vec![None; DEFAULT_CAPACITY],
            entries: SlotMap::with_key(),
            guard: ProbeGuard::new(),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::InvalidCapacity(capacity));
        }
        log::trace!("new chained hash table with {capacity} buckets");
        Ok(Self {
            hasher,
            buckets: vec![None; capacity],
            entries: SlotMap::with_key(),
            guard: ProbeGuard::new(),
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The chain stored in bucket `index`, head to tail, or `None` when
    /// `index >= capacity()`.
    pub fn bucket(&self, index: usize) -> Option<Chain<'_, K, V>> {
        let head = *self.buckets.get(index)?;
        Some(Chain {
            entries: &self.entries,
            cursor: head,
        })
    }

    /// Entries in bucket order, each chain head to tail.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Chain {
                entries: &self.entries,
                cursor: None,
            },
            remaining: self.entries.len(),
        }
    }

    /// Mutable access to every value. Unlike `iter`, the visiting order is
    /// the arena's, not the bucket order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.entries.values_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn growth_due(&self) -> bool {
        let capacity = self.capacity();
        capacity.checked_mul(2).is_some()
            && (self.len() + 1) as f64 / capacity as f64 >= MAX_LOAD_FACTOR
    }

    /// Doubles the bucket array and relinks every entry under the new
    /// capacity. Both scratch arrays are reserved before anything moves, so
    /// an allocation failure leaves the table untouched.
    fn grow(&mut self) -> Result<(), TryReserveError> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity.saturating_mul(2);

        let mut heads: Vec<Option<DefaultKey>> = Vec::new();
        heads.try_reserve_exact(new_capacity)?;
        heads.resize(new_capacity, None);
        let mut tails: Vec<Option<DefaultKey>> = Vec::new();
        tails.try_reserve_exact(new_capacity)?;
        tails.resize(new_capacity, None);

        let old = core::mem::replace(&mut self.buckets, heads);
        for head in old {
            let mut cursor = head;
            while let Some(slot) = cursor {
                let Some(entry) = self.entries.get_mut(slot) else {
                    break;
                };
                cursor = entry.next.take();
                let bucket = bucket_for(entry.hash, new_capacity);
                match tails[bucket] {
                    Some(tail) => {
                        if let Some(t) = self.entries.get_mut(tail) {
                            t.next = Some(slot);
                        }
                    }
                    None => self.buckets[bucket] = Some(slot),
                }
                tails[bucket] = Some(slot);
            }
        }

        log::debug!(
            "grew chained hash table from {old_capacity} to {new_capacity} buckets ({} entries)",
            self.len()
        );
        Ok(())
    }

    /// Tail-appends an already stored entry to `bucket`'s chain.
    fn append(&mut self, bucket: usize, slot: DefaultKey) {
        let Some(mut cursor) = self.buckets[bucket] else {
            self.buckets[bucket] = Some(slot);
            return;
        };
        while let Some(next) = self.entries.get(cursor).and_then(|e| e.next) {
            cursor = next;
        }
        if let Some(tail) = self.entries.get_mut(cursor) {
            tail.next = Some(slot);
        }
    }

    /// Test-only structural check: every entry is reachable from exactly one
    /// bucket, sits in the bucket its hash selects, and chains are acyclic.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.capacity();
        let mut seen = 0usize;
        for (index, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            while let Some(slot) = cursor {
                let e = self.entries.get(slot).expect("chain link to live entry");
                assert_eq!(bucket_for(e.hash, capacity), index, "entry in wrong bucket");
                seen += 1;
                assert!(seen <= self.entries.len(), "cycle in chain {index}");
                cursor = e.next;
            }
        }
        assert_eq!(seen, self.entries.len(), "len equals sum of chain lengths");
    }
}

impl<K, V, S> ChainedHashTable<K, V, S>
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

    /// Walks the key's chain head to tail. Callers hold a probe scope.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<Location>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = bucket_for(hash, self.capacity());
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while let Some(slot) = cursor {
            let e = self.entries.get(slot)?;
            if e.hash == hash && e.key.borrow() == q {
                return Some(Location { bucket, prev, slot });
            }
            prev = Some(slot);
            cursor = e.next;
        }
        None
    }

    /// Bucket `q` maps to under the current capacity.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter(Probe::BucketIndex);
        bucket_for(self.make_hash(q), self.capacity())
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter(Probe::Get);
        let loc = self.locate(self.make_hash(q), q)?;
        self.entries.get(loc.slot).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = {
            let _g = self.guard.enter(Probe::GetMut);
            self.locate(self.make_hash(q), q)?.slot
        };
        self.entries.get_mut(slot).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter(Probe::Contains);
        self.locate(self.make_hash(q), q).is_some()
    }

    /// Inserts `key`, or overwrites the value of an existing equal key in
    /// place and returns the old value. Only new keys can trigger growth.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (hash, existing) = {
            let _g = self.guard.enter(Probe::Insert);
            let hash = self.make_hash(&key);
            (hash, self.locate(hash, &key).map(|loc| loc.slot))
        };

        if let Some(slot) = existing {
            return self
                .entries
                .get_mut(slot)
                .map(|e| core::mem::replace(&mut e.value, value));
        }

        if self.growth_due() {
            if let Err(err) = self.grow() {
                log::warn!(
                    "could not grow chained hash table past {} buckets: {err}",
                    self.capacity()
                );
            }
        }

        let bucket = bucket_for(hash, self.capacity());
        let slot = self.entries.insert(Entry {
            key,
            value,
            hash,
            next: None,
        });
        self.append(bucket, slot);
        None
    }

    /// Removes `q` and returns its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let loc = {
            let _g = self.guard.enter(Probe::Remove);
            self.locate(self.make_hash(q), q)?
        };

        let entry = self.entries.remove(loc.slot)?;
        match loc.prev {
            None => self.buckets[loc.bucket] = entry.next,
            Some(prev) => {
                if let Some(p) = self.entries.get_mut(prev) {
                    p.next = entry.next;
                }
            }
        }
        Some((entry.key, entry.value))
    }
}

/// One bucket's chain, head to tail.
pub struct Chain<'a, K, V> {
    entries: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cursor: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.entries.get(self.cursor?)?;
        self.cursor = e.next;
        Some((&e.key, &e.value))
    }
}

pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<DefaultKey>>,
    chain: Chain<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.next() {
                self.remaining -= 1;
                return Some(item);
            }
            self.chain.cursor = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

pub struct IterMut<'a, K, V> {
    it: slotmap::basic::ValuesMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, Q, V, S> Index<&Q> for ChainedHashTable<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// If the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in ChainedHashTable")
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashTable<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

/// Bucket dump: `[[1: a] -> [5: e] -> None, None, ...]`.
impl<K, V, S> fmt::Display for ChainedHashTable<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, head) in self.buckets.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            let chain = Chain {
                entries: &self.entries,
                cursor: *head,
            };
            for (k, v) in chain {
                write!(f, "[{k}: {v}] -> ")?;
            }
            f.write_str("None")?;
        }
        f.write_str("]")
    }
}

impl<K, V, S> fmt::Debug for ChainedHashTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
