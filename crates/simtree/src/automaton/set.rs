//! Deduplicated configuration storage.
//!
//! A [`ConfigSet`] holds the configurations reachable at one input
//! position. Entries are keyed by their *reduced* identity
//! ([`SetIdentity`]), so parser hypotheses differing only in invocation
//! history collapse into a single entry; merging the underlying contexts
//! is the caller's job and is plugged in through
//! [`ConfigSet::add_or_merge`].

use ahash::RandomState;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::hash::{BuildHasher, Hasher};

/// Identity regime used when deduplicating configurations in a set.
///
/// For parser configurations the key deliberately omits the invocation
/// context; for lexer configurations it matches full equality, because
/// action metadata must never be merged away.
pub trait SetIdentity {
    /// Feed the reduced key into `hasher`.
    fn set_hash<H: Hasher>(&self, hasher: &mut H);

    /// Reduced-key equality, consistent with [`SetIdentity::set_hash`].
    fn set_eq(&self, other: &Self) -> bool;
}

/// Insertion-ordered, deduplicating collection of configurations.
#[derive(Debug, Clone)]
pub struct ConfigSet<C> {
    items: Vec<C>,
    // Reduced-key hash -> indexes into `items` with that hash.
    buckets: HashMap<u64, SmallVec<[usize; 1]>, RandomState>,
    key_hasher: RandomState,
}

impl<C: SetIdentity> ConfigSet<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            buckets: HashMap::with_hasher(RandomState::new()),
            key_hasher: RandomState::new(),
        }
    }

    fn reduced_hash(&self, config: &C) -> u64 {
        let mut hasher = self.key_hasher.build_hasher();
        config.set_hash(&mut hasher);
        hasher.finish()
    }

    fn position(&self, config: &C) -> Option<usize> {
        let key = self.reduced_hash(config);
        self.buckets
            .get(&key)?
            .iter()
            .copied()
            .find(|&i| self.items[i].set_eq(config))
    }

    /// Insert `config` unless a reduced-equal entry already exists.
    /// Returns whether the entry was new.
    pub fn add(&mut self, config: C) -> bool {
        let key = self.reduced_hash(&config);
        let bucket = self.buckets.entry(key).or_default();
        if bucket.iter().any(|&i| self.items[i].set_eq(&config)) {
            return false;
        }
        bucket.push(self.items.len());
        self.items.push(config);
        true
    }

    /// Insert `config`, or hand it to `merge` together with the existing
    /// reduced-equal entry. Returns whether a new entry was created.
    ///
    /// `merge` typically combines the invocation contexts of the two
    /// hypotheses; that algorithm lives with the caller. It must not alter
    /// the stored entry's reduced key.
    pub fn add_or_merge<F>(&mut self, config: C, merge: F) -> bool
    where
        F: FnOnce(&mut C, C),
    {
        if let Some(i) = self.position(&config) {
            merge(&mut self.items[i], config);
            false
        } else {
            self.add(config)
        }
    }

    #[must_use]
    pub fn contains(&self, config: &C) -> bool {
        self.position(config).is_some()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.items.get(index)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.buckets.clear();
    }
}

impl<C: SetIdentity> Default for ConfigSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, C: SetIdentity> IntoIterator for &'a ConfigSet<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
