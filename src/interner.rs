//! A hash-cached, reference-counted pointer used to deduplicate structurally
//! identical grammar elements during the build pipeline (spec §4.6 step 2).
//!
//! Two [`Harc`] values compare and hash by their pointee's contents, not by
//! address, but a hash computed once is cached for the lifetime of the
//! allocation. The build pipeline inserts every canonicalized token/rule
//! description into a `HashMap<Harc<T>, Id>`; structurally equal elements
//! collapse onto the same map slot, which is exactly invariant 2 in spec §3
//! ("structural equality implies identity").

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::OnceLock;
use triomphe::Arc;

/// `Arc` with a cached `Hash`.
///
/// Like [`std::sync::Arc`] this is a thread-safe reference-counting pointer.
/// It differs in removing support for weak references and adding a cache for
/// [`Hash`]. For the cache to stay correct, `T` must have a stable hash for
/// as long as no `&mut T` is handed out — build-time descriptions are never
/// mutated in place after insertion, so this holds.
#[derive(Debug)]
pub struct Harc<T>(Arc<HarcInner<T>>);

#[derive(Debug)]
struct HarcInner<T> {
    /// Zero: not computed yet.
    cached_hash: AtomicU64,
    value: T,
}

const CACHED_HASH_NOT_COMPUTED_YET: u64 = 0;

impl<T> Clone for Harc<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone> Clone for HarcInner<T> {
    fn clone(&self) -> Self {
        Self {
            cached_hash: AtomicU64::new(self.cached_hash.load(Ordering::Relaxed)),
            value: self.value.clone(),
        }
    }
}

impl<T> Harc<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(HarcInner {
            cached_hash: AtomicU64::new(CACHED_HASH_NOT_COMPUTED_YET),
            value,
        }))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> std::ops::Deref for Harc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0.value
    }
}

impl<T: Eq> Eq for Harc<T> {}

impl<T: PartialEq> PartialEq for Harc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.value == other.0.value
    }
}

/// Produces the hash of the cached hash, distinct from `<T as Hash>`. That's
/// fine: `Harc<T>` is only ever used as a `HashMap` key internal to the
/// interner, never compared against a bare `T`.
impl<T: Hash> Hash for Harc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut hash = self.0.cached_hash.load(Ordering::Relaxed);
        if hash == CACHED_HASH_NOT_COMPUTED_YET {
            // Races with other threads computing the same value are fine:
            // the result is the same hash, just computed more than once.
            #[cold]
            #[inline(never)]
            fn slow_path<T: Hash>(inner: &HarcInner<T>) -> u64 {
                static SHARED_RANDOM: OnceLock<RandomState> = OnceLock::new();
                let mut hasher = SHARED_RANDOM.get_or_init(RandomState::new).build_hasher();
                inner.value.hash(&mut hasher);
                let mut hash = hasher.finish();
                if hash == CACHED_HASH_NOT_COMPUTED_YET {
                    hash += 1;
                }
                inner.cached_hash.store(hash, Ordering::Relaxed);
                hash
            }
            hash = slow_path(&self.0);
        }
        hash.hash(state);
    }
}

/// Structural interner: maps canonicalized descriptions to the id of the
/// first-seen structurally-equal description, accumulating alias ids on
/// repeats.
pub struct Interner<T, Id> {
    table: std::collections::HashMap<Harc<T>, Id>,
}

impl<T: Eq + Hash, Id: Copy> Interner<T, Id> {
    pub fn new() -> Self {
        Self {
            table: std::collections::HashMap::new(),
        }
    }

    /// Returns the canonical id for `value`, inserting it (mapped to
    /// `make_id(value)`) if this is the first time this structural shape has
    /// been seen.
    pub fn intern(&mut self, value: T, make_id: impl FnOnce(&T) -> Id) -> (Id, bool) {
        let key = Harc::new(value);
        if let Some(&id) = self.table.get(&key) {
            return (id, false);
        }
        let id = make_id(&key);
        self.table.insert(key, id);
        (id, true)
    }
}

impl<T: Eq + Hash, Id: Copy> Default for Interner<T, Id> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_equal_values_share_identity() {
        let mut interner: Interner<(u8, Vec<u32>), u32> = Interner::new();
        let mut next = 0u32;
        let (a, fresh_a) = interner.intern((1, vec![2, 3]), |_| {
            let id = next;
            next += 1;
            id
        });
        assert!(fresh_a);
        let (b, fresh_b) = interner.intern((1, vec![2, 3]), |_| {
            let id = next;
            next += 1;
            id
        });
        assert!(!fresh_b);
        assert_eq!(a, b);

        let (c, fresh_c) = interner.intern((1, vec![2, 4]), |_| {
            let id = next;
            next += 1;
            id
        });
        assert!(fresh_c);
        assert_ne!(a, c);
    }

    #[test]
    fn cached_hash_is_stable_across_clones() {
        let h1 = Harc::new(vec![1, 2, 3]);
        let h2 = h1.clone();
        let mut s1 = std::collections::hash_map::DefaultHasher::new();
        let mut s2 = std::collections::hash_map::DefaultHasher::new();
        h1.hash(&mut s1);
        h2.hash(&mut s2);
        assert_eq!(s1.finish(), s2.finish());
    }
}
