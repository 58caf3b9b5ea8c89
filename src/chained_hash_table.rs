//! ChainedHashTable: separate chaining over an arena of linked entries.

use crate::error::CapacityError;
use crate::hash_function::{BuildHasherFn, ElementHasher};
use crate::reentrancy::DebugReentrancy;
use core::fmt;
use core::hash::Hash;
use slotmap::{DefaultKey, SlotMap};

/// Number of slots a table starts with unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

// Grow once `len / capacity` exceeds 4/5.
const LOAD_NUMERATOR: u128 = 4;
const LOAD_DENOMINATOR: u128 = 5;

#[inline]
fn exceeds_load_factor(len: usize, capacity: usize) -> bool {
    len as u128 * LOAD_DENOMINATOR > capacity as u128 * LOAD_NUMERATOR
}

#[derive(Clone)]
struct Entry<T> {
    element: T,
    // Computed once on insertion; rehashing relinks by this value and never
    // calls back into the hash function.
    hash: u64,
    next: Option<DefaultKey>,
}

/// Slot array plus the arena that owns every entry of every chain.
///
/// Each slot holds the key of its chain head; entries link to their successor
/// by key. Keys survive `Clone` unchanged, so cloning both halves yields an
/// independent table with identical chains.
#[derive(Clone)]
struct Buckets<T> {
    slots: Vec<Option<DefaultKey>>,
    entries: SlotMap<DefaultKey, Entry<T>>,
}

impl<T> Buckets<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            entries: SlotMap::with_key(),
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn index_of(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    /// Chain at `index`; empty when `index` is out of range.
    fn chain(&self, index: usize) -> Chain<'_, T> {
        Chain {
            entries: &self.entries,
            next: self.slots.get(index).copied().flatten(),
        }
    }

    fn push_back(&mut self, index: usize, entry: Entry<T>) {
        let key = self.entries.insert(entry);
        let mut cursor = &mut self.slots[index];
        while let Some(k) = *cursor {
            cursor = &mut self.entries[k].next;
        }
        *cursor = Some(key);
    }

    /// Relinks every entry into `slots`, then drops the old slot array.
    ///
    /// Neither allocates nor runs user code, so it cannot fail part way.
    fn rehash_into(&mut self, mut slots: Vec<Option<DefaultKey>>) {
        let capacity = slots.len() as u64;
        for &head in &self.slots {
            let mut cursor = head;
            while let Some(key) = cursor {
                let entry = &mut self.entries[key];
                cursor = entry.next;
                let index = (entry.hash % capacity) as usize;
                entry.next = slots[index];
                slots[index] = Some(key);
            }
        }
        self.slots = slots;
    }

    fn clone_from(&mut self, source: &Self)
    where
        T: Clone,
    {
        self.slots.clone_from(&source.slots);
        self.entries.clone_from(&source.entries);
    }
}

/// Slot array twice the size of `capacity`.
fn grown_slots(capacity: usize) -> Result<Vec<Option<DefaultKey>>, CapacityError> {
    let capacity = capacity
        .checked_mul(2)
        .ok_or(CapacityError::CapacityOverflow)?;
    allocate_slots(capacity)
}

fn allocate_slots(capacity: usize) -> Result<Vec<Option<DefaultKey>>, CapacityError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize(capacity, None);
    Ok(slots)
}

/// Iterator over the elements of one chain, head first.
struct Chain<'a, T> {
    entries: &'a SlotMap<DefaultKey, Entry<T>>,
    next: Option<DefaultKey>,
}

impl<'a, T> Iterator for Chain<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.next?)?;
        self.next = entry.next;
        Some(&entry.element)
    }
}

/// A hash set of unique elements using separate chaining.
///
/// Elements are placed in the chain at `hash(element) % capacity`. The
/// capacity starts at [`DEFAULT_CAPACITY`] and doubles whenever an insertion
/// pushes `len / capacity` above 0.8.
pub struct ChainedHashTable<T, H = BuildHasherFn> {
    hasher: H,
    buckets: Buckets<T>,
    reentrancy: DebugReentrancy,
}

impl<T> ChainedHashTable<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<T, H> Default for ChainedHashTable<T, H>
where
    H: Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<T, H> ChainedHashTable<T, H> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots that places
    /// elements using `hasher` for its whole lifetime.
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Creates an empty table with `capacity` slots (at least one).
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Self {
        Self {
            hasher,
            buckets: Buckets::with_capacity(capacity),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of elements stored.
    pub fn len(&self) -> usize {
        self.buckets.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.entries.is_empty()
    }

    /// Number of slots in the slot array.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Number of elements in the chain at slot `index`, or 0 if `index` is
    /// not below [`capacity`](Self::capacity).
    pub fn elements_at_index(&self, index: usize) -> usize {
        let _g = self.reentrancy.enter();
        self.buckets.chain(index).count()
    }

    /// Moves the contents out, leaving `self` empty at [`DEFAULT_CAPACITY`]
    /// with a clone of the same hash function.
    pub fn take(&mut self) -> Self
    where
        H: Clone,
    {
        let hasher = {
            let _g = self.reentrancy.enter();
            self.hasher.clone()
        };
        core::mem::replace(self, Self::with_hasher(hasher))
    }

    #[cfg(feature = "stats")]
    pub(crate) fn chain_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity()).map(move |index| self.buckets.chain(index).count())
    }
}

impl<T, H> ChainedHashTable<T, H>
where
    T: Eq,
    H: ElementHasher<T>,
{
    /// Inserts `element` unless an equal element is already present.
    ///
    /// Returns `true` if the element was inserted. May double the capacity,
    /// which relinks every entry in O(len).
    ///
    /// # Panics
    ///
    /// Panics if the grown slot array cannot be allocated. Use
    /// [`try_add`](Self::try_add) to handle that case.
    pub fn add(&mut self, element: T) -> bool {
        match self.try_add(element) {
            Ok(inserted) => inserted,
            Err(err) => panic!("chained hash table: {err}"),
        }
    }

    /// Like [`add`](Self::add), but reports a failed slot array allocation.
    ///
    /// On error the table is unchanged and `element` is dropped.
    pub fn try_add(&mut self, element: T) -> Result<bool, CapacityError> {
        self.try_add_with(element, grown_slots)
    }

    fn try_add_with<G>(&mut self, element: T, grow: G) -> Result<bool, CapacityError>
    where
        G: FnOnce(usize) -> Result<Vec<Option<DefaultKey>>, CapacityError>,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_element(&element);
        let index = self.buckets.index_of(hash);
        if self.buckets.chain(index).any(|e| *e == element) {
            return Ok(false);
        }

        // Allocate the grown slot array before touching any chain so that a
        // failure leaves the table as it was.
        let grown = if exceeds_load_factor(self.len() + 1, self.capacity()) {
            Some(grow(self.capacity())?)
        } else {
            None
        };

        self.buckets.push_back(
            index,
            Entry {
                element,
                hash,
                next: None,
            },
        );
        if let Some(slots) = grown {
            self.buckets.rehash_into(slots);
        }
        Ok(true)
    }

    pub fn contains(&self, element: &T) -> bool {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_element(element);
        self.buckets
            .chain(self.buckets.index_of(hash))
            .any(|e| e == element)
    }

    /// Whether `element` is stored in the chain at slot `index` specifically.
    /// Out-of-range indices yield `false`.
    pub fn is_element_at_index(&self, element: &T, index: usize) -> bool {
        let _g = self.reentrancy.enter();
        self.buckets.chain(index).any(|e| e == element)
    }
}

impl<T, H> Clone for ChainedHashTable<T, H>
where
    T: Clone,
    H: Clone,
{
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        let _g = source.reentrancy.enter();
        self.hasher.clone_from(&source.hasher);
        self.buckets.clone_from(&source.buckets);
    }
}

impl<T, H> fmt::Debug for ChainedHashTable<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashTable")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<T, H> Extend<T> for ChainedHashTable<T, H>
where
    T: Eq,
    H: ElementHasher<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.add(element);
        }
    }
}

impl<T, H> FromIterator<T> for ChainedHashTable<T, H>
where
    T: Eq,
    H: ElementHasher<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type ModTable = ChainedHashTable<u32, fn(&u32) -> u64>;

    fn identity(x: &u32) -> u64 {
        u64::from(*x)
    }

    fn mod_table() -> ModTable {
        ChainedHashTable::with_hasher(identity)
    }

    fn index_sum<T: Eq, H: ElementHasher<T>>(t: &ChainedHashTable<T, H>) -> usize {
        (0..t.capacity()).map(|i| t.elements_at_index(i)).sum()
    }

    #[test]
    fn new_table_is_empty_at_default_capacity() {
        let t = mod_table();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), DEFAULT_CAPACITY);
        assert!(!t.contains(&0));
        assert_eq!(index_sum(&t), 0);
    }

    /// Invariant: adding an element twice is a no-op the second time.
    #[test]
    fn duplicate_add_is_noop() {
        let mut t = mod_table();
        assert!(t.add(7));
        assert!(!t.add(7));
        assert_eq!(t.len(), 1);
        assert!(t.contains(&7));
        assert_eq!(t.elements_at_index(7), 1);
    }

    /// Invariant: eight elements fit in ten slots; the ninth pushes the load
    /// factor past 0.8 and doubles the capacity, keeping every element.
    #[test]
    fn ninth_element_triggers_resize() {
        let mut t = mod_table();
        for x in 0..8 {
            t.add(x);
        }
        assert_eq!(t.len(), 8);
        assert_eq!(t.capacity(), 10);

        t.add(8);
        assert_eq!(t.len(), 9);
        assert_eq!(t.capacity(), 20);
        for x in 0..9 {
            assert!(t.contains(&x), "lost {x} across resize");
            assert!(t.is_element_at_index(&x, x as usize));
        }
        assert_eq!(index_sum(&t), 9);
    }

    /// Invariant: after a resize, elements sit at `hash % new_capacity`, not
    /// at their old slot.
    #[test]
    fn resize_relinks_to_new_slots() {
        let mut t = mod_table();
        for x in [5, 15, 25, 35, 45, 55, 65, 75] {
            t.add(x);
        }
        assert_eq!(t.elements_at_index(5), 8);

        t.add(1);
        assert_eq!(t.capacity(), 20);
        assert_eq!(t.elements_at_index(5), 4);
        assert_eq!(t.elements_at_index(15), 4);
        assert!(t.is_element_at_index(&15, 15));
        assert!(!t.is_element_at_index(&15, 5));
    }

    #[test]
    fn out_of_range_index_is_empty() {
        let mut t = mod_table();
        t.add(3);
        assert_eq!(t.elements_at_index(1000), 0);
        assert_eq!(t.elements_at_index(t.capacity()), 0);
        assert_eq!(t.elements_at_index(usize::MAX), 0);
        assert!(!t.is_element_at_index(&3, 1000));
        assert!(!t.is_element_at_index(&3, usize::MAX));
    }

    /// Invariant: the load factor never exceeds 0.8 after an add, and the
    /// per-slot counts always sum to `len`.
    #[test]
    fn load_factor_and_counts_hold_over_many_adds() {
        let mut t = mod_table();
        for x in 0..1_000u32 {
            t.add(x.wrapping_mul(2_654_435_761));
            assert!(t.len() * 5 <= t.capacity() * 4);
        }
        assert_eq!(t.len(), 1_000);
        assert_eq!(index_sum(&t), 1_000);
        assert_eq!(t.capacity(), 1_280);
    }

    /// Invariant: under a constant hash every element shares slot 0, and
    /// equality alone tells them apart.
    #[test]
    fn constant_hash_chains_everything_in_slot_zero() {
        let mut t: ChainedHashTable<String, _> =
            ChainedHashTable::with_hasher(|_: &String| 0u64);
        for i in 0..50 {
            t.add(format!("k{i}"));
        }
        t.add("k3".to_string());
        assert_eq!(t.len(), 50);
        assert_eq!(t.elements_at_index(0), 50);
        assert_eq!(index_sum(&t), 50);
        assert!(t.contains(&"k49".to_string()));
        assert!(!t.contains(&"k50".to_string()));
    }

    #[test]
    fn zero_capacity_request_yields_one_slot() {
        let mut t = ChainedHashTable::with_capacity_and_hasher(0, identity as fn(&u32) -> u64);
        assert_eq!(t.capacity(), 1);
        t.add(4);
        assert_eq!(t.capacity(), 2);
        assert!(t.contains(&4));
        assert!(t.is_element_at_index(&4, 0));
    }

    /// Invariant: a clone carries the hash function and owns its own chains.
    #[test]
    fn clone_is_independent_deep_copy() {
        let modulus = 7u64;
        let mut a: ChainedHashTable<u32, _> =
            ChainedHashTable::with_hasher(move |x: &u32| u64::from(*x) % modulus);
        for x in 0..6 {
            a.add(x);
        }
        let mut b = a.clone();
        assert_eq!(b.len(), 6);
        assert_eq!(b.capacity(), a.capacity());
        for i in 0..a.capacity() {
            assert_eq!(a.elements_at_index(i), b.elements_at_index(i));
        }

        b.extend([100, 101, 102]);
        assert!(!a.contains(&100));
        assert_eq!(a.len(), 6);
        assert_eq!(a.capacity(), 10);
        assert_eq!(b.capacity(), 20);

        a.add(200);
        assert!(!b.contains(&200));
        assert!(b.is_element_at_index(&100, 100 % 7));
    }

    #[test]
    fn clone_from_replaces_contents() {
        let mut src = mod_table();
        src.extend(0..20);
        let mut dst = mod_table();
        dst.add(999);

        dst.clone_from(&src);
        assert!(!dst.contains(&999));
        assert_eq!(dst.len(), 20);
        assert_eq!(dst.capacity(), src.capacity());
        dst.add(21);
        assert!(!src.contains(&21));
    }

    /// Invariant: `take` hands over the contents and leaves a reusable,
    /// empty table behind.
    #[test]
    fn take_resets_source() {
        let mut src = mod_table();
        src.extend(0..12);
        let cap = src.capacity();

        let mut dst = src.take();
        assert_eq!(dst.len(), 12);
        assert_eq!(dst.capacity(), cap);
        assert!((0..12).all(|x| dst.contains(&x)));

        assert_eq!(src.len(), 0);
        assert_eq!(src.capacity(), DEFAULT_CAPACITY);
        assert!(!src.contains(&3));
        assert!(src.add(3));
        assert!(src.is_element_at_index(&3, 3));

        dst.add(50);
        assert!(!src.contains(&50));
    }

    #[test]
    fn default_hasher_and_collect() {
        let t: ChainedHashTable<&str> = ["a", "b", "a", "c"].into_iter().collect();
        assert_eq!(t.len(), 3);
        assert!(t.contains(&"a"));
        assert!(!t.contains(&"d"));

        let mut u: ChainedHashTable<u64> = ChainedHashTable::new();
        u.extend(0..100);
        assert_eq!(u.len(), 100);
        assert_eq!(index_sum(&u), 100);
    }

    #[test]
    fn debug_reports_len_and_capacity() {
        let mut t = mod_table();
        t.add(1);
        assert_eq!(
            format!("{t:?}"),
            "ChainedHashTable { len: 1, capacity: 10, .. }"
        );
    }

    #[test]
    fn table_is_send() {
        fn assert_send<S: Send>() {}
        assert_send::<ModTable>();
        assert_send::<ChainedHashTable<String>>();
    }

    /// Invariant (debug-only): calling back into the same table from its hash
    /// function panics instead of walking chains mid-operation.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_hash_function() {
        use std::cell::RefCell;
        use std::rc::Rc;

        thread_local! {
            static TARGET: RefCell<Option<Rc<ModTable>>> = const { RefCell::new(None) };
        }
        fn reentrant(x: &u32) -> u64 {
            TARGET.with(|target| {
                if let Some(t) = target.borrow().as_ref() {
                    let _ = t.contains(&0);
                }
            });
            u64::from(*x)
        }

        let mut t: ModTable = ChainedHashTable::with_hasher(reentrant);
        t.add(1);
        let t = Rc::new(t);
        TARGET.with(|target| *target.borrow_mut() = Some(Rc::clone(&t)));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.contains(&1)));
        TARGET.with(|target| target.borrow_mut().take());
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");

        // The guard unwinds cleanly; the table remains usable.
        assert!(t.contains(&1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn doubling_past_usize_max_overflows() {
        assert_eq!(
            grown_slots(usize::MAX),
            Err(CapacityError::CapacityOverflow)
        );
    }

    #[test]
    fn oversized_slot_array_fails_to_allocate() {
        assert!(matches!(
            allocate_slots(usize::MAX / 2),
            Err(CapacityError::AllocFailed(_))
        ));
    }

    /// Invariant: when growing fails, the table is exactly as it was and the
    /// element is not inserted.
    #[test]
    fn failed_growth_leaves_table_unchanged() {
        let mut t = mod_table();
        t.extend(0..8);
        let before: Vec<usize> = (0..t.capacity()).map(|i| t.elements_at_index(i)).collect();

        let res = t.try_add_with(8, |_| Err(CapacityError::CapacityOverflow));
        assert_eq!(res, Err(CapacityError::CapacityOverflow));
        assert_eq!(t.len(), 8);
        assert_eq!(t.capacity(), 10);
        assert!(!t.contains(&8));
        let after: Vec<usize> = (0..t.capacity()).map(|i| t.elements_at_index(i)).collect();
        assert_eq!(before, after);

        // Growth is only requested when the load factor would be exceeded.
        let dup = t.try_add_with(3, |_| Err(CapacityError::CapacityOverflow));
        assert_eq!(dup, Ok(false));
        assert!(t.add(8));
        assert_eq!(t.capacity(), 20);
    }
}
