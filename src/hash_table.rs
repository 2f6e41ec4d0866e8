//! Open-addressed storage driven by caller-supplied hashes and equality
//! predicates.
//!
//! [`HashTable`] stores values of any type in a prime-sized slot array and
//! resolves collisions with linear probing. Removed entries leave tombstones so
//! that later probes walk past them. The table grows to the next prime at least
//! twice its size once a new entry brings the load factor to 2/3.

#[cfg(any(test, feature = "stats"))]
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Error;
use crate::error::Result;
use crate::primes;
use crate::slot::Slot;
#[cfg(any(test, feature = "stats"))]
use crate::slot::SlotState;
use crate::slot::SlotStore;

/// Entry count assumed when a table is created without an explicit capacity.
pub const DEFAULT_REQUESTED_CAPACITY: usize = 100;

/// `populated / capacity >= 2/3`, in integer arithmetic.
#[inline(always)]
fn over_max_load(populated: usize, capacity: usize) -> bool {
    populated.saturating_mul(3) >= capacity.saturating_mul(2)
}

/// Slot indices visited by a linear probe starting at `start`, wrapping once.
#[inline(always)]
fn probe_sequence(start: usize, capacity: usize) -> impl Iterator<Item = usize> {
    (start..capacity).chain(0..start)
}

/// Outcome of an insertion probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// A live slot matched.
    Found(usize),
    /// The value belongs in this slot: the first tombstone on the probe path,
    /// or the empty slot that ended it.
    Vacant(usize),
    /// Every slot holds some other live value.
    Exhausted,
}

/// Slot-level statistics for a [`HashTable`].
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Total number of slots
    pub capacity: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Number of empty slots
    pub empty: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Slots visited by the longest successful lookup
    pub longest_probe: usize,
    /// Mean slots visited by a successful lookup
    pub mean_probe: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} empty, {} tombstoned",
            self.empty, self.tombstones
        );
        println!(
            "Probe length: {} max, {:.2} mean",
            self.longest_probe, self.mean_probe
        );
    }
}

/// An open-addressed hash table with linear probing and prime capacities.
///
/// `HashTable<V>` does not hash anything itself: every operation takes the
/// value's hash and an equality predicate, so the same storage backs both the
/// key-value [`Table`](crate::Table) and the [`HashSet`](crate::HashSet).
///
/// ## Example
///
/// ```rust
/// use prime_probe::hash_table::Entry;
/// use prime_probe::hash_table::HashTable;
///
/// let mut table: HashTable<(u64, &str)> = HashTable::with_capacity(5)?;
/// assert_eq!(table.capacity(), 7);
///
/// match table.entry(3, |(k, _)| *k == 3)? {
///     Entry::Vacant(entry) => {
///         entry.insert((3, "three"));
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(3, |(k, _)| *k == 3), Some(&(3, "three")));
/// # Ok::<(), prime_probe::Error>(())
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: SlotStore<V>,
    populated: usize,
    requested: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::string::String;

        let layout: String = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Empty => '.',
                Slot::Tombstone => 'x',
                Slot::Occupied { .. } => '#',
            })
            .collect();

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .field("requested", &self.requested)
            .field("slots", &layout)
            .finish()
    }
}

impl<V> HashTable<V> {
    /// Creates a table sized for `requested` entries.
    ///
    /// The slot count is the smallest prime at least one and a half times
    /// `requested`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `requested` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100)?;
    /// assert_eq!(table.capacity(), 151);
    ///
    /// assert!(HashTable::<String>::with_capacity(0).is_err());
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn with_capacity(requested: usize) -> Result<Self> {
        if requested == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Self::allocate(requested))
    }

    /// Like [`with_capacity`](Self::with_capacity), treating zero as one.
    pub(crate) fn allocate(requested: usize) -> Self {
        let requested = requested.max(1);
        Self {
            slots: SlotStore::new(primes::initial_capacity(requested)),
            populated: 0,
            requested,
        }
    }

    /// Returns an iterator over all values in the table, in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10)?;
    /// table.entry(1, |&v: &u64| v == 1)?.or_insert(1);
    /// table.entry(2, |&v: &u64| v == 2)?.or_insert(2);
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [1, 2]);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Iterates live values together with their stored hashes.
    pub(crate) fn iter_hashed(&self) -> impl Iterator<Item = (u64, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { hash, value } => Some((*hash, value)),
            _ => None,
        })
    }

    /// Returns `true` if the table contains no live values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of live values in the table.
    ///
    /// Tombstones are not counted.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of slots. Always prime.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the entry count the table was created for.
    pub fn requested_capacity(&self) -> usize {
        self.requested
    }

    /// Returns the fraction of slots holding live values.
    ///
    /// Always below 2/3 between operations.
    pub fn load(&self) -> f64 {
        if self.populated == 0 {
            return 0.0;
        }
        self.populated as f64 / self.capacity() as f64
    }

    /// Removes all values, resetting every slot to empty.
    ///
    /// The capacity is kept.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.populated = 0;
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10)?;
    /// table.entry(42, |&v: &u64| v == 42)?.or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&v| v == 42), Some(&42));
    /// assert_eq!(table.find(43, |&v| v == 43), None);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value_at(index))
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        Some(self.value_at_mut(index))
    }

    /// Removes and returns a value, leaving a tombstone in its slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10)?;
    /// table.entry(42, |&v: &u64| v == 42)?.or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&v| v == 42), Some(42));
    /// assert_eq!(table.remove(42, |&v| v == 42), None);
    /// assert!(table.is_empty());
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        let value = self.slots[index].retire()?;
        self.populated -= 1;
        Some(value)
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// A vacant entry points at the first tombstone on the probe path if there
    /// is one, otherwise at the empty slot that ended the probe.
    /// If the probe wraps around the whole table without meeting an empty slot,
    /// the key is absent and the first tombstone passed is reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableExhausted`] if the probe wrapped around the whole
    /// table without finding a match or a free slot. The load factor bound makes
    /// this unreachable for a table that only changes through this API.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::Entry;
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10)?;
    ///
    /// match table.entry(7, |(k, _): &(u64, &str)| *k == 7)? {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((7, "seven"));
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         entry.get_mut().1 = "updated";
    ///     }
    /// }
    /// assert_eq!(table.len(), 1);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Result<Entry<'_, V>> {
        match self.probe_for_insert(hash, eq) {
            Probe::Found(index) => Ok(Entry::Occupied(OccupiedEntry { table: self, index })),
            Probe::Vacant(index) => Ok(Entry::Vacant(VacantEntry {
                table: self,
                hash,
                index,
            })),
            Probe::Exhausted => {
                log::error!(
                    "Probed all {} slots without a match or a free slot ({} live entries)",
                    self.capacity(),
                    self.populated
                );
                Err(Error::TableExhausted {
                    capacity: self.capacity(),
                })
            }
        }
    }

    /// Inserts a value the caller knows is not in the table yet.
    ///
    /// Skips the equality probe: the value goes into the first free slot on its
    /// probe path.
    pub(crate) fn insert_unique(&mut self, hash: u64, value: V) {
        let index = self.place(hash, value);
        self.populated += 1;
        self.grow_while_overloaded(index);
    }

    #[inline(always)]
    fn start_index(&self, hash: u64) -> usize {
        (hash % self.capacity() as u64) as usize
    }

    fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        for index in probe_sequence(self.start_index(hash), self.capacity()) {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied {
                    hash: stored,
                    value,
                } => {
                    if *stored == hash && eq(value) {
                        return Some(index);
                    }
                }
            }
        }

        None
    }

    fn probe_for_insert(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Probe {
        let mut first_tombstone = None;

        for index in probe_sequence(self.start_index(hash), self.capacity()) {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                }
                Slot::Occupied {
                    hash: stored,
                    value,
                } => {
                    if *stored == hash && eq(value) {
                        return Probe::Found(index);
                    }
                }
            }
        }

        // A full wrap proves the value is absent, so a tombstone seen on the
        // way is still a valid home for it.
        match first_tombstone {
            Some(index) => Probe::Vacant(index),
            None => Probe::Exhausted,
        }
    }

    /// Writes `value` into the first non-occupied slot on its probe path.
    ///
    /// The caller guarantees at least one such slot exists.
    fn place(&mut self, hash: u64, value: V) -> usize {
        debug_assert!(self.populated < self.capacity());

        let capacity = self.capacity();
        let mut index = self.start_index(hash);
        while matches!(self.slots[index], Slot::Occupied { .. }) {
            index += 1;
            if index == capacity {
                index = 0;
            }
        }

        self.slots[index] = Slot::Occupied { hash, value };
        index
    }

    /// Grows until the load factor is below 2/3, returning where the value at
    /// `tracked` ended up.
    fn grow_while_overloaded(&mut self, mut tracked: usize) -> usize {
        while over_max_load(self.populated, self.capacity()) {
            tracked = self.resize(tracked);
        }
        tracked
    }

    #[cold]
    fn resize(&mut self, tracked: usize) -> usize {
        let old_capacity = self.capacity();
        let new_capacity = primes::grown_capacity(old_capacity);
        log::debug!(
            "Growing table from {old_capacity} to {new_capacity} slots ({} live entries)",
            self.populated
        );

        let old_slots = core::mem::replace(&mut self.slots, SlotStore::new(new_capacity));
        let live = self.populated;
        self.populated = 0;

        let mut relocated = tracked;
        for (old_index, hash, value) in old_slots.into_occupied() {
            let new_index = self.place(hash, value);
            self.populated += 1;
            if old_index == tracked {
                relocated = new_index;
            }
        }

        debug_assert_eq!(self.populated, live);
        relocated
    }

    #[inline]
    fn value_at(&self, index: usize) -> &V {
        match &self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    #[inline]
    fn value_at_mut(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Returns the state of every slot, in physical order.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn slot_states(&self) -> Vec<SlotState> {
        self.slots.iter().map(Slot::state).collect()
    }

    /// Returns the slot index holding the value matching `hash` and `eq`.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn slot_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        self.find_index(hash, eq)
    }

    /// Returns slot-level statistics for debugging.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.capacity();
        let mut tombstones = 0;
        let mut empty = 0;
        let mut longest_probe = 0;
        let mut total_probe = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Empty => empty += 1,
                Slot::Tombstone => tombstones += 1,
                Slot::Occupied { hash, .. } => {
                    let start = self.start_index(*hash);
                    let probe = (index + capacity - start) % capacity + 1;
                    longest_probe = longest_probe.max(probe);
                    total_probe += probe;
                }
            }
        }

        DebugStats {
            populated: self.populated,
            capacity,
            tombstones,
            empty,
            load_factor: self.load(),
            longest_probe,
            mean_probe: if self.populated == 0 {
                0.0
            } else {
                total_probe as f64 / self.populated as f64
            },
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, V>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable reference
    /// to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(10)?;
    /// *table.entry(5, |&(k, _): &(u64, u32)| k == 5)?.or_insert((5, 0)) = (5, 1);
    /// assert_eq!(table.find(5, |&(k, _)| k == 5), Some(&(5, 1)));
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.table.value_at(self.index)
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_at_mut(self.index)
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, index } = self;
        table.value_at_mut(index)
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
    index: usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Returns the slot index the value will be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Inserts the value, growing the table if the load factor reaches 2/3,
    /// and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        if matches!(table.slots[self.index], Slot::Tombstone) {
            log::trace!("Reusing tombstone at slot {}", self.index);
        }

        table.slots[self.index] = Slot::Occupied {
            hash: self.hash,
            value,
        };
        table.populated += 1;

        let index = table.grow_while_overloaded(self.index);
        table.value_at_mut(index)
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`]. It yields
/// `&V` references in slot order.
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;
    use test_log::test;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn insert_item(table: &mut HashTable<Item>, hash: u64, key: u64, value: i32) {
        match table.entry(hash, |v| v.key == key).unwrap() {
            Entry::Vacant(v) => {
                v.insert(Item { key, value });
            }
            Entry::Occupied(_) => panic!("unexpected occupied for {key}: {table:#?}"),
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            HashTable::<Item>::with_capacity(0).unwrap_err(),
            Error::InvalidCapacity
        );
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(1).unwrap();
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            insert_item(&mut table, hash, k, (k as i32) * 2);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k).map(|v| v.value),
                Some((k as i32) * 2),
                "{:#?}",
                table
            );
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4).unwrap();
        let k = 42u64;
        let hash = hash_key(&state, k);

        insert_item(&mut table, hash, k, 7);

        match table.entry(hash, |v| v.key == k).unwrap() {
            Entry::Occupied(mut occ) => {
                let prev_value = occ.get().value;
                *occ.get_mut() = Item { key: k, value: 11 };
                assert_eq!(prev_value, 7);
            }
            Entry::Vacant(_) => panic!("should be occupied: {}#{:02X} in {:#?}", k, hash, table),
        }
        assert_eq!(table.len(), 1);
        let found = table.find(hash, |v| v.key == k).unwrap();
        assert_eq!(found.value, 11);
    }

    #[test]
    fn find_mut_and_modify() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        for k in 0..5u64 {
            insert_item(&mut table, hash_key(&state, k), k, 1);
        }

        for k in 0..5u64 {
            if let Some(v) = table.find_mut(hash_key(&state, k), |v| v.key == k) {
                v.value += 9;
            }
        }
        for k in 0..5u64 {
            let v = table.find(hash_key(&state, k), |v| v.key == k).unwrap();
            assert_eq!(v.value, 10);
        }
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(8).unwrap();
        for k in 0..8u64 {
            insert_item(&mut table, hash_key(&state, k), k, k as i32);
        }
        assert_eq!(table.len(), 8);
        for k in [0u64, 3, 7] {
            let hash = hash_key(&state, k);
            let removed = table.remove(hash, |v| v.key == k).expect("should remove");
            assert_eq!(removed.key, k);
            assert!(table.find(hash, |v| v.key == k).is_none());
        }
        assert_eq!(table.len(), 5);

        let hash = hash_key(&state, 1000);
        assert!(table.remove(hash, |v| v.key == 1000).is_none());
    }

    #[test]
    fn empty_table_misses() {
        let mut table: HashTable<Item> = HashTable::with_capacity(3).unwrap();
        assert!(table.find(0, |_| true).is_none());
        assert!(table.remove(0, |_| true).is_none());
        assert_eq!(table.load(), 0.0);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(1).unwrap();
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            insert_item(&mut table, hash, k, k as i32);
            assert!(table.load() < 2.0 / 3.0);
        }

        assert_eq!(table.len(), 100000);
        assert!(primes::is_prime(table.capacity()));
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: k as i32
                })
            );
        }
    }

    #[test]
    fn explicit_collision() {
        let mut table: HashTable<Item> = HashTable::with_capacity(1).unwrap();
        let hash = 0;
        for k in 0..65u64 {
            insert_item(&mut table, hash, k, k as i32);
        }

        assert_eq!(table.len(), 65);
        for k in 0..65u64 {
            assert_eq!(
                table.find(hash, |v| v.key == k).map(|v| v.value),
                Some(k as i32),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.debug_stats().longest_probe, 65);
    }

    #[test]
    fn grows_to_next_prime_at_two_thirds() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        assert_eq!(table.capacity(), 7);

        for k in 1..=4u64 {
            insert_item(&mut table, k, k, 0);
        }
        assert_eq!(table.capacity(), 7);

        insert_item(&mut table, 5, 5, 0);
        assert_eq!(table.capacity(), 17);
        assert_eq!(table.len(), 5);
        assert_eq!(table.load(), 5.0 / 17.0);
        assert_eq!(table.requested_capacity(), 5);
    }

    #[test]
    fn update_does_not_grow() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        for k in 1..=4u64 {
            insert_item(&mut table, k, k, 0);
        }
        for _ in 0..10 {
            *table.entry(4, |v| v.key == 4).unwrap().or_insert(Item { key: 4, value: 0 }) =
                Item { key: 4, value: 1 };
        }
        assert_eq!(table.capacity(), 7);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn vacant_insert_reference_survives_growth() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        for k in 1..=4u64 {
            insert_item(&mut table, k, k, 0);
        }

        let inserted = match table.entry(12, |v| v.key == 12).unwrap() {
            Entry::Vacant(entry) => entry.insert(Item { key: 12, value: 1 }),
            Entry::Occupied(_) => unreachable!(),
        };
        inserted.value = 99;

        assert_eq!(table.capacity(), 17);
        assert_eq!(table.find(12, |v| v.key == 12).map(|v| v.value), Some(99));
    }

    #[test]
    fn tombstone_is_reused_by_colliding_hash() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        insert_item(&mut table, 3, 3, 1);
        assert_eq!(table.slot_index(3, |v| v.key == 3), Some(3));

        table.remove(3, |v| v.key == 3).unwrap();
        assert_eq!(table.slot_states()[3], SlotState::Tombstone);

        match table.entry(10, |v| v.key == 10).unwrap() {
            Entry::Vacant(entry) => {
                assert_eq!(entry.index(), 3);
                entry.insert(Item { key: 10, value: 2 });
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(table.slot_index(10, |v| v.key == 10), Some(3));
        assert_eq!(table.capacity(), 7);
    }

    #[test]
    fn first_tombstone_wins_over_later_empty_slot() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        insert_item(&mut table, 3, 3, 0);
        insert_item(&mut table, 10, 10, 0);
        assert_eq!(table.slot_index(10, |v| v.key == 10), Some(4));

        table.remove(3, |v| v.key == 3).unwrap();
        assert_eq!(table.find(10, |v| v.key == 10).map(|v| v.key), Some(10));

        insert_item(&mut table, 17, 17, 0);
        assert_eq!(table.slot_index(17, |v| v.key == 17), Some(3));
        assert_eq!(table.slot_states()[5], SlotState::Empty);
    }

    #[test]
    fn insert_after_full_wrap_uses_tombstone() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        for k in 0..4u64 {
            insert_item(&mut table, k, k, 0);
        }
        table.remove(0, |v| v.key == 0).unwrap();
        table.remove(1, |v| v.key == 1).unwrap();
        insert_item(&mut table, 4, 4, 0);
        insert_item(&mut table, 5, 5, 0);
        table.remove(2, |v| v.key == 2).unwrap();
        table.remove(3, |v| v.key == 3).unwrap();
        insert_item(&mut table, 6, 6, 0);

        assert!(
            table
                .slot_states()
                .iter()
                .all(|state| *state != SlotState::Empty),
            "{table:#?}"
        );

        // No empty slot is left: 13 starts at slot 6, 7 starts at slot 0.
        assert!(table.find(13, |v| v.key == 13).is_none());
        insert_item(&mut table, 7, 7, 0);
        assert_eq!(table.slot_index(7, |v| v.key == 7), Some(0));
        assert_eq!(table.len(), 4);
        assert_eq!(table.capacity(), 7);
    }

    #[test]
    fn exhausted_probe_is_an_error() {
        let mut table: HashTable<Item> = HashTable::with_capacity(1).unwrap();
        let capacity = table.capacity();
        for index in 0..capacity {
            table.slots[index] = Slot::Occupied {
                hash: index as u64,
                value: Item {
                    key: index as u64,
                    value: 0,
                },
            };
        }
        table.populated = capacity;

        let result = table.entry(99, |v| v.key == 99);
        assert!(matches!(
            result,
            Err(Error::TableExhausted { capacity: c }) if c == capacity
        ));
        assert_eq!(table.len(), capacity);
        assert!(table.find(0, |v| v.key == 0).is_some());
    }

    #[test]
    fn iter_skips_tombstones() {
        let mut table: HashTable<Item> = HashTable::with_capacity(10).unwrap();
        for k in 10..20u64 {
            insert_item(&mut table, k, k, (k as i32) + 1);
        }
        for k in [11u64, 15] {
            table.remove(k, |v| v.key == k).unwrap();
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 8);
        let mut collected: Vec<u64> = iter.map(|v| v.key).collect();
        collected.sort();
        assert_eq!(collected, vec![10, 12, 13, 14, 16, 17, 18, 19]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table: HashTable<Item> = HashTable::with_capacity(2).unwrap();
        for k in 0..20u64 {
            insert_item(&mut table, k, k, 0);
        }
        table.remove(0, |v| v.key == 0).unwrap();
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(table.slot_states().iter().all(|s| *s == SlotState::Empty));
        assert!(table.find(5, |v| v.key == 5).is_none());
    }

    #[test]
    fn debug_stats_counts_slot_states() {
        let mut table: HashTable<Item> = HashTable::with_capacity(5).unwrap();
        insert_item(&mut table, 0, 0, 0);
        insert_item(&mut table, 7, 7, 0);
        insert_item(&mut table, 2, 2, 0);
        table.remove(2, |v| v.key == 2).unwrap();

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 2);
        assert_eq!(stats.capacity, 7);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.empty, 4);
        assert_eq!(stats.longest_probe, 2);
        assert_eq!(stats.mean_probe, 1.5);
        assert_eq!(stats.load_factor, 2.0 / 7.0);
    }

    #[test]
    fn debug_layout() {
        let mut table: HashTable<Item> = HashTable::with_capacity(3).unwrap();
        insert_item(&mut table, 1, 1, 0);
        insert_item(&mut table, 3, 3, 0);
        table.remove(1, |v| v.key == 1).unwrap();

        let rendered = alloc::format!("{table:?}");
        assert!(rendered.contains("slots: \".x.#.\""), "{rendered}");
    }
}
