use core::fmt::Debug;
use core::fmt::Display;
use core::hash::BuildHasher;
use core::hash::Hash;

#[cfg(any(test, feature = "stats"))]
use crate::SlotState;
use crate::error::Error;
use crate::error::Result;
use crate::hash_set::HashSet;
use crate::hash_table::DEFAULT_REQUESTED_CAPACITY;
#[cfg(any(test, feature = "stats"))]
use crate::hash_table::DebugStats;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;

/// A key-value table using open addressing with linear probing.
///
/// `Table<K, V, S>` keeps every entry directly in a prime-sized slot array.
/// Keys are hashed with the hasher builder `S`; collisions walk forward one
/// slot at a time. Removing a key leaves a tombstone, and the first tombstone
/// met by a later insertion probe is reused. Once a new key brings the load
/// factor to 2/3, the table is rebuilt with the smallest prime capacity at
/// least twice the current one.
///
/// # Examples
///
/// ```rust
/// use prime_probe::Error;
/// use prime_probe::Table;
///
/// let mut grades: Table<&str, &str> = Table::with_capacity(3)?;
/// grades.insert("CMPT 101", "A")?;
/// grades.insert("CMPT 103", "B")?;
///
/// assert_eq!(grades.lookup(&"CMPT 101"), Ok(&"A"));
/// assert_eq!(grades.insert("CMPT 101", "A+")?, Some("A"));
///
/// assert_eq!(grades.remove(&"CMPT 103")?, "B");
/// assert_eq!(grades.lookup(&"CMPT 103"), Err(Error::KeyNotFound));
/// assert!(grades.load() < 2.0 / 3.0);
/// # Ok::<(), prime_probe::Error>(())
/// ```
#[derive(Clone)]
pub struct Table<K, V, S = crate::DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for Table<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders live entries as `{<key: value>, <key: value>}` in slot order.
impl<K, V, S> Display for Table<K, V, S>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "<{key}: {value}>")?;
        }
        f.write_str("}")
    }
}

impl<K, V, S> Table<K, V, S> {
    /// Returns the number of entries in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::new();
    /// assert_eq!(table.len(), 0);
    /// table.insert(1, "a")?;
    /// assert_eq!(table.len(), 1);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots. Always prime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Table;
    /// #
    /// let table: Table<u32, u32> = Table::with_capacity(5)?;
    /// assert_eq!(table.capacity(), 7);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the entry count the table was created for.
    pub fn requested_capacity(&self) -> usize {
        self.table.requested_capacity()
    }

    /// Returns the load factor: entries divided by slots.
    ///
    /// Zero for an empty table, and always below 2/3.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::with_capacity(5)?;
    /// assert_eq!(table.load(), 0.0);
    /// table.insert(1, "a")?;
    /// assert_eq!(table.load(), 1.0 / 7.0);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn load(&self) -> f64 {
        self.table.load()
    }

    /// Removes every entry, keeping the current capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over `(&K, &V)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> Table<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty table with the given hasher builder, sized for the
    /// default of 100 entries.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::allocate(DEFAULT_REQUESTED_CAPACITY),
            hash_builder,
        }
    }

    /// Creates an empty table sized for `capacity` entries with the given
    /// hasher builder.
    ///
    /// The slot count is the smallest prime at least one and a half times
    /// `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::hash::RandomState;
    ///
    /// use prime_probe::Table;
    ///
    /// let table: Table<i32, String, _> = Table::with_capacity_and_hasher(100, RandomState::new())?;
    /// assert_eq!(table.capacity(), 151);
    /// assert_eq!(table.requested_capacity(), 100);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Inserts a key-value pair.
    ///
    /// If the key was absent, `None` is returned and the table may grow. If it
    /// was present, its value is replaced in place and the old value returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableExhausted`] if the probe found neither the key nor
    /// a free slot, which means the load factor invariant was broken. The table
    /// is not modified in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::new();
    /// assert_eq!(table.insert(37, "a")?, None);
    /// assert_eq!(table.insert(37, "b")?, Some("a"));
    /// assert_eq!(table.lookup(&37), Ok(&"b"));
    /// assert_eq!(table.len(), 1);
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key)? {
            Entry::Occupied(mut entry) => {
                Ok(Some(core::mem::replace(&mut entry.get_mut().1, value)))
            }
            Entry::Vacant(entry) => {
                entry.insert((key, value));
                Ok(None)
            }
        }
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Error;
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::new();
    /// table.insert(101, "Intro to Programming")?;
    /// assert_eq!(table.lookup(&101), Ok(&"Intro to Programming"));
    /// assert_eq!(table.lookup(&500), Err(Error::KeyNotFound));
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn lookup(&self, key: &K) -> Result<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn lookup_mut(&mut self, key: &K) -> Result<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns `true` if the table holds a value for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key).is_ok()
    }

    /// Removes `key`, returning its value. The slot becomes a tombstone and
    /// the capacity never shrinks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Error;
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::new();
    /// table.insert(1, "a")?;
    /// assert_eq!(table.remove(&1), Ok("a"));
    /// assert_eq!(table.remove(&1), Err(Error::KeyNotFound));
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn remove(&mut self, key: &K) -> Result<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    pub fn remove_entry(&mut self, key: &K) -> Result<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .remove(hash, |(k, _)| k == key)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns the physical slot holding `key`.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn slot_of(&self, key: &K) -> Option<usize> {
        let hash = self.hash_builder.hash_one(key);
        self.table.slot_index(hash, |(k, _)| k == key)
    }
}

impl<K, V, S> Table<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    /// Returns the set of live keys.
    ///
    /// Keys are cloned into a new [`HashSet`] that shares this table's hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prime_probe::Table;
    /// #
    /// let mut table: Table<_, _> = Table::new();
    /// table.insert("hello", 1)?;
    /// table.insert("world", 2)?;
    /// table.remove(&"hello")?;
    ///
    /// let keys = table.keys();
    /// assert_eq!(keys.len(), 1);
    /// assert!(keys.contains(&"world"));
    /// # Ok::<(), prime_probe::Error>(())
    /// ```
    pub fn keys(&self) -> HashSet<K, S> {
        // One spare entry keeps the snapshot below the growth threshold.
        let mut keys = HashTable::allocate(self.len() + 1);
        for (hash, (key, _)) in self.table.iter_hashed() {
            keys.insert_unique(hash, key.clone());
        }
        HashSet::from_table(keys, self.hash_builder.clone())
    }
}

impl<K, V, S> Table<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty table using the default hasher builder, sized for 100
    /// entries.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty table sized for `capacity` entries using the default
    /// hasher builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for Table<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "stats"))]
impl<K, V, S> Table<K, V, S> {
    /// Returns slot-level statistics for debugging.
    ///
    /// Available in tests and with the `stats` feature.
    pub fn debug_stats(&self) -> DebugStats {
        self.table.debug_stats()
    }

    /// Returns the state of every slot, in physical order.
    ///
    /// Available in tests and with the `stats` feature.
    pub fn slot_states(&self) -> alloc::vec::Vec<SlotState> {
        self.table.slot_states()
    }

    /// Prints every slot, including empty and tombstoned ones.
    ///
    /// Available in tests and with the `stats` feature; requires `std`.
    #[cfg(feature = "std")]
    pub fn show_entries(&self)
    where
        K: Debug,
        V: Debug,
    {
        let mut live = self.iter();
        for (index, state) in self.table.slot_states().into_iter().enumerate() {
            match state {
                SlotState::Empty => println!("Index {index}: None"),
                SlotState::Tombstone => println!("Index {index}: _deleted"),
                SlotState::Occupied => {
                    if let Some((key, value)) = live.next() {
                        println!("Index {index}: ({key:?}, {value:?})");
                    }
                }
            }
        }
    }
}

/// An iterator over the key-value pairs of a [`Table`], in slot order.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the values of a [`Table`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K, V, S> IntoIterator for &'a Table<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
