use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Index;
use core::ops::IndexMut;

/// A single slot of an open-addressed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot<V> {
    /// Never occupied since the store was allocated.
    Empty,
    /// Held an entry that was removed. Probes continue past it.
    Tombstone,
    /// Holds a live value together with its full hash.
    Occupied { hash: u64, value: V },
}

impl<V> Slot<V> {
    /// Retire an occupied slot, returning its value.
    ///
    /// Leaves `Empty` and `Tombstone` slots untouched.
    pub(crate) fn retire(&mut self) -> Option<V> {
        if !matches!(self, Slot::Occupied { .. }) {
            return None;
        }

        match core::mem::replace(self, Slot::Tombstone) {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn state(&self) -> SlotState {
        match self {
            Slot::Empty => SlotState::Empty,
            Slot::Tombstone => SlotState::Tombstone,
            Slot::Occupied { .. } => SlotState::Occupied,
        }
    }
}

/// The observable state of a slot, without its contents.
///
/// Returned by the slot inspection helpers available in tests and with the
/// `stats` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// The slot has not held a value since the table was last resized.
    Empty,
    /// The slot held a value that has since been removed.
    Tombstone,
    /// The slot holds a live value.
    Occupied,
}

/// Fixed-length array of slots. Growth replaces the whole store.
#[derive(Debug, Clone)]
pub(crate) struct SlotStore<V> {
    slots: Box<[Slot<V>]>,
}

impl<V> SlotStore<V> {
    /// Allocate `capacity` slots, all `Empty`.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Slot<V>> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, Slot<V>> {
        self.slots.iter_mut()
    }

    /// Consume the store, yielding `(index, hash, value)` for every occupied
    /// slot in physical order.
    pub(crate) fn into_occupied(self) -> impl Iterator<Item = (usize, u64, V)> {
        self.slots
            .into_vec()
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { hash, value } => Some((index, hash, value)),
                _ => None,
            })
    }
}

impl<V> Index<usize> for SlotStore<V> {
    type Output = Slot<V>;

    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.slots[index]
    }
}

impl<V> IndexMut<usize> for SlotStore<V> {
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.slots[index]
    }
}
