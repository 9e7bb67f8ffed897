//! The set of selected tiny indices.

use std::collections::BTreeSet;

/// A set of tiny indices, always iterated in ascending order.
///
/// Encoders consume the sorted form; decoders build one up token by token,
/// so duplicates from overlapping ranges collapse naturally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectionSet(BTreeSet<u32>);

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index. Returns `false` if it was already selected.
    pub fn insert(&mut self, index: u32) -> bool {
        self.0.insert(index)
    }

    /// Whether `index` is selected.
    pub fn contains(&self, index: u32) -> bool {
        self.0.contains(&index)
    }

    /// Number of selected indices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ascending iterator over the selected indices.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Largest selected index, if any.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// The selection as a sorted, unique vector.
    pub fn to_sorted_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Drop every index that is not below `universe_size`.
    pub fn retain_below(&mut self, universe_size: usize) {
        self.0.retain(|&i| (i as usize) < universe_size);
    }
}

impl FromIterator<u32> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for SelectionSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for SelectionSet {
    type Item = u32;
    type IntoIter = std::collections::btree_set::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl From<&[u32]> for SelectionSet {
    fn from(ids: &[u32]) -> Self {
        ids.iter().copied().collect()
    }
}

impl<const N: usize> From<[u32; N]> for SelectionSet {
    fn from(ids: [u32; N]) -> Self {
        ids.into_iter().collect()
    }
}
