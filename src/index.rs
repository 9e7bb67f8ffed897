//! Tiny index: every catalog item's position in the flattened catalog.
//!
//! Built once per catalog load and read-only afterwards. Positions are only
//! stable while the catalog keeps the same order and cardinality.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem};
use crate::error::CodecError;
use crate::selection::SelectionSet;

/// How to treat two items that derive the same tiny key (same date and slot).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Later items alias onto the first item's index. Matches links
    /// produced by every earlier build.
    #[default]
    Alias,
    /// Refuse to build an index with colliding keys.
    Reject,
    /// Key on series, date, venue and slot so every item keeps its own
    /// position.
    Distinct,
}

/// Immutable index over a flattened catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    items: Vec<CatalogItem>,
    keys: Vec<String>,
    lookup: HashMap<String, u32>,
    policy: CollisionPolicy,
}

impl CatalogIndex {
    /// Index `catalog` with the aliasing policy.
    pub fn new(catalog: &Catalog) -> Self {
        // Alias never fails.
        Self::from_items(catalog.flatten(), CollisionPolicy::Alias).unwrap_or_default()
    }

    /// Index `catalog` under `policy`.
    pub fn with_policy(catalog: &Catalog, policy: CollisionPolicy) -> Result<Self, CodecError> {
        Self::from_items(catalog.flatten(), policy)
    }

    /// Index already-flattened items under `policy`.
    pub fn from_items(items: Vec<CatalogItem>, policy: CollisionPolicy) -> Result<Self, CodecError> {
        let keys: Vec<String> = items
            .iter()
            .map(|item| match policy {
                CollisionPolicy::Distinct => item.identity_key(),
                CollisionPolicy::Alias | CollisionPolicy::Reject => item.tiny_key(),
            })
            .collect();

        let mut lookup = HashMap::with_capacity(keys.len());
        for (position, key) in keys.iter().enumerate() {
            match lookup.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(position as u32);
                }
                Entry::Occupied(existing) => {
                    let first = *existing.get() as usize;
                    if policy == CollisionPolicy::Reject {
                        return Err(CodecError::DuplicateKey {
                            key: key.clone(),
                            position,
                            first,
                        });
                    }
                    tracing::warn!(%key, position, first, "catalog key collision, aliasing");
                }
            }
        }

        tracing::debug!(items = items.len(), ?policy, "built catalog index");
        Ok(Self {
            items,
            keys,
            lookup,
            policy,
        })
    }

    /// Number of positions, the universe every encoder works over.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The policy this index was built with.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Flattened items in position order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Keys in position order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Index for `key`; the first position that derived it.
    pub fn index_of_key(&self, key: &str) -> Option<u32> {
        self.lookup.get(key).copied()
    }

    /// Index of the item at `position`. Differs from `position` only for
    /// aliased items.
    pub fn index_at(&self, position: usize) -> Option<u32> {
        self.keys.get(position).and_then(|key| self.index_of_key(key))
    }

    /// Checked state per position for `selection`. Indices beyond the
    /// catalog match nothing.
    pub fn apply(&self, selection: &SelectionSet) -> Vec<bool> {
        (0..self.len())
            .map(|position| {
                self.index_at(position)
                    .is_some_and(|index| selection.contains(index))
            })
            .collect()
    }

    /// Selected indices for per-position checked state.
    pub fn selected(&self, checked: &[bool]) -> SelectionSet {
        checked
            .iter()
            .enumerate()
            .filter(|&(_, &on)| on)
            .filter_map(|(position, _)| self.index_at(position))
            .collect()
    }
}
