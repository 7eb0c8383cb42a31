//! Per-category recycling of entity identifiers.

use std::collections::BTreeSet;

use bulwark_core::{EntityCategory, EntityId, PoolConfig, PoolStats};

/// Free list of identifiers belonging to one entity category.
///
/// Identifiers are handed out in ascending order of when they were stocked;
/// the pool never invents identifiers itself, the world stocks it from the
/// global identifier counter.
#[derive(Clone, Debug)]
pub(crate) struct EntityPool {
    category: EntityCategory,
    available: Vec<EntityId>,
    in_use: BTreeSet<EntityId>,
    capacity: usize,
    expansion_batch: usize,
    expansions: usize,
}

impl EntityPool {
    pub(crate) fn new(category: EntityCategory, config: PoolConfig) -> Self {
        Self {
            category,
            available: Vec::with_capacity(config.initial),
            in_use: BTreeSet::new(),
            capacity: 0,
            expansion_batch: config.expansion_batch.max(1),
            expansions: 0,
        }
    }

    pub(crate) const fn category(&self) -> EntityCategory {
        self.category
    }

    pub(crate) const fn expansion_batch(&self) -> usize {
        self.expansion_batch
    }

    /// Adds freshly allocated identifiers to the free list.
    pub(crate) fn stock(&mut self, fresh: &[EntityId]) {
        // Kept descending so that `take` pops the lowest identifier first.
        self.available.extend_from_slice(fresh);
        self.available.sort_unstable_by(|a, b| b.cmp(a));
        self.capacity += fresh.len();
    }

    /// Takes ownership of a fresh identifier that is handed out immediately.
    pub(crate) fn adopt(&mut self, entity: EntityId) {
        let _ = self.in_use.insert(entity);
        self.capacity += 1;
    }

    /// Records a growth after exhaustion.
    pub(crate) fn note_expansion(&mut self) {
        self.expansions += 1;
    }

    #[cfg(test)]
    fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    /// Pops an identifier and marks it in use.
    pub(crate) fn take(&mut self) -> Option<EntityId> {
        let entity = self.available.pop()?;
        let _ = self.in_use.insert(entity);
        Some(entity)
    }

    /// Returns an identifier to the free list. Releasing an identifier that
    /// is not in use is a no-op reported as `false`.
    pub(crate) fn give_back(&mut self, entity: EntityId) -> bool {
        if !self.in_use.remove(&entity) {
            return false;
        }
        self.available.push(entity);
        true
    }

    pub(crate) fn is_in_use(&self, entity: EntityId) -> bool {
        self.in_use.contains(&entity)
    }

    pub(crate) fn in_use(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.in_use.iter().copied()
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            in_use: self.in_use.len(),
            capacity: self.capacity,
            expansions: self.expansions,
        }
    }
}
