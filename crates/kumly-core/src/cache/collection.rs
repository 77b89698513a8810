// ── Keyed entity collection ──
//
// Plain ordered map from server id to record. Synchronisation lives one
// level up in `StateCache`; every method here assumes the caller holds
// the cache lock.

use std::collections::BTreeMap;

use crate::model::Entity;

#[derive(Debug, Clone)]
pub(crate) struct Collection<T> {
    items: BTreeMap<i64, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    /// Replace every record. Returns the ids now present.
    pub(crate) fn replace(&mut self, items: impl IntoIterator<Item = T>) -> Vec<i64> {
        self.items = items.into_iter().map(|item| (item.id(), item)).collect();
        self.ids()
    }

    /// Insert or overwrite records by id. Returns the ids touched.
    pub(crate) fn upsert(&mut self, items: impl IntoIterator<Item = T>) -> Vec<i64> {
        items
            .into_iter()
            .map(|item| {
                let id = item.id();
                self.items.insert(id, item);
                id
            })
            .collect()
    }

    pub(crate) fn remove(&mut self, id: i64) -> Option<T> {
        self.items.remove(&id)
    }

    pub(crate) fn get(&self, id: i64) -> Option<&T> {
        self.items.get(&id)
    }

    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.values().find(|item| pred(item))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    /// Owned copies of every record, ordered by id.
    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }

    pub(crate) fn ids(&self) -> Vec<i64> {
        self.items.keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
