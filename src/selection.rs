use crate::{ElementId, GraphStore};
use std::collections::BTreeSet;

/// Ephemeral set of selected elements. Never persisted, never in history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element; returns false if it was already selected
    pub fn select(&mut self, id: ElementId) -> bool {
        self.ids.insert(id)
    }

    pub fn deselect(&mut self, id: ElementId) -> bool {
        self.ids.remove(&id)
    }

    /// Flip membership; returns whether the element is now selected
    pub fn toggle(&mut self, id: ElementId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Replace the selection with a single element
    pub fn select_only(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    pub fn select_all(&mut self, store: &GraphStore) {
        self.ids = store.element_ids().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget ids whose elements no longer exist
    pub fn retain_existing(&mut self, store: &GraphStore) {
        self.ids.retain(|id| store.contains_element(*id));
    }
}
