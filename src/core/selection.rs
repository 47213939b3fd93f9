use std::collections::BTreeSet;

use super::{participant::Participant, roster::RosterStore};

/// Visible rows that may be selected for bulk check-in.
pub fn selectable_ids(visible: &[&Participant]) -> Vec<String> {
    visible
        .iter()
        .filter(|p| !p.checked_in)
        .map(|p| p.id.clone())
        .collect()
}

/// Participants chosen for the next bulk action.
///
/// Never holds the id of a checked-in participant once `reconcile` has run
/// against the store.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str, checked: bool) {
        if checked {
            self.ids.insert(id.to_owned());
        } else {
            self.ids.remove(id);
        }
    }

    /// Replace the selection with every selectable visible row.
    pub fn select_all(&mut self, visible: &[&Participant]) {
        self.ids = selectable_ids(visible).into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The "select all" checkbox: select everything, or clear if everything
    /// is already selected.
    pub fn toggle_all(&mut self, visible: &[&Participant]) {
        if self.is_all_selected(visible) {
            self.clear();
        } else {
            self.select_all(visible);
        }
    }

    pub fn is_all_selected(&self, visible: &[&Participant]) -> bool {
        let selectable = selectable_ids(visible);
        !selectable.is_empty() && selectable.iter().all(|id| self.ids.contains(id))
    }

    pub fn remove_all<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            self.ids.remove(id.as_ref());
        }
    }

    /// Drop ids that are no longer in the store or have been checked in.
    pub fn reconcile(&mut self, store: &RosterStore) {
        self.ids
            .retain(|id| store.get(id).is_some_and(|p| !p.checked_in));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
