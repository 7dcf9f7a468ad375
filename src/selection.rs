//! Checked-row tracking.
//!
//! Selection is keyed by row identity strings, so it survives search,
//! filter, sort and page changes untouched.

use serde::Serialize;
use std::collections::HashSet;

/// Visual state of the header "select all" checkbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectAllState {
    Unchecked,
    Indeterminate,
    Checked,
}

#[derive(Clone, Debug, Default)]
pub struct Selection {
    selected: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// All selected ids, sorted for deterministic ordering.
    pub fn selected(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flip one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Header checkbox click against the currently filtered ids.
    ///
    /// When every filtered id is already selected the whole selection is
    /// cleared, including ids picked under a different filter. Otherwise the
    /// selection becomes exactly the filtered ids.
    pub fn toggle_all<'a, I>(&mut self, filtered_ids: I)
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        if self.state(filtered_ids.clone()) == SelectAllState::Checked {
            self.selected.clear();
        } else {
            self.selected = filtered_ids.into_iter().map(str::to_string).collect();
        }
    }

    /// Checked when every filtered id is selected (and there is at least
    /// one), indeterminate when only some are.
    pub fn state<'a, I>(&self, filtered_ids: I) -> SelectAllState
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut total = 0;
        let mut hits = 0;
        for id in filtered_ids {
            total += 1;
            if self.selected.contains(id) {
                hits += 1;
            }
        }

        if total > 0 && hits == total {
            SelectAllState::Checked
        } else if hits > 0 {
            SelectAllState::Indeterminate
        } else {
            SelectAllState::Unchecked
        }
    }

    /// Drop ids that no longer belong to any row.
    pub fn retain_known(&mut self, known: &HashSet<&str>) {
        self.selected.retain(|id| known.contains(id.as_str()));
    }
}
