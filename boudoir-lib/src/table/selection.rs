//! Row selection for bulk actions.

use std::collections::HashSet;
use std::sync::Arc;

/// Tri-state of the header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    None,
    Indeterminate,
    All,
}

/// Tracks selected rows by their identifiers.
///
/// The selection is scoped to the current page: "select all" selects
/// exactly the ids it is given, dropping anything selected elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id`. Returns `true` if it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Replaces the selection with `page_ids`.
    pub fn select_all<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a str>) {
        self.selected = page_ids.into_iter().map(str::to_string).collect();
    }

    /// Header checkbox click: clears when everything is selected, else selects the page.
    pub fn toggle_all(&mut self, page_ids: &[String]) {
        if self.header_state(page_ids) == HeaderState::All {
            self.clear();
        } else {
            self.select_all(page_ids.iter().map(String::as_str));
        }
    }

    /// Clears all selection. Returns the ids that were deselected.
    pub fn clear(&mut self) -> Vec<String> {
        self.selected.drain().collect()
    }

    /// Drops ids that are not in `page_ids`.
    pub fn retain_page(&mut self, page_ids: &[String]) {
        self.selected.retain(|id| page_ids.contains(id));
    }

    pub fn header_state(&self, page_ids: &[String]) -> HeaderState {
        let selected = page_ids.iter().filter(|id| self.is_selected(id)).count();
        if selected == 0 {
            HeaderState::None
        } else if selected == page_ids.len() {
            HeaderState::All
        } else {
            HeaderState::Indeterminate
        }
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

/// Predicate disabling a bulk action for a given selection.
pub type DisabledFn<R> = Arc<dyn Fn(&[R]) -> bool + Send + Sync>;

/// An action applied to all selected rows ("Approuver", "Supprimer", ...).
pub struct BulkAction<R> {
    pub id: String,
    pub label: String,
    disabled: Option<DisabledFn<R>>,
}

impl<R> BulkAction<R> {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            disabled: None,
        }
    }

    /// Disables the action whenever `predicate` holds for the selected rows.
    pub fn disabled_when(mut self, predicate: impl Fn(&[R]) -> bool + Send + Sync + 'static) -> Self {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    /// Disabled for an empty selection or when the predicate holds.
    pub fn is_disabled(&self, rows: &[R]) -> bool {
        rows.is_empty() || self.disabled.as_ref().is_some_and(|f| f(rows))
    }
}

impl<R> Clone for BulkAction<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            disabled: self.disabled.clone(),
        }
    }
}

impl<R> std::fmt::Debug for BulkAction<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}
