//! Table orchestrator.

use std::sync::Arc;

use serde::Serialize;

use super::BulkAction;
use super::Column;
use super::FilterDescriptor;
use super::FilterValues;
use super::HeaderState;
use super::PageItem;
use super::Pagination;
use super::Selection;
use super::SortDirection;
use super::SortState;
use super::TableRow;

/// Extracts a row identity. The second argument is the row's index in the
/// fetched data, used when the row has no `id`.
pub type KeyFn<R> = Arc<dyn Fn(&R, usize) -> String + Send + Sync>;

/// Snapshot of everything a page needs to (re)fetch its data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQuery {
    pub filters: FilterValues,
    pub sort_key: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub page: u32,
    pub page_size: u32,
}

impl TableQuery {
    /// URL query string: active filters, then `sort`/`order`, then paging.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        let filters = self.filters.to_query_string();
        if !filters.is_empty() {
            parts.push(filters);
        }
        if let (Some(key), Some(direction)) = (&self.sort_key, self.sort_direction) {
            parts.push(format!("sort={}", urlencoding::encode(key)));
            parts.push(format!("order={}", direction.as_str()));
        }
        parts.push(format!("page={}", self.page));
        parts.push(format!("pageSize={}", self.page_size));
        parts.join("&")
    }
}

/// Composes filtering, sorting, pagination and selection over an
/// in-memory set of rows.
///
/// Rows go through filter predicates, then the sort comparator, then the
/// pagination slice. Every state change that alters which rows are
/// visible clears the selection and marks the table dirty, so the owning
/// page knows to refetch (see [`take_refetch`](Self::take_refetch)).
///
/// # Example
///
/// ```
/// use boudoir_lib::model::Record;
/// use boudoir_lib::table::{Column, DataTable, FilterDescriptor};
///
/// let mut table = DataTable::new(vec![
///     Column::new("title", "Titre").sortable(),
///     Column::new("price", "Prix").sortable(),
/// ])
/// .with_filters(vec![FilterDescriptor::text("title", "Titre")])
/// .with_page_size(2);
///
/// table.set_rows(vec![
///     Record::new().set("id", "1").set("title", "Robe").set("price", 30i64),
///     Record::new().set("id", "2").set("title", "Jupe").set("price", 15i64),
///     Record::new().set("id", "3").set("title", "Robe longue").set("price", 45i64),
/// ]);
///
/// table.set_filter("title", "robe");
/// assert_eq!(table.pagination().total_items(), 2);
///
/// table.handle_sort("price");
/// table.handle_sort("price");
/// let titles: Vec<_> = table.visible_rows().iter().map(|r| r.get_str("title")).collect();
/// assert_eq!(titles, vec![Some("Robe longue"), Some("Robe")]);
/// ```
pub struct DataTable<R: TableRow> {
    columns: Vec<Column<R>>,
    filter_descriptors: Vec<FilterDescriptor>,
    bulk_actions: Vec<BulkAction<R>>,
    rows: Vec<R>,
    /// Indices into `rows` after filtering and sorting.
    view: Vec<usize>,
    filters: FilterValues,
    sort: SortState,
    pagination: Pagination,
    selection: Selection,
    selectable: bool,
    key_fn: Option<KeyFn<R>>,
    dirty: bool,
}

impl<R: TableRow> DataTable<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        Self {
            columns,
            filter_descriptors: Vec::new(),
            bulk_actions: Vec::new(),
            rows: Vec::new(),
            view: Vec::new(),
            filters: FilterValues::new(),
            sort: SortState::default(),
            pagination: Pagination::default(),
            selection: Selection::new(),
            selectable: false,
            key_fn: None,
            dirty: true,
        }
    }

    pub fn with_filters(mut self, descriptors: Vec<FilterDescriptor>) -> Self {
        self.filter_descriptors = descriptors;
        self.recompute();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.pagination.set_page_size(page_size);
        self.recompute();
        self
    }

    /// Enables row selection and the given bulk actions.
    pub fn selectable(mut self, actions: Vec<BulkAction<R>>) -> Self {
        self.selectable = true;
        self.bulk_actions = actions;
        self
    }

    /// Overrides the row identity (defaults to the `id` field, then the index).
    pub fn with_key(mut self, key_fn: impl Fn(&R, usize) -> String + Send + Sync + 'static) -> Self {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn filter_descriptors(&self) -> &[FilterDescriptor] {
        &self.filter_descriptors
    }

    pub fn bulk_actions(&self) -> &[BulkAction<R>] {
        &self.bulk_actions
    }

    pub fn filters(&self) -> &FilterValues {
        &self.filters
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// All fetched rows, unfiltered.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn key_at(&self, index: usize) -> String {
        let row = &self.rows[index];
        match &self.key_fn {
            Some(key_fn) => key_fn(row, index),
            None => row.row_id().unwrap_or_else(|| index.to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Replaces the data with a freshly fetched snapshot.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.selection.clear();
        self.recompute();
    }

    /// Applies an optimistic patch to one row after a successful remote write.
    pub fn patch_row(&mut self, id: &str, patch: impl FnOnce(&mut R)) -> bool {
        let Some(index) = (0..self.rows.len()).find(|&i| self.key_at(i) == id) else {
            return false;
        };
        patch(&mut self.rows[index]);
        self.recompute();
        true
    }

    /// Removes one row after a successful remote delete.
    pub fn remove_row(&mut self, id: &str) -> Option<R> {
        let index = (0..self.rows.len()).find(|&i| self.key_at(i) == id)?;
        let row = self.rows.remove(index);
        self.recompute();
        Some(row)
    }

    fn recompute(&mut self) {
        let mut view: Vec<usize> = (0..self.rows.len())
            .filter(|&i| {
                let row = &self.rows[i];
                self.filter_descriptors
                    .iter()
                    .all(|d| d.matches(&self.filters, &row.field(&d.field)))
            })
            .collect();

        if let Some((key, direction)) = self.sort.get() {
            view.sort_by(|&a, &b| {
                super::compare_values(&self.rows[a].field(key), &self.rows[b].field(key), direction)
            });
        }

        self.view = view;
        self.pagination.set_total_items(self.view.len() as u64);
        let page_ids = self.page_ids();
        self.selection.retain_page(&page_ids);
    }

    fn touch(&mut self) {
        self.selection.clear();
        self.dirty = true;
    }

    // -------------------------------------------------------------------------
    // Derived rows
    // -------------------------------------------------------------------------

    /// Rows of the current page, filtered and sorted.
    pub fn visible_rows(&self) -> Vec<&R> {
        self.view[self.pagination.range()]
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Identifiers of the current page's rows.
    pub fn page_ids(&self) -> Vec<String> {
        self.view[self.pagination.range()]
            .iter()
            .map(|&i| self.key_at(i))
            .collect()
    }

    /// All filtered and sorted rows, across pages.
    pub fn processed_rows(&self) -> Vec<&R> {
        self.view.iter().map(|&i| &self.rows[i]).collect()
    }

    /// Rendered cells of the current page, one `Vec` per row.
    pub fn rendered_page(&self) -> Vec<Vec<String>> {
        self.visible_rows()
            .into_iter()
            .map(|row| self.columns.iter().map(|c| c.cell(row)).collect())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// Sets one filter value and returns to page 1.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<super::FilterValue>) {
        self.filters.set(key, value);
        self.filters_changed();
    }

    /// Replaces every filter value at once.
    pub fn set_filters(&mut self, values: FilterValues) {
        self.filters.replace(values);
        self.filters_changed();
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.clear(key);
        self.filters_changed();
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear_all();
        self.filters_changed();
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count()
    }

    pub fn filter_chips(&self) -> Vec<super::FilterChip> {
        self.filters.chips(&self.filter_descriptors)
    }

    fn filters_changed(&mut self) {
        self.pagination.reset();
        self.touch();
        self.recompute();
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Cycles the sort of a sortable column. Unknown or unsortable keys are ignored.
    pub fn handle_sort(&mut self, key: &str) {
        let sortable = self.columns.iter().any(|c| c.key == key && c.sortable);
        if !sortable {
            return;
        }
        self.sort.handle_sort(key);
        self.touch();
        self.recompute();
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Moves to page `n`; a no-op when out of range or loading.
    pub fn set_page(&mut self, n: u32) -> bool {
        if n == self.pagination.current_page() {
            return false;
        }
        let changed = self.pagination.set_page(n);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn set_page_size(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        self.pagination.set_page_size(n);
        self.touch();
        self.recompute();
    }

    pub fn page_window(&self) -> Vec<PageItem> {
        self.pagination.window()
    }

    /// Marks a fetch as in flight; page changes are ignored meanwhile.
    pub fn set_loading(&mut self, loading: bool) {
        self.pagination.set_loading(loading);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn toggle_row(&mut self, id: &str) -> bool {
        if !self.selectable || !self.page_ids().iter().any(|p| p == id) {
            return false;
        }
        self.selection.toggle(id)
    }

    /// Header checkbox click, scoped to the current page.
    pub fn toggle_all(&mut self) {
        if self.selectable {
            let page_ids = self.page_ids();
            self.selection.toggle_all(&page_ids);
        }
    }

    pub fn header_state(&self) -> HeaderState {
        self.selection.header_state(&self.page_ids())
    }

    /// Selected rows, materialized in display order.
    pub fn selected_rows(&self) -> Vec<R> {
        self.view[self.pagination.range()]
            .iter()
            .filter(|&&i| self.selection.is_selected(&self.key_at(i)))
            .map(|&i| self.rows[i].clone())
            .collect()
    }

    /// Whether the bulk action `id` can run on the current selection.
    pub fn is_bulk_enabled(&self, id: &str) -> bool {
        let rows = self.selected_rows();
        self.bulk_actions
            .iter()
            .find(|a| a.id == id)
            .is_some_and(|a| !a.is_disabled(&rows))
    }

    /// Hands the selected rows to `handler` if the action is enabled.
    pub fn run_bulk<T>(&self, id: &str, handler: impl FnOnce(Vec<R>) -> T) -> Option<T> {
        let rows = self.selected_rows();
        let action = self.bulk_actions.iter().find(|a| a.id == id)?;
        if action.is_disabled(&rows) {
            return None;
        }
        Some(handler(rows))
    }

    // -------------------------------------------------------------------------
    // Refresh
    // -------------------------------------------------------------------------

    /// Current query, for the page's fetch call.
    pub fn query(&self) -> TableQuery {
        let (sort_key, sort_direction) = match self.sort.get() {
            Some((k, d)) => (Some(k.to_string()), Some(d)),
            None => (None, None),
        };
        TableQuery {
            filters: self.filters.clone(),
            sort_key,
            sort_direction,
            page: self.pagination.current_page(),
            page_size: self.pagination.page_size(),
        }
    }

    /// Returns the query to fetch if state changed since the last call.
    pub fn take_refetch(&mut self) -> Option<TableQuery> {
        if std::mem::take(&mut self.dirty) {
            Some(self.query())
        } else {
            None
        }
    }

    /// Forces the next [`take_refetch`](Self::take_refetch) to return a query.
    pub fn refresh(&mut self) {
        self.dirty = true;
    }
}

impl<R: TableRow> std::fmt::Debug for DataTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("visible", &self.view.len())
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("pagination", &self.pagination)
            .finish()
    }
}
