//! Table state composition
//!
//! UI-agnostic state behind every dashboard listing: a [`DataTable`]
//! composes [`FilterValues`], [`SortState`], [`Pagination`] and
//! [`Selection`] over rows fetched from the API.
//!
//! # Shared Types
//!
//! - [`TableRow`] - Anything that exposes named field values
//! - [`Column`] - Declarative column descriptor with optional renderer
//! - [`FilterDescriptor`] - Declarative filter control bound to a field

mod column;
mod data_table;
mod export;
mod filter;
mod pagination;
mod selection;
mod sort;

pub use column::Align;
pub use column::CellRenderer;
pub use column::Column;
pub use data_table::DataTable;
pub use data_table::KeyFn;
pub use data_table::TableQuery;
pub use filter::ALL;
pub use filter::FROM_SUFFIX;
pub use filter::FilterChip;
pub use filter::FilterDescriptor;
pub use filter::FilterKind;
pub use filter::FilterValue;
pub use filter::FilterValues;
pub use filter::TO_SUFFIX;
pub use pagination::PageItem;
pub use pagination::Pagination;
pub use selection::BulkAction;
pub use selection::DisabledFn;
pub use selection::HeaderState;
pub use selection::Selection;
pub use sort::SortDirection;
pub use sort::SortState;
pub use sort::compare_values;

use crate::model::Value;

/// A row the table engine can read.
///
/// Rows are immutable snapshots; the only mutation goes through
/// [`DataTable::patch_row`].
pub trait TableRow: Clone {
    /// Value of the named field, `Value::Null` when absent.
    fn field(&self, key: &str) -> Value;

    /// Default identity: the `id` field, if present.
    fn row_id(&self) -> Option<String> {
        let id = self.field("id");
        if id.is_null() {
            None
        } else {
            Some(id.to_display_string())
        }
    }
}
