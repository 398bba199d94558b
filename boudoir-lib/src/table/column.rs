//! Column definitions.

use std::sync::Arc;

use super::TableRow;
use crate::model::Value;

/// Horizontal alignment of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Custom cell renderer: receives the cell value and the whole row.
pub type CellRenderer<R> = Arc<dyn Fn(&Value, &R) -> String + Send + Sync>;

/// Declarative column descriptor, owned by the page that builds the table.
///
/// # Example
///
/// ```
/// use boudoir_lib::model::Record;
/// use boudoir_lib::table::{Align, Column};
///
/// let price: Column<Record> = Column::new("price", "Prix")
///     .sortable()
///     .align(Align::Right)
///     .render(|value, _| format!("{} €", value.to_display_string()));
/// ```
pub struct Column<R> {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    pub align: Align,
    render: Option<CellRenderer<R>>,
}

impl<R: TableRow> Column<R> {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            filterable: false,
            align: Align::Left,
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn render(mut self, render: impl Fn(&Value, &R) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Text shown in this column for `row`.
    pub fn cell(&self, row: &R) -> String {
        let value = row.field(&self.key);
        match &self.render {
            Some(render) => render(&value, row),
            None => value.to_display_string(),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            align: self.align,
            render: self.render.clone(),
        }
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("align", &self.align)
            .finish()
    }
}
