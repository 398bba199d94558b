//! CSV export of a table's filtered and sorted rows.

use super::DataTable;
use super::TableRow;

impl<R: TableRow> DataTable<R> {
    /// Renders every filtered row (all pages, current sort) as CSV, using
    /// column labels as the header and column renderers for the cells.
    pub fn export_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(self.columns().iter().map(|c| c.label.as_str()))?;
        for row in self.processed_rows() {
            writer.write_record(self.columns().iter().map(|c| c.cell(row)))?;
        }

        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Record;
    use crate::table::Column;
    use crate::table::DataTable;

    #[test]
    fn test_export_covers_all_pages_with_renderers() {
        let mut table = DataTable::new(vec![
            Column::new("title", "Titre"),
            Column::new("price", "Prix").render(|v, _| format!("{} €", v.to_display_string())),
        ])
        .with_page_size(1);
        table.set_rows(vec![
            Record::new().set("id", "1").set("title", "Robe, rouge").set("price", 30i64),
            Record::new().set("id", "2").set("title", "Jupe").set("price", 15i64),
        ]);

        let csv = table.export_csv().unwrap();
        assert_eq!(csv, "Titre,Prix\n\"Robe, rouge\",30 €\nJupe,15 €\n");
    }
}
