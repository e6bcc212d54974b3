//! CSV writer for realized tables.
//!
//! The header is written once, before the first table. Nulls are empty
//! cells; other values use their `Display` form.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv as csv_crate;
use tabscan_core::types::Table;

use crate::error::{Error, Result};

pub struct CsvWriter<W: Write> {
    wtr: csv_crate::Writer<W>,
    header: Option<Vec<String>>,
}

impl CsvWriter<File> {
    pub fn to_path(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::to_writer(file))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            wtr: csv_crate::Writer::from_writer(writer),
            header: None,
        }
    }

    /// Append `table`. Later tables must have the same column names.
    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        let rows = table.num_rows();
        if let Some(c) = table.columns.iter().find(|c| c.values.len() != rows) {
            return Err(Error::Schema(format!(
                "column '{}' has {} values, expected {rows}",
                c.name,
                c.values.len()
            )));
        }

        let names = table.column_names();
        match &self.header {
            None => {
                self.wtr.write_record(&names)?;
                self.header = Some(names);
            }
            Some(header) if *header != names => {
                return Err(Error::Schema(format!(
                    "table columns {names:?} do not match header {header:?}"
                )));
            }
            Some(_) => {}
        }

        let mut row = Vec::with_capacity(table.num_columns());
        for row_idx in 0..rows {
            row.clear();
            row.extend(
                table
                    .columns
                    .iter()
                    .filter_map(|c| c.values.get(row_idx))
                    .map(|v| v.to_string()),
            );
            self.wtr.write_record(&row)?;
        }
        self.wtr.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabscan_core::types::{Column, Scalar};

    #[test]
    fn writes_nulls_as_empty_cells() {
        let t = Table::try_new(vec![
            Column::new("a", vec![Scalar::I64(1), Scalar::Null]),
            Column::new("b", vec![Scalar::from("x,y"), Scalar::Bool(true)]),
        ])
        .unwrap();
        let mut w = CsvWriter::to_writer(Vec::new());
        w.write_table(&t).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "a,b\n1,\"x,y\"\n,true\n");
    }

    #[test]
    fn ragged_table_is_rejected() {
        let t = Table {
            columns: vec![
                Column::new("a", vec![Scalar::I64(1), Scalar::I64(2)]),
                Column::new("b", vec![Scalar::I64(3)]),
            ],
        };
        let mut w = CsvWriter::to_writer(Vec::new());
        assert!(matches!(w.write_table(&t), Err(Error::Schema(_))));
        assert!(w.into_inner().unwrap().is_empty());
    }
}
