//! Batched CSV reader → `Table`.
//!
//! The header row names the columns. Column types are inferred from the
//! first `infer_rows` records, which are buffered and replayed, so reading
//! only the schema never scans past the sample. A reader built with a
//! known schema skips inference and decodes every cell against it.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv as csv_crate;
use tabscan_core::schema::{DataType, Field, Schema};
use tabscan_core::types::{Column, Table};

use crate::error::{Error, Result};
use crate::infer::{infer_text, merge, parse_text};
use crate::readers::MAX_PREALLOC_ROWS;

pub struct CsvReader<R: Read> {
    records: csv_crate::StringRecordsIntoIter<R>,
    sample: VecDeque<csv_crate::StringRecord>,
    schema: Schema,
}

impl CsvReader<File> {
    pub fn from_path(path: &Path, infer_rows: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, infer_rows)
    }

    pub fn from_path_with_schema(path: &Path, schema: Schema) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader_with_schema(file, schema)
    }
}

impl<R: Read> CsvReader<R> {
    pub fn from_reader(reader: R, infer_rows: usize) -> Result<Self> {
        let mut rdr = builder().from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();

        let mut records = rdr.into_records();
        let mut sample = VecDeque::new();
        while sample.len() < infer_rows {
            match records.next() {
                Some(rec) => sample.push_back(rec?),
                None => break,
            }
        }

        let mut types = vec![DataType::Null; headers.len()];
        for rec in &sample {
            for (ty, cell) in types.iter_mut().zip(rec.iter()) {
                *ty = merge(*ty, infer_text(cell));
            }
        }

        let schema = Schema::new(
            headers
                .into_iter()
                .zip(types)
                .map(|(name, ty)| {
                    // A column with no values in the sample reads as text.
                    let ty = if ty == DataType::Null { DataType::Utf8 } else { ty };
                    Field::new(name, ty, true)
                })
                .collect(),
        );

        Ok(Self {
            records,
            sample,
            schema,
        })
    }

    /// Decode against `schema` instead of inferring one. The header must
    /// name the same columns in the same order.
    pub fn from_reader_with_schema(reader: R, schema: Schema) -> Result<Self> {
        let mut rdr = builder().from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        if headers != schema.names() {
            return Err(Error::Schema(format!(
                "header {headers:?} does not match expected columns {:?}",
                schema.names()
            )));
        }
        Ok(Self {
            records: rdr.into_records(),
            sample: VecDeque::new(),
            schema,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read up to `limit_rows` rows. `None` once the input is exhausted.
    pub fn next_batch(&mut self, limit_rows: usize) -> Result<Option<Table>> {
        let mut cols: Vec<Column> = self
            .schema
            .fields
            .iter()
            .map(|f| {
                Column::new(f.name.clone(), Vec::with_capacity(limit_rows.min(MAX_PREALLOC_ROWS)))
            })
            .collect();

        let mut read_rows = 0usize;
        while read_rows < limit_rows {
            let rec = match self.sample.pop_front() {
                Some(rec) => rec,
                None => match self.records.next() {
                    Some(rec) => rec?,
                    None => break,
                },
            };
            // Flexible CSV may have short rows; missing cells are null.
            for (i, (col, field)) in cols.iter_mut().zip(&self.schema.fields).enumerate() {
                let cell = rec.get(i).unwrap_or("");
                col.values.push(parse_text(cell, field.data_type));
            }
            read_rows += 1;
        }

        if read_rows == 0 {
            return Ok(None);
        }
        Ok(Some(Table { columns: cols }))
    }

    /// Drain the reader into one table. An input with only a header yields
    /// a zero-row table with the header's columns.
    pub fn read_all(mut self, batch_rows: usize) -> Result<Table> {
        let mut out = Table::empty(&self.schema);
        while let Some(batch) = self.next_batch(batch_rows.max(1))? {
            for (dst, src) in out.columns.iter_mut().zip(batch.columns) {
                dst.values.extend(src.values);
            }
        }
        Ok(out)
    }
}

fn builder() -> csv_crate::ReaderBuilder {
    let mut b = csv_crate::ReaderBuilder::new();
    b.has_headers(true).flexible(true);
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabscan_core::types::Scalar;

    #[test]
    fn infers_and_decodes() {
        let data = "id,score,flag,name\n1,2.5,true,a\n2,,false,\n3,x,true,c\n";
        let rdr = CsvReader::from_reader(data.as_bytes(), 2).unwrap();
        let types: Vec<_> = rdr.schema().fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::Float64, DataType::Boolean, DataType::Utf8]
        );

        let t = rdr.read_all(2).unwrap();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.columns[1].values, vec![Scalar::F64(2.5), Scalar::Null, Scalar::Null]);
        assert_eq!(t.columns[3].values[1], Scalar::Null);
    }

    #[test]
    fn header_only() {
        let t = CsvReader::from_reader("a,b\n".as_bytes(), 10)
            .unwrap()
            .read_all(10)
            .unwrap();
        assert_eq!(t.column_names(), vec!["a", "b"]);
        assert_eq!(t.num_rows(), 0);
    }

    #[test]
    fn known_schema_skips_inference() {
        let schema = CsvReader::from_reader("k\n1\n".as_bytes(), 10)
            .unwrap()
            .schema()
            .clone();
        let t = CsvReader::from_reader_with_schema("k\nx\n2\n".as_bytes(), schema)
            .unwrap()
            .read_all(10)
            .unwrap();
        assert_eq!(t.columns[0].values, vec![Scalar::Null, Scalar::I64(2)]);
    }

    #[test]
    fn known_schema_rejects_other_header() {
        let schema = Schema::new(vec![Field::new("k", DataType::Int64, true)]);
        let err = CsvReader::from_reader_with_schema("j\n1\n".as_bytes(), schema)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn huge_batch_limit() {
        let t = CsvReader::from_reader("a\n1\n2\n".as_bytes(), 10)
            .unwrap()
            .read_all(usize::MAX)
            .unwrap();
        assert_eq!(t.num_rows(), 2);
    }
}
