//! Batched NDJSON reader → `Table`.
//!
//! Each line is a JSON document. Without a subgroup the document itself is
//! the row. With a subgroup such as `table/columns`, the reader walks those
//! object keys in every document; the value found there is either one row
//! (an object) or several rows (an array of objects).
//!
//! Columns appear in first-seen key order across the inference sample.
//! Keys first seen after the sample are not part of the schema and are
//! dropped. A reader built with a known schema keeps only that schema's keys.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};
use tabscan_core::schema::{DataType, Field, Schema};
use tabscan_core::types::{Column, Table};

use crate::error::{Error, Result};
use crate::infer::{coerce_json, infer_json, merge};
use crate::readers::MAX_PREALLOC_ROWS;

type Row = Map<String, Value>;

pub struct JsonlReader<R: Read> {
    reader: BufReader<R>,
    subgroup: Vec<String>,
    line_no: usize,
    pending: VecDeque<Row>,
    schema: Schema,
}

impl JsonlReader<File> {
    pub fn from_path(path: &Path, subgroup: &[&str], infer_rows: usize) -> Result<Self> {
        let f = File::open(path)?;
        Self::from_reader(f, subgroup, infer_rows)
    }

    pub fn from_path_with_schema(path: &Path, subgroup: &[&str], schema: Schema) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader_with_schema(f, subgroup, schema))
    }
}

impl<R: Read> JsonlReader<R> {
    fn new(reader: R, subgroup: &[&str], schema: Schema) -> Self {
        Self {
            reader: BufReader::new(reader),
            subgroup: subgroup.iter().map(|s| s.to_string()).collect(),
            line_no: 0,
            pending: VecDeque::new(),
            schema,
        }
    }

    /// Decode against `schema` instead of inferring one. Nothing is read
    /// until the first batch.
    pub fn from_reader_with_schema(reader: R, subgroup: &[&str], schema: Schema) -> Self {
        Self::new(reader, subgroup, schema)
    }

    pub fn from_reader(reader: R, subgroup: &[&str], infer_rows: usize) -> Result<Self> {
        let mut this = Self::new(reader, subgroup, Schema::default());

        while this.pending.len() < infer_rows {
            if !this.fill()? {
                break;
            }
        }

        let mut fields: Vec<Field> = Vec::new();
        for row in this.pending.iter().take(infer_rows) {
            for (key, value) in row {
                let ty = infer_json(value);
                match fields.iter_mut().find(|f| &f.name == key) {
                    Some(f) => f.data_type = merge(f.data_type, ty),
                    None => fields.push(Field::new(key.clone(), ty, true)),
                }
            }
        }
        for f in &mut fields {
            if f.data_type == DataType::Null {
                f.data_type = DataType::Utf8;
            }
        }
        this.schema = Schema::new(fields);
        Ok(this)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read the next non-blank line into `pending`. `false` at end of input.
    fn fill(&mut self) -> Result<bool> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let doc: Value = serde_json::from_str(&line)?;
            let rows = self.rows_of(doc)?;
            self.pending.extend(rows);
            return Ok(true);
        }
    }

    fn rows_of(&self, doc: Value) -> Result<Vec<Row>> {
        let mut target = doc;
        for key in &self.subgroup {
            target = match target {
                Value::Object(mut map) => map.remove(key).ok_or_else(|| {
                    Error::Subgroup(format!(
                        "line {}: key '{key}' of subgroup '{}' not found",
                        self.line_no,
                        self.subgroup.join("/")
                    ))
                })?,
                _ => {
                    return Err(Error::Subgroup(format!(
                        "line {}: cannot descend into '{key}' of subgroup '{}': not an object",
                        self.line_no,
                        self.subgroup.join("/")
                    )))
                }
            };
        }

        match target {
            Value::Object(map) => Ok(vec![map]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err(Error::Schema(format!(
                        "line {}: array element is not an object",
                        self.line_no
                    ))),
                })
                .collect(),
            _ => Err(Error::Schema(format!(
                "line {}: expected a JSON object per record",
                self.line_no
            ))),
        }
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
            // A document may contribute zero rows (an empty array).
            while self.pending.is_empty() {
                if !self.fill()? {
                    break;
                }
            }
            let Some(row) = self.pending.pop_front() else {
                break;
            };
            for (col, field) in cols.iter_mut().zip(&self.schema.fields) {
                let v = row.get(&field.name).unwrap_or(&Value::Null);
                col.values.push(coerce_json(v, field.data_type));
            }
            read_rows += 1;
        }

        if read_rows == 0 {
            return Ok(None);
        }
        Ok(Some(Table { columns: cols }))
    }

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

#[cfg(test)]
mod tests {
    use super::*;
    use tabscan_core::types::Scalar;

    #[test]
    fn first_seen_key_order() {
        let data = "{\"b\":1,\"a\":\"x\"}\n\n{\"c\":2.5,\"b\":3}\n";
        let rdr = JsonlReader::from_reader(data.as_bytes(), &[], 10).unwrap();
        assert_eq!(rdr.schema().names(), vec!["b", "a", "c"]);
        let t = rdr.read_all(1).unwrap();
        assert_eq!(t.columns[0].values, vec![Scalar::I64(1), Scalar::I64(3)]);
        assert_eq!(t.columns[2].values, vec![Scalar::Null, Scalar::F64(2.5)]);
    }

    #[test]
    fn subgroup_rows() {
        let data = r#"{"table":{"columns":[{"x":1},{"x":2}]}}
{"table":{"columns":{"x":3}}}
"#;
        let t = JsonlReader::from_reader(data.as_bytes(), &["table", "columns"], 10)
            .unwrap()
            .read_all(10)
            .unwrap();
        assert_eq!(
            t.columns[0].values,
            vec![Scalar::I64(1), Scalar::I64(2), Scalar::I64(3)]
        );
    }

    #[test]
    fn missing_subgroup() {
        let data = "{\"other\":{}}\n";
        let err = JsonlReader::from_reader(data.as_bytes(), &["table"], 10)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Subgroup(_)));
    }

    #[test]
    fn empty_subgroup_arrays_do_not_end_input() {
        let data = r#"{"t":[{"x":1}]}
{"t":[]}
{"t":[]}
{"t":[{"x":4}]}
"#;
        let t = JsonlReader::from_reader(data.as_bytes(), &["t"], 1)
            .unwrap()
            .read_all(100)
            .unwrap();
        assert_eq!(t.columns[0].values, vec![Scalar::I64(1), Scalar::I64(4)]);
    }

    #[test]
    fn known_schema_drops_other_keys() {
        let schema = Schema::new(vec![Field::new("k", DataType::Int64, true)]);
        let data = "{\"k\":\"x\",\"z\":1}\n{\"k\":2}\n";
        let t = JsonlReader::from_reader_with_schema(data.as_bytes(), &[], schema)
            .read_all(usize::MAX)
            .unwrap();
        assert_eq!(t.column_names(), vec!["k"]);
        assert_eq!(t.columns[0].values, vec![Scalar::Null, Scalar::I64(2)]);
    }
}
