//! Parquet reader with column projection (enabled with `--features parquet`).

use std::fs::File;
use std::path::Path;

use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use tabscan_core::schema::Schema;
use tabscan_core::types::Table;

use crate::arrow_convert::{arrow_to_schema, record_batch_to_table};
use crate::error::{Error, Result};

pub struct ParquetReader {
    reader: ParquetRecordBatchReader,
    schema: Schema,
}

/// Schema from the file footer only; no row groups are decoded.
pub fn read_parquet_schema(path: &Path) -> Result<Schema> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    arrow_to_schema(builder.schema())
}

impl ParquetReader {
    /// Open `path`, reading only `projection` columns when given.
    ///
    /// Output columns follow file order; callers reorder as needed.
    pub fn from_path(
        path: &Path,
        projection: Option<&[String]>,
        batch_size: usize,
    ) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let full = arrow_to_schema(builder.schema())?;

        let (builder, schema) = match projection {
            Some(cols) => {
                let mut indices = cols
                    .iter()
                    .map(|name| {
                        full.index_of(name).ok_or_else(|| {
                            Error::Schema(format!("column '{name}' not found in Parquet schema"))
                        })
                    })
                    .collect::<Result<Vec<usize>>>()?;
                indices.sort_unstable();
                indices.dedup();
                let mask =
                    ProjectionMask::roots(builder.parquet_schema(), indices.iter().copied());
                let schema = Schema::new(
                    indices
                        .iter()
                        .filter_map(|&i| full.field(i).cloned())
                        .collect(),
                );
                (builder.with_projection(mask), schema)
            }
            None => (builder, full),
        };

        let reader = builder.with_batch_size(batch_size.max(1)).build()?;
        Ok(Self { reader, schema })
    }

    /// Schema of the decoded columns (after projection).
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read the next batch. `None` when all rows have been read.
    pub fn next_batch(&mut self) -> Result<Option<Table>> {
        match self.reader.next().transpose()? {
            Some(batch) => Ok(Some(record_batch_to_table(&batch)?)),
            None => Ok(None),
        }
    }

    pub fn read_all(mut self) -> Result<Table> {
        let mut out = Table::empty(&self.schema);
        while let Some(batch) = self.next_batch()? {
            for (dst, src) in out.columns.iter_mut().zip(batch.columns) {
                dst.values.extend(src.values);
            }
        }
        Ok(out)
    }
}
