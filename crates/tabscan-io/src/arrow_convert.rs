//! Arrow → `Table` conversion at the Parquet boundary.

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type,
    UInt64Type, UInt8Type,
};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{DataType as ArrowDataType, Schema as ArrowSchema};
use tabscan_core::schema::{DataType, Field, Schema};
use tabscan_core::types::{Column, Scalar, Table};

use crate::error::{Error, Result};

/// Convert an Arrow RecordBatch to a Table.
pub fn record_batch_to_table(batch: &RecordBatch) -> Result<Table> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(schema.fields().len());

    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let mut values = Vec::with_capacity(batch.num_rows());
        for row_idx in 0..batch.num_rows() {
            values.push(if array.is_null(row_idx) {
                Scalar::Null
            } else {
                arrow_value_to_scalar(array, row_idx)?
            });
        }
        columns.push(Column::new(field.name().clone(), values));
    }

    Ok(Table { columns })
}

/// Map an Arrow schema onto tabscan types.
pub fn arrow_to_schema(schema: &ArrowSchema) -> Result<Schema> {
    let fields = schema
        .fields()
        .iter()
        .map(|f| {
            Ok(Field::new(
                f.name().clone(),
                arrow_to_data_type(f.data_type())?,
                f.is_nullable(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

pub fn arrow_to_data_type(dtype: &ArrowDataType) -> Result<DataType> {
    Ok(match dtype {
        ArrowDataType::Boolean => DataType::Boolean,
        ArrowDataType::Int8 | ArrowDataType::Int16 | ArrowDataType::Int32 => DataType::Int32,
        ArrowDataType::UInt8 | ArrowDataType::UInt16 => DataType::Int32,
        ArrowDataType::Int64 | ArrowDataType::UInt32 | ArrowDataType::UInt64 => DataType::Int64,
        ArrowDataType::Float32 => DataType::Float32,
        ArrowDataType::Float64 => DataType::Float64,
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => DataType::Utf8,
        ArrowDataType::Binary | ArrowDataType::LargeBinary => DataType::Binary,
        ArrowDataType::Null => DataType::Null,
        other => {
            return Err(Error::Schema(format!(
                "unsupported Arrow data type: {other:?}"
            )))
        }
    })
}

/// Convert a single non-null Arrow array value to a Scalar.
fn arrow_value_to_scalar(array: &ArrayRef, row_idx: usize) -> Result<Scalar> {
    Ok(match array.data_type() {
        ArrowDataType::Boolean => Scalar::Bool(array.as_boolean().value(row_idx)),
        ArrowDataType::Int8 => Scalar::I32(array.as_primitive::<Int8Type>().value(row_idx) as i32),
        ArrowDataType::Int16 => Scalar::I32(array.as_primitive::<Int16Type>().value(row_idx) as i32),
        ArrowDataType::Int32 => Scalar::I32(array.as_primitive::<Int32Type>().value(row_idx)),
        ArrowDataType::UInt8 => Scalar::I32(array.as_primitive::<UInt8Type>().value(row_idx) as i32),
        ArrowDataType::UInt16 => {
            Scalar::I32(array.as_primitive::<UInt16Type>().value(row_idx) as i32)
        }
        ArrowDataType::Int64 => Scalar::I64(array.as_primitive::<Int64Type>().value(row_idx)),
        ArrowDataType::UInt32 => {
            Scalar::I64(array.as_primitive::<UInt32Type>().value(row_idx) as i64)
        }
        ArrowDataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(row_idx);
            Scalar::I64(i64::try_from(v).map_err(|_| {
                Error::Schema(format!("UInt64 value {v} does not fit Int64"))
            })?)
        }
        ArrowDataType::Float32 => Scalar::F32(array.as_primitive::<Float32Type>().value(row_idx)),
        ArrowDataType::Float64 => Scalar::F64(array.as_primitive::<Float64Type>().value(row_idx)),
        ArrowDataType::Utf8 => Scalar::Str(array.as_string::<i32>().value(row_idx).to_string()),
        ArrowDataType::LargeUtf8 => {
            Scalar::Str(array.as_string::<i64>().value(row_idx).to_string())
        }
        ArrowDataType::Binary => Scalar::Bin(array.as_binary::<i32>().value(row_idx).to_vec()),
        ArrowDataType::LargeBinary => {
            Scalar::Bin(array.as_binary::<i64>().value(row_idx).to_vec())
        }
        ArrowDataType::Null => Scalar::Null,
        other => {
            return Err(Error::Schema(format!(
                "unsupported Arrow data type: {other:?}"
            )))
        }
    })
}
