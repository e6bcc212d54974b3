//! Row-value placeholders and the realized [`Table`].
//!
//! A `Table` is what materialization hands back: named columns of
//! [`Scalar`] values, all of equal length. Engines may decode into Arrow
//! internally but convert at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Field, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Null,
            Scalar::Bool(_) => DataType::Boolean,
            Scalar::I32(_) => DataType::Int32,
            Scalar::I64(_) => DataType::Int64,
            Scalar::F32(_) => DataType::Float32,
            Scalar::F64(_) => DataType::Float64,
            Scalar::Str(_) => DataType::Utf8,
            Scalar::Bin(_) => DataType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::I32(i) => write!(f, "{i}"),
            Scalar::I64(i) => write!(f, "{i}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bin(b) => write!(f, "[binary {} bytes]", b.len()),
        }
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Type of the first non-null value; `Null` for an all-null column.
    pub fn data_type(&self) -> DataType {
        self.values
            .iter()
            .find(|v| !v.is_null())
            .map(Scalar::data_type)
            .unwrap_or(DataType::Null)
    }
}

/// A fully realized, in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking that every column has the same length.
    pub fn try_new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(Error::Evaluation(format!(
                    "column '{}' has {} values but expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Zero-row table with the columns of `schema`.
    pub fn empty(schema: &Schema) -> Self {
        Self {
            columns: schema
                .fields
                .iter()
                .map(|f| Column::new(f.name.clone(), Vec::new()))
                .collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Schema derived from the values currently held.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| {
                    Field::new(
                        c.name.clone(),
                        c.data_type(),
                        c.values.iter().any(Scalar::is_null),
                    )
                })
                .collect(),
        )
    }

    /// Keep exactly `names`, in that order. Duplicate names yield duplicate columns.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .column(name)
                .ok_or_else(|| Error::UnknownColumnReference {
                    column: name.clone(),
                    available: self.column_names(),
                })?;
            out.push(col.clone());
        }
        Ok(Table { columns: out })
    }

    /// Replace the first column named like `column`, or append it at the end.
    pub fn with_column(mut self, column: Column) -> Table {
        match self.columns.iter().position(|c| c.name == column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Append the rows of `other`; both tables must share column names in order.
    pub fn vstack(&mut self, other: Table) -> Result<()> {
        if self.columns.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.column_names() != other.column_names() {
            return Err(Error::EngineExecution(format!(
                "cannot concatenate tables with different columns: {:?} vs {:?}",
                self.column_names(),
                other.column_names()
            )));
        }
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            dst.values.extend(src.values);
        }
        Ok(())
    }
}
