//! Column projection.
//!
//! Selectors are resolved to names against the frame's current schema
//! exactly once, then handed to the engine as a column subset. Order and
//! duplicates are kept as given.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabscan_core::error::{Error, Result};
use tabscan_core::types::Table;

use crate::frame::DeferredFrame;

/// Zero-based positions or column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    Positions(Vec<usize>),
    Names(Vec<String>),
}

impl ColumnSelector {
    /// Resolve to an ordered name list against `schema` (ordered names).
    ///
    /// Positions past the end fail with `ColumnIndexOutOfRange`; names not in
    /// `schema` fail with `UnknownColumnReference`.
    pub fn resolve(&self, schema: &[String]) -> Result<Vec<String>> {
        match self {
            ColumnSelector::Positions(idxs) => idxs
                .iter()
                .map(|&index| {
                    schema
                        .get(index)
                        .cloned()
                        .ok_or(Error::ColumnIndexOutOfRange {
                            index,
                            len: schema.len(),
                        })
                })
                .collect(),
            ColumnSelector::Names(names) => {
                if let Some(missing) = names.iter().find(|n| !schema.contains(*n)) {
                    return Err(Error::UnknownColumnReference {
                        column: missing.clone(),
                        available: schema.to_vec(),
                    });
                }
                Ok(names.clone())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnSelector::Positions(v) => v.len(),
            ColumnSelector::Names(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<usize>> for ColumnSelector {
    fn from(v: Vec<usize>) -> Self {
        ColumnSelector::Positions(v)
    }
}

impl From<Vec<String>> for ColumnSelector {
    fn from(v: Vec<String>) -> Self {
        ColumnSelector::Names(v)
    }
}

impl From<&[&str]> for ColumnSelector {
    fn from(v: &[&str]) -> Self {
        ColumnSelector::Names(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Narrow `frame` to the selected columns. `None` returns an equal frame.
///
/// The input frame is untouched; on error nothing is returned.
pub fn select_columns(frame: &DeferredFrame, selector: Option<&ColumnSelector>) -> Result<DeferredFrame> {
    let Some(selector) = selector else {
        return Ok(frame.clone());
    };
    let current = frame.columns()?;
    let names = selector.resolve(&current)?;
    debug!(?names, "projecting deferred frame");
    let plan = frame.engine().project(frame.plan(), &names)?;
    Ok(frame.with_plan(plan))
}

/// Apply a selector to an already realized table.
pub fn select_table(table: &Table, selector: &ColumnSelector) -> Result<Table> {
    let names = selector.resolve(&table.column_names())?;
    table.select(&names)
}
