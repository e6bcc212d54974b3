//! tabscan: deferred tabular scans.
//!
//! Describe a scan with [`build_scan`], narrow it with [`select_columns`],
//! and read it with [`materialize`] (or do all three with [`read_eager`]).
//! Realized tables take derived columns through
//! [`apply_template_expression`], whose `{column}` templates are parsed by a
//! restricted expression grammar.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabscan::{apply_template_expression, read_eager, ColumnSelector, FileEngine, SourceRef};
//!
//! let engine = Arc::new(FileEngine::default());
//! let source = SourceRef::from_path("data/orders.csv")?;
//! let cols = ColumnSelector::Names(vec!["price".into(), "qty".into()]);
//! let table = read_eager(engine, &source, Some(&cols), None, None)?;
//! let table = apply_template_expression(&table, "total", "{price} * {qty}")?;
//! # Ok::<(), tabscan::Error>(())
//! ```

pub use tabscan_core::prelude::*;
pub use tabscan_exec::{FileEngine, MemoryEngine};
pub use tabscan_planner::dsl::yaml::{parse_yaml_pipeline, Pipeline, PipelineError, PipelinePlan};
pub use tabscan_io::writers::csv::CsvWriter;
pub use tabscan_planner::select::select_table;
pub use tabscan_planner::{build_scan, materialize, read_eager, select_columns, ColumnSelector, DeferredFrame};
