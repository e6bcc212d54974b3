//! Materialization: the only step that reads data.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use tabscan_core::engine::ScanEngine;
use tabscan_core::error::Result;
use tabscan_core::source::SourceRef;
use tabscan_core::types::Table;

use crate::frame::{build_scan, DeferredFrame};
use crate::select::{select_columns, ColumnSelector};

/// Execute `frame` on its engine and return the realized table.
///
/// Any failure is reported as `EngineExecution` carrying the engine's
/// message. There is no retry. The frame stays valid and can be
/// materialized again.
pub fn materialize(frame: &DeferredFrame) -> Result<Table> {
    let started = Instant::now();
    let table = frame
        .engine()
        .execute(frame.plan())
        .map_err(|e| e.into_engine_error())?;
    info!(
        engine = frame.engine().name(),
        source = %frame.source(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "materialized frame"
    );
    Ok(table)
}

/// [`build_scan`], then [`select_columns`], then [`materialize`].
pub fn read_eager(
    engine: Arc<dyn ScanEngine>,
    source: &SourceRef,
    columns: Option<&ColumnSelector>,
    subgroup: Option<&str>,
    format: Option<&str>,
) -> Result<Table> {
    let frame = build_scan(engine, source, subgroup, format)?;
    let frame = select_columns(&frame, columns)?;
    materialize(&frame)
}
