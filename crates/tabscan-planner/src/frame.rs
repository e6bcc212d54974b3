//! Deferred frames.
//!
//! A [`DeferredFrame`] pairs an engine with a [`ScanPlan`]. It holds no rows
//! and is never mutated: projection returns a new frame, and materializing
//! leaves the frame usable. Clones share the engine.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use tabscan_core::engine::ScanEngine;
use tabscan_core::error::Result;
use tabscan_core::hash::Hash256;
use tabscan_core::options::ScanOptions;
use tabscan_core::plan::ScanPlan;
use tabscan_core::schema::Schema;
use tabscan_core::source::SourceRef;
use tabscan_core::types::Table;

use crate::select::{select_columns, ColumnSelector};

#[derive(Clone)]
pub struct DeferredFrame {
    engine: Arc<dyn ScanEngine>,
    plan: ScanPlan,
}

/// Build a deferred scan of `source`. No bytes are read.
///
/// Option combinations the engine can reject up front (unknown format
/// hint, a subgroup on a format without regions) fail here.
pub fn build_scan(
    engine: Arc<dyn ScanEngine>,
    source: &SourceRef,
    subgroup: Option<&str>,
    format: Option<&str>,
) -> Result<DeferredFrame> {
    let options = ScanOptions::new(subgroup.map(str::to_string), format.map(str::to_string));
    DeferredFrame::new(engine, source, &options)
}

impl DeferredFrame {
    pub fn new(engine: Arc<dyn ScanEngine>, source: &SourceRef, options: &ScanOptions) -> Result<Self> {
        let plan = engine.build_scan_plan(source, options)?;
        debug!(engine = engine.name(), %source, "built deferred frame");
        Ok(Self { engine, plan })
    }

    /// Same engine, different plan.
    pub(crate) fn with_plan(&self, plan: ScanPlan) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            plan,
        }
    }

    pub fn engine(&self) -> &Arc<dyn ScanEngine> {
        &self.engine
    }

    pub fn plan(&self) -> &ScanPlan {
        &self.plan
    }

    pub fn source(&self) -> &SourceRef {
        &self.plan.source
    }

    pub fn options(&self) -> &ScanOptions {
        &self.plan.options
    }

    /// Ordered schema as reported by the engine; rows are not materialized.
    pub fn schema(&self) -> Result<Schema> {
        self.engine.schema_of(&self.plan)
    }

    /// Ordered column names of [`Self::schema`].
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.schema()?.names())
    }

    pub fn fingerprint(&self) -> Result<Hash256> {
        self.plan.fingerprint()
    }

    /// See [`select_columns`].
    pub fn select(&self, selector: &ColumnSelector) -> Result<DeferredFrame> {
        select_columns(self, Some(selector))
    }

    /// See [`crate::materialize::materialize`].
    pub fn collect(&self) -> Result<Table> {
        crate::materialize::materialize(self)
    }
}

impl PartialEq for DeferredFrame {
    fn eq(&self, other: &Self) -> bool {
        self.engine.name() == other.engine.name() && self.plan == other.plan
    }
}

impl fmt::Debug for DeferredFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFrame")
            .field("engine", &self.engine.name())
            .field("plan", &self.plan)
            .finish()
    }
}
