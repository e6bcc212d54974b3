//! In-memory scan engine.
//!
//! Tables are registered under a path (and optionally a subgroup) and scanned
//! like files. Every `execute` call is counted, which makes it easy to check
//! that plan building and projection never run a scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::debug;

use tabscan_core::engine::ScanEngine;
use tabscan_core::error::{Error, Result};
use tabscan_core::options::ScanOptions;
use tabscan_core::plan::ScanPlan;
use tabscan_core::schema::Schema;
use tabscan_core::source::{normalize_path, SourceRef};
use tabscan_core::types::Table;

type Key = (PathBuf, Option<String>);

#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: RwLock<HashMap<Key, Table>>,
    executions: AtomicUsize,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` as the whole content of `path`.
    pub fn register(&self, path: impl AsRef<Path>, table: Table) -> Result<()> {
        self.insert(path.as_ref(), None, table)
    }

    /// Register `table` as the named `subgroup` of `path`.
    pub fn register_subgroup(
        &self,
        path: impl AsRef<Path>,
        subgroup: impl Into<String>,
        table: Table,
    ) -> Result<()> {
        self.insert(path.as_ref(), Some(subgroup.into()), table)
    }

    fn insert(&self, path: &Path, subgroup: Option<String>, table: Table) -> Result<()> {
        let key = (normalize_path(path)?, subgroup);
        self.tables
            .write()
            .map_err(|_| poisoned())?
            .insert(key, table);
        Ok(())
    }

    /// Number of `execute` calls so far.
    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    fn lookup(&self, path: &Path, subgroup: Option<&str>) -> Result<Table> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        tables
            .get(&(path.to_path_buf(), subgroup.map(str::to_string)))
            .cloned()
            .ok_or_else(|| {
                Error::EngineExecution(match subgroup {
                    Some(sg) => format!("no table registered at '{}' subgroup '{sg}'", path.display()),
                    None => format!("no table registered at '{}'", path.display()),
                })
            })
    }
}

fn poisoned() -> Error {
    Error::EngineExecution("memory engine table registry lock poisoned".into())
}

impl ScanEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn build_scan_plan(&self, source: &SourceRef, options: &ScanOptions) -> Result<ScanPlan> {
        match options.format.as_deref() {
            None | Some("memory") => Ok(ScanPlan::new(source.clone(), options.clone())),
            Some(other) => Err(Error::UnsupportedScanOptions(format!(
                "memory engine has no format '{other}'"
            ))),
        }
    }

    fn schema_of(&self, plan: &ScanPlan) -> Result<Schema> {
        let first = plan.source.paths().first().ok_or_else(|| {
            Error::InvalidSourceKind("a source must contain at least one path".into())
        })?;
        let full = self
            .lookup(first, plan.options.subgroup.as_deref())?
            .schema();
        match &plan.projection {
            Some(cols) => full.project(cols),
            None => Ok(full),
        }
    }

    fn execute(&self, plan: &ScanPlan) -> Result<Table> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let mut out = Table::default();
        for path in plan.source.paths() {
            out.vstack(self.lookup(path, plan.options.subgroup.as_deref())?)?;
        }
        let out = match &plan.projection {
            Some(cols) => out.select(cols)?,
            None => out,
        };
        debug!(source = %plan.source, rows = out.num_rows(), "memory scan complete");
        Ok(out)
    }
}
