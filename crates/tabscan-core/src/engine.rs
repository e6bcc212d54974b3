//! The execution-engine seam.
//!
//! Plan construction only ever talks to an engine through this trait. An
//! engine owns physical I/O, format decoding and its own parallelism; the
//! planner neither spawns nor joins engine work.

use crate::error::Result;
use crate::options::ScanOptions;
use crate::plan::ScanPlan;
use crate::schema::Schema;
use crate::source::SourceRef;
use crate::types::Table;

pub trait ScanEngine: Send + Sync {
    /// Stable engine name, used in logs.
    fn name(&self) -> &'static str;

    /// Build a plan without reading the source's bytes.
    ///
    /// Combinations the engine can reject without I/O (unknown format hint,
    /// a subgroup on a format without regions) must fail here.
    fn build_scan_plan(&self, source: &SourceRef, options: &ScanOptions) -> Result<ScanPlan>;

    /// Ordered schema of the plan's output, without materializing rows.
    fn schema_of(&self, plan: &ScanPlan) -> Result<Schema>;

    /// Restrict a plan to `columns`, in order.
    fn project(&self, plan: &ScanPlan, columns: &[String]) -> Result<ScanPlan> {
        Ok(plan.with_projection(columns.to_vec()))
    }

    /// Run the plan to completion. The only blocking call.
    fn execute(&self, plan: &ScanPlan) -> Result<Table>;
}
