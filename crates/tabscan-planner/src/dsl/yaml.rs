//! YAML pipelines: one scan, then projections and derived columns.
//!
//! Example:
//! ```yaml
//! steps:
//!   - op: scan
//!     source: ["data/a.jsonl", "data/b.jsonl"]
//!     subgroup: table/columns
//!   - op: select
//!     columns: [0, 2]
//!   - op: with_column
//!     name: total
//!     template: "{a} + {b}"
//!   - op: sink
//!     destination: out/total.csv
//! ```
//!
//! Selects before the first `with_column` narrow the deferred scan itself;
//! later ones apply to the realized table.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use tabscan_core::engine::ScanEngine;
use tabscan_core::source::SourceRef;
use tabscan_core::template::{apply_template_expression, compile_template};
use tabscan_core::types::Table;

use crate::frame::DeferredFrame;
use crate::materialize::materialize;
use crate::select::{select_columns, select_table, ColumnSelector};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),

    #[error(transparent)]
    Core(#[from] tabscan_core::error::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Scan {
        /// A path string or a list of path strings.
        source: serde_json::Value,
        #[serde(default)]
        subgroup: Option<String>,
        #[serde(default)]
        format: Option<String>,
    },

    Select {
        columns: ColumnSelector,
    },

    WithColumn {
        name: String,
        template: String,
    },

    Sink {
        destination: PathBuf,
    },
}

/// Steps applied after materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum EagerStep {
    Select(ColumnSelector),
    WithColumn { name: String, template: String },
}

/// A validated pipeline bound to an engine.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub frame: DeferredFrame,
    pub eager: Vec<EagerStep>,
    pub sink: Option<PathBuf>,
}

/// Parse YAML and check the pipeline's shape (first step `scan`, a single
/// scan, `sink` only at the end, templates that compile).
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<Pipeline> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    doc.validate()?;
    Ok(doc)
}

impl Pipeline {
    pub fn validate(&self) -> Result<()> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Err(PipelineError::Invalid("empty pipeline".into()));
        };
        if !matches!(first, Step::Scan { .. }) {
            return Err(PipelineError::Invalid(format!(
                "first step must be 'scan', got '{}'",
                first.op_name()
            )));
        }
        for (i, step) in rest.iter().enumerate() {
            match step {
                Step::Scan { .. } => {
                    return Err(PipelineError::Invalid(
                        "multiple scans not supported".into(),
                    ))
                }
                Step::Sink { .. } if i + 1 != rest.len() => {
                    return Err(PipelineError::Invalid("'sink' must be the last step".into()))
                }
                Step::WithColumn { template, .. } => {
                    compile_template(template)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Bind to `engine`. Builds and projects the deferred scan; reads nothing
    /// beyond what the engine needs for schemas.
    pub fn plan(&self, engine: Arc<dyn ScanEngine>) -> Result<PipelinePlan> {
        self.validate()?;
        let mut frame: Option<DeferredFrame> = None;
        let mut eager = Vec::new();
        let mut sink = None;

        for step in &self.steps {
            match step {
                Step::Scan {
                    source,
                    subgroup,
                    format,
                } => {
                    let source = SourceRef::try_from(source)?;
                    frame = Some(crate::frame::build_scan(
                        Arc::clone(&engine),
                        &source,
                        subgroup.as_deref(),
                        format.as_deref(),
                    )?);
                }
                Step::Select { columns } if eager.is_empty() => {
                    if let Some(f) = frame.as_ref() {
                        frame = Some(select_columns(f, Some(columns))?);
                    }
                }
                Step::Select { columns } => eager.push(EagerStep::Select(columns.clone())),
                Step::WithColumn { name, template } => eager.push(EagerStep::WithColumn {
                    name: name.clone(),
                    template: template.clone(),
                }),
                Step::Sink { destination } => sink = Some(destination.clone()),
            }
        }

        let frame = frame.ok_or_else(|| PipelineError::Invalid("pipeline has no scan".into()))?;
        Ok(PipelinePlan { frame, eager, sink })
    }
}

impl Step {
    pub fn op_name(&self) -> &'static str {
        match self {
            Step::Scan { .. } => "scan",
            Step::Select { .. } => "select",
            Step::WithColumn { .. } => "with_column",
            Step::Sink { .. } => "sink",
        }
    }
}

impl PipelinePlan {
    /// Materialize the scan and apply the eager steps in order.
    pub fn run(&self) -> Result<Table> {
        let mut table = materialize(&self.frame)?;
        for step in &self.eager {
            debug!(?step, "applying step");
            table = match step {
                EagerStep::Select(sel) => select_table(&table, sel)?,
                EagerStep::WithColumn { name, template } => {
                    apply_template_expression(&table, name, template)?
                }
            };
        }
        Ok(table)
    }

    /// Human-readable plan summary as pretty JSON.
    pub fn explain(&self) -> Result<String> {
        let eager: Vec<_> = self
            .eager
            .iter()
            .map(|s| match s {
                EagerStep::Select(sel) => json!({ "select": sel }),
                EagerStep::WithColumn { name, template } => {
                    json!({ "with_column": { "name": name, "template": template } })
                }
            })
            .collect();
        let doc = json!({
            "engine": self.frame.engine().name(),
            "fingerprint": self.frame.fingerprint()?.to_hex(),
            "scan": self.frame.plan(),
            "schema": self.frame.columns()?,
            "eager_steps": eager,
            "sink": self.sink,
        });
        serde_json::to_string_pretty(&doc)
            .map_err(|e| PipelineError::Core(tabscan_core::error::Error::from(e)))
    }
}
