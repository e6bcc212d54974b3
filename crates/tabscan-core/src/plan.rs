//! Scan plans: the engine-facing description of a deferred read.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{hash_serde, Hash256};
use crate::options::ScanOptions;
use crate::source::SourceRef;

/// Everything an engine needs to execute a scan. Holds no row data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanPlan {
    pub source: SourceRef,
    pub options: ScanOptions,
    /// Ordered output columns; `None` keeps the full source schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<String>>,
}

impl ScanPlan {
    pub fn new(source: SourceRef, options: ScanOptions) -> Self {
        Self {
            source,
            options,
            projection: None,
        }
    }

    /// Copy of this plan restricted to `columns`.
    pub fn with_projection(&self, columns: Vec<String>) -> Self {
        Self {
            source: self.source.clone(),
            options: self.options.clone(),
            projection: Some(columns),
        }
    }

    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }
}
