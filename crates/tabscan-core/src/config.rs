//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_INFER_SCHEMA_ROWS: usize = 100;
pub const DEFAULT_BATCH_ROWS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rows sampled to infer column types for text formats.
    pub infer_schema_rows: usize,
    /// Rows decoded per reader batch.
    pub batch_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `TABSCAN_INFER_SCHEMA_ROWS` / `TABSCAN_BATCH_ROWS`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_usize("TABSCAN_INFER_SCHEMA_ROWS") {
            cfg.infer_schema_rows = v;
        }
        if let Some(v) = env_usize("TABSCAN_BATCH_ROWS") {
            cfg.batch_rows = v;
        }
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.infer_schema_rows == 0 {
            return Err(Error::Config("infer_schema_rows must be at least 1".into()));
        }
        if self.batch_rows == 0 {
            return Err(Error::Config("batch_rows must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid config value");
            None
        }
    }
}
