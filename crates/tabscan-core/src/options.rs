//! Scan options and on-disk format hints.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Modifiers for a scan. Exactly these two fields; engine tuning lives in
/// [`crate::config::EngineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Named region within the source; `None` reads the whole source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<String>,
    /// Sub-format hint; `None` lets the engine detect it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ScanOptions {
    pub fn new(subgroup: Option<String>, format: Option<String>) -> Self {
        Self { subgroup, format }
    }

    pub fn with_subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.subgroup = Some(subgroup.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Subgroup split into `/`-separated components, empty segments dropped.
    pub fn subgroup_path(&self) -> Vec<&str> {
        self.subgroup
            .as_deref()
            .map(|s| s.split('/').filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Formats the file engine knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Jsonl,
    Parquet,
}

impl FileFormat {
    /// Guess from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "jsonl" | "ndjson" | "json" => Some(FileFormat::Jsonl),
            "parquet" | "pq" => Some(FileFormat::Parquet),
            _ => None,
        }
    }

    pub fn supports_subgroup(&self) -> bool {
        matches!(self, FileFormat::Jsonl)
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "jsonl" | "ndjson" | "json" => Ok(FileFormat::Jsonl),
            "parquet" => Ok(FileFormat::Parquet),
            other => Err(Error::UnsupportedScanOptions(format!(
                "unknown format hint '{other}' (expected csv, jsonl or parquet)"
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Csv => "csv",
            FileFormat::Jsonl => "jsonl",
            FileFormat::Parquet => "parquet",
        })
    }
}
