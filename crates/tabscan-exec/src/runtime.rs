//! File-backed scan engine.
//!
//! Plans are checked for format and subgroup compatibility when built;
//! nothing is opened until `schema_of` (which reads at most the inference
//! sample, or the Parquet footer) or `execute`.

use std::path::Path;

use tracing::{debug, info};

use tabscan_core::config::EngineConfig;
use tabscan_core::engine::ScanEngine;
use tabscan_core::error::{Error, Result};
use tabscan_core::options::{FileFormat, ScanOptions};
use tabscan_core::plan::ScanPlan;
use tabscan_core::schema::Schema;
use tabscan_core::source::SourceRef;
use tabscan_core::types::Table;

use tabscan_io::readers::csv::CsvReader;
use tabscan_io::readers::jsonl::JsonlReader;

/// Reads CSV, JSON-lines and (with the `parquet` feature) Parquet files.
#[derive(Debug, Clone, Default)]
pub struct FileEngine {
    cfg: EngineConfig,
}

impl FileEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Decide the format for a source: the hint if given, else every path's
    /// extension, which must agree.
    pub fn resolve_format(source: &SourceRef, options: &ScanOptions) -> Result<FileFormat> {
        let format = match options.format.as_deref() {
            Some(hint) => hint.parse::<FileFormat>()?,
            None => {
                let mut detected: Option<FileFormat> = None;
                for path in source.paths() {
                    let fmt = FileFormat::from_extension(path).ok_or_else(|| {
                        Error::UnsupportedScanOptions(format!(
                            "cannot detect the format of '{}'; pass a format hint",
                            path.display()
                        ))
                    })?;
                    match detected {
                        Some(prev) if prev != fmt => {
                            return Err(Error::UnsupportedScanOptions(format!(
                                "source mixes {prev} and {fmt} files; pass a format hint"
                            )))
                        }
                        _ => detected = Some(fmt),
                    }
                }
                detected.ok_or_else(|| {
                    Error::UnsupportedScanOptions("source has no paths".into())
                })?
            }
        };

        if options.subgroup.is_some() && !format.supports_subgroup() {
            return Err(Error::UnsupportedScanOptions(format!(
                "{format} sources have no subgroups (got subgroup '{}')",
                options.subgroup.as_deref().unwrap_or_default()
            )));
        }
        #[cfg(not(feature = "parquet"))]
        if format == FileFormat::Parquet {
            return Err(Error::UnsupportedScanOptions(
                "parquet support is not compiled in; rebuild with --features parquet".into(),
            ));
        }
        Ok(format)
    }

    /// Full (unprojected) schema of one file.
    fn file_schema(&self, path: &Path, format: FileFormat, options: &ScanOptions) -> Result<Schema> {
        let schema = match format {
            FileFormat::Csv => CsvReader::from_path(path, self.cfg.infer_schema_rows)
                .map(|r| r.schema().clone()),
            FileFormat::Jsonl => {
                JsonlReader::from_path(path, &options.subgroup_path(), self.cfg.infer_schema_rows)
                    .map(|r| r.schema().clone())
            }
            #[cfg(feature = "parquet")]
            FileFormat::Parquet => tabscan_io::readers::parquet::read_parquet_schema(path),
            #[cfg(not(feature = "parquet"))]
            FileFormat::Parquet => return Err(parquet_disabled()),
        };
        schema.map_err(|e| read_error(path, e))
    }

    /// Every row of one file, narrowed to `projection` when the format can
    /// skip columns while decoding. Text formats decode against `schema`
    /// when one is given instead of inferring their own.
    fn read_file(
        &self,
        path: &Path,
        format: FileFormat,
        options: &ScanOptions,
        projection: Option<&[String]>,
        schema: Option<&Schema>,
    ) -> Result<Table> {
        let batch_rows = self.cfg.batch_rows;
        let infer_rows = self.cfg.infer_schema_rows;
        let table = match format {
            FileFormat::Csv => match schema {
                Some(s) => CsvReader::from_path_with_schema(path, s.clone()),
                None => CsvReader::from_path(path, infer_rows),
            }
            .and_then(|r| r.read_all(batch_rows)),
            FileFormat::Jsonl => {
                let subgroup = options.subgroup_path();
                match schema {
                    Some(s) => JsonlReader::from_path_with_schema(path, &subgroup, s.clone()),
                    None => JsonlReader::from_path(path, &subgroup, infer_rows),
                }
                .and_then(|r| r.read_all(batch_rows))
            }
            #[cfg(feature = "parquet")]
            FileFormat::Parquet => {
                tabscan_io::readers::parquet::ParquetReader::from_path(path, projection, batch_rows)
                    .and_then(|r| r.read_all())
            }
            #[cfg(not(feature = "parquet"))]
            FileFormat::Parquet => {
                let _ = projection;
                return Err(parquet_disabled());
            }
        };
        table.map_err(|e| read_error(path, e))
    }
}

fn read_error(path: &Path, e: tabscan_io::Error) -> Error {
    Error::EngineExecution(format!("{}: {e}", path.display()))
}

#[cfg(not(feature = "parquet"))]
fn parquet_disabled() -> Error {
    Error::EngineExecution("parquet support is not compiled in".into())
}

impl ScanEngine for FileEngine {
    fn name(&self) -> &'static str {
        "file"
    }

    fn build_scan_plan(&self, source: &SourceRef, options: &ScanOptions) -> Result<ScanPlan> {
        let format = Self::resolve_format(source, options)?;
        debug!(%source, %format, subgroup = ?options.subgroup, "built file scan plan");
        Ok(ScanPlan::new(source.clone(), options.clone()))
    }

    fn schema_of(&self, plan: &ScanPlan) -> Result<Schema> {
        let format = Self::resolve_format(&plan.source, &plan.options)?;
        let first = plan.source.paths().first().ok_or_else(|| {
            Error::InvalidSourceKind("a source must contain at least one path".into())
        })?;
        let full = self.file_schema(first, format, &plan.options)?;
        match &plan.projection {
            Some(cols) => full.project(cols),
            None => Ok(full),
        }
    }

    fn execute(&self, plan: &ScanPlan) -> Result<Table> {
        let format = Self::resolve_format(&plan.source, &plan.options)?;
        let projection = plan.projection.as_deref();

        // Every list member of a text format decodes against the first
        // member's schema, the same one `schema_of` reports.
        let shared = match (format, plan.source.paths().first()) {
            (FileFormat::Csv | FileFormat::Jsonl, Some(first)) if plan.source.paths().len() > 1 => {
                Some(self.file_schema(first, format, &plan.options)?)
            }
            _ => None,
        };

        let mut out = Table::default();
        for path in plan.source.paths() {
            let part = self.read_file(path, format, &plan.options, projection, shared.as_ref())?;
            debug!(path = %path.display(), rows = part.num_rows(), "read file");
            out.vstack(part)?;
        }

        let out = match projection {
            Some(cols) => out.select(cols)?,
            None => out,
        };
        info!(
            source = %plan.source,
            %format,
            rows = out.num_rows(),
            columns = out.num_columns(),
            "file scan complete"
        );
        Ok(out)
    }
}
