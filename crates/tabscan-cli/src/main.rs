//! tabscan CLI: read tabular files, derive columns, run YAML pipelines.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tabscan_core::config::EngineConfig;
use tabscan_core::source::SourceRef;
use tabscan_core::template::apply_template_expression;
use tabscan_core::types::Table;
use tabscan_exec::FileEngine;
use tabscan_io::writers::csv::CsvWriter;
use tabscan_planner::dsl::yaml::parse_yaml_pipeline;
use tabscan_planner::{build_scan, read_eager, ColumnSelector};

#[derive(Parser)]
#[command(name = "tabscan")]
#[command(about = "Deferred scans over CSV / JSONL / Parquet with placeholder expressions", long_about = None)]
struct Cli {
    /// Rows sampled for type inference (overrides TABSCAN_INFER_SCHEMA_ROWS)
    #[arg(long, global = true)]
    infer_schema_rows: Option<usize>,

    /// Rows decoded per batch (overrides TABSCAN_BATCH_ROWS)
    #[arg(long, global = true)]
    batch_rows: Option<usize>,

    /// More logging; repeat for trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScanArgs {
    /// One or more source files; several are read as one list source
    #[arg(required = true)]
    sources: Vec<String>,

    /// Region within each source (e.g. a JSON key path `table/columns`)
    #[arg(long)]
    subgroup: Option<String>,

    /// Format hint: csv, jsonl or parquet
    #[arg(long)]
    format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read sources and write the result as CSV
    Read {
        #[command(flatten)]
        scan: ScanArgs,

        /// Columns to keep: names (`a,b`) or zero-based positions (`0,2`)
        #[arg(long)]
        columns: Option<String>,

        /// Derived column as NAME=TEMPLATE, e.g. `total={a} + {b}`; repeatable
        #[arg(long = "with", value_name = "NAME=TEMPLATE")]
        with_columns: Vec<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the schema of sources without reading rows
    Schema {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Output file (overrides the pipeline's sink; stdout when neither is set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline YAML file (syntax check)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the scan plan, schema and steps for a pipeline
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = engine_config(&cli).and_then(|cfg| {
        let engine = Arc::new(FileEngine::new(cfg));
        match cli.command {
            Commands::Read {
                scan,
                columns,
                with_columns,
                output,
            } => read_command(engine, &scan, columns.as_deref(), &with_columns, output.as_deref()),
            Commands::Schema { scan } => schema_command(engine, &scan),
            Commands::Run { pipeline, output } => run_pipeline(engine, &pipeline, output.as_deref()),
            Commands::Validate { pipeline } => {
                validate_pipeline(&pipeline)?;
                println!("✓ Pipeline is valid");
                Ok(())
            }
            Commands::Explain { pipeline } => explain_pipeline(engine, &pipeline),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "tabscan=warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn engine_config(cli: &Cli) -> CliResult<EngineConfig> {
    let mut config = EngineConfig::from_env();
    if let Some(rows) = cli.infer_schema_rows {
        config.infer_schema_rows = rows;
    }
    if let Some(rows) = cli.batch_rows {
        config.batch_rows = rows;
    }
    config.validate()?;
    debug!(?config, "engine config");
    Ok(config)
}

fn source_ref(sources: &[String]) -> CliResult<SourceRef> {
    Ok(match sources {
        [single] => SourceRef::from_path(single)?,
        many => SourceRef::from_paths(many)?,
    })
}

/// `0,2` selects by position; anything else by name.
fn parse_columns(spec: &str) -> ColumnSelector {
    let parts: Vec<&str> = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let positions: Option<Vec<usize>> = parts.iter().map(|p| p.parse().ok()).collect();
    match positions {
        Some(idx) if !idx.is_empty() => ColumnSelector::Positions(idx),
        _ => ColumnSelector::Names(parts.into_iter().map(str::to_string).collect()),
    }
}

fn write_table(table: &Table, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut w = CsvWriter::to_path(path)?;
            w.write_table(table)?;
            eprintln!("wrote {} rows to {}", table.num_rows(), path.display());
        }
        None => {
            let mut w = CsvWriter::to_writer(io::stdout().lock());
            w.write_table(table)?;
            w.into_inner()?.flush()?;
        }
    }
    Ok(())
}

fn read_command(
    engine: Arc<FileEngine>,
    scan: &ScanArgs,
    columns: Option<&str>,
    with_columns: &[String],
    output: Option<&Path>,
) -> CliResult<()> {
    let source = source_ref(&scan.sources)?;
    let selector = columns.map(parse_columns);
    let mut table = read_eager(
        engine,
        &source,
        selector.as_ref(),
        scan.subgroup.as_deref(),
        scan.format.as_deref(),
    )?;
    for spec in with_columns {
        let (name, template) = spec
            .split_once('=')
            .ok_or_else(|| format!("--with expects NAME=TEMPLATE, got '{spec}'"))?;
        table = apply_template_expression(&table, name.trim(), template)?;
    }
    write_table(&table, output)
}

fn schema_command(engine: Arc<FileEngine>, scan: &ScanArgs) -> CliResult<()> {
    let source = source_ref(&scan.sources)?;
    let frame = build_scan(
        engine,
        &source,
        scan.subgroup.as_deref(),
        scan.format.as_deref(),
    )?;
    for field in frame.schema()?.fields {
        println!("{}: {}", field.name, field.data_type);
    }
    Ok(())
}

fn run_pipeline(engine: Arc<FileEngine>, pipeline_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let pipeline = parse_yaml_pipeline(&yaml_content)?;
    let plan = pipeline.plan(engine)?;
    let table = plan.run()?;
    write_table(&table, output.or(plan.sink.as_deref()))
}

fn validate_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    parse_yaml_pipeline(&yaml_content)?;
    Ok(())
}

fn explain_pipeline(engine: Arc<FileEngine>, pipeline_path: &Path) -> CliResult<()> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let plan = parse_yaml_pipeline(&yaml_content)?.plan(engine)?;
    println!("{}", plan.explain()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_by_position_or_name() {
        assert_eq!(parse_columns("2, 0"), ColumnSelector::Positions(vec![2, 0]));
        assert_eq!(
            parse_columns("a,1"),
            ColumnSelector::Names(vec!["a".into(), "1".into()])
        );
    }

    #[test]
    fn read_accepts_repeated_with() {
        let cli = Cli::try_parse_from([
            "tabscan",
            "read",
            "a.jsonl",
            "b.jsonl",
            "--subgroup",
            "table/columns",
            "--with",
            "t={a} + {b}",
            "--with",
            "u={t} * 2",
        ])
        .unwrap();
        match cli.command {
            Commands::Read {
                scan, with_columns, ..
            } => {
                assert_eq!(scan.sources, vec!["a.jsonl", "b.jsonl"]);
                assert_eq!(scan.subgroup.as_deref(), Some("table/columns"));
                assert_eq!(with_columns.len(), 2);
            }
            _ => panic!("expected read"),
        }
    }
}
