//! Fixture helpers shared by the tabscan integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabscan::{Column, MemoryEngine, Scalar, Table};

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

pub const SALES_CSV: &str = "id,price,qty,region
1,2.5,4,north
2,1.0,3,south
3,4.0,,east
";

pub fn sales_csv(dir: &Path) -> PathBuf {
    write_file(dir, "sales.csv", SALES_CSV)
}

pub const EVENTS_JSONL: &str = r#"{"user":"ann","clicks":3,"score":0.5}
{"user":"bob","clicks":7}

{"user":"cy","clicks":1,"score":2.0}
"#;

pub fn events_jsonl(dir: &Path) -> PathBuf {
    write_file(dir, "events.jsonl", EVENTS_JSONL)
}

/// Documents whose rows live under `table/columns`.
pub const NESTED_JSONL: &str = r#"{"meta":{"v":1},"table":{"columns":[{"a":1,"b":10},{"a":2,"b":20}]}}
{"meta":{"v":1},"table":{"columns":{"a":3,"b":30}}}
"#;

pub fn nested_jsonl(dir: &Path) -> PathBuf {
    write_file(dir, "nested.jsonl", NESTED_JSONL)
}

pub fn int_column(name: &str, values: &[i64]) -> Column {
    Column::new(name, values.iter().map(|&v| Scalar::I64(v)).collect())
}

/// `a=[1,2]`, `b=[3,4]`.
pub fn ab_table() -> Table {
    Table::try_new(vec![int_column("a", &[1, 2]), int_column("b", &[3, 4])]).expect("table")
}

/// Four columns `w, x, y, z` with three rows each.
pub fn wxyz_table() -> Table {
    Table::try_new(vec![
        int_column("w", &[1, 2, 3]),
        int_column("x", &[10, 20, 30]),
        Column::new(
            "y",
            vec![Scalar::from("p"), Scalar::from("q"), Scalar::Null],
        ),
        Column::new(
            "z",
            vec![Scalar::F64(0.5), Scalar::F64(1.5), Scalar::F64(2.5)],
        ),
    ])
    .expect("table")
}

/// A memory engine with `wxyz_table()` registered at `/mem/wxyz`.
pub fn memory_engine() -> Arc<MemoryEngine> {
    let engine = MemoryEngine::new();
    engine.register("/mem/wxyz", wxyz_table()).expect("register");
    Arc::new(engine)
}

pub fn values(table: &Table, name: &str) -> Vec<Scalar> {
    table
        .column(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
        .values
        .clone()
}
