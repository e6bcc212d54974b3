//! Materialization, the eager shortcut, and concurrent plan construction

use std::sync::Arc;

use tabscan::{
    build_scan, materialize, read_eager, select_columns, ColumnSelector, Error, FileEngine,
    MemoryEngine, ScanEngine, SourceRef,
};
mod test_data_gen;
use test_data_gen::{memory_engine, sales_csv, wxyz_table};

#[test]
fn test_unprojected_table_matches_reported_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = sales_csv(dir.path());
    let engine = Arc::new(FileEngine::default());
    let frame = build_scan(engine, &SourceRef::from_path(&path).unwrap(), None, None).unwrap();

    let schema = frame.schema().unwrap();
    let table = materialize(&frame).unwrap();
    assert_eq!(table.column_names(), schema.names());
    assert_eq!(table.num_rows(), 3);
}

#[test]
fn test_build_performs_no_execution() {
    let engine = memory_engine();
    let src = SourceRef::from_path("/mem/wxyz").unwrap();
    let frame = build_scan(engine.clone(), &src, None, None).unwrap();
    assert_eq!(engine.execution_count(), 0);

    let table = materialize(&frame).unwrap();
    assert_eq!(table, wxyz_table());
    assert_eq!(engine.execution_count(), 1);
}

#[test]
fn test_materialize_is_repeatable() {
    let engine = memory_engine();
    let src = SourceRef::from_path("/mem/wxyz").unwrap();
    let frame = build_scan(engine.clone(), &src, None, None).unwrap();
    let first = materialize(&frame).unwrap();
    let second = frame.collect().unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.execution_count(), 2);
}

#[test]
fn test_read_eager_matches_manual_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = sales_csv(dir.path());
    let src = SourceRef::from_path(&path).unwrap();
    let sel = ColumnSelector::Positions(vec![3, 1]);
    let engine = Arc::new(FileEngine::default());

    let eager = read_eager(engine.clone(), &src, Some(&sel), None, None).unwrap();

    let frame = build_scan(engine, &src, None, None).unwrap();
    let frame = select_columns(&frame, Some(&sel)).unwrap();
    let manual = materialize(&frame).unwrap();

    assert_eq!(eager, manual);
    assert_eq!(eager.column_names(), vec!["region", "price"]);
}

#[test]
fn test_missing_file_fails_at_materialize() {
    let dir = tempfile::tempdir().unwrap();
    let src = SourceRef::from_path(dir.path().join("nope.csv")).unwrap();
    let frame = build_scan(Arc::new(FileEngine::default()), &src, None, None).unwrap();
    match materialize(&frame) {
        Err(Error::EngineExecution(msg)) => assert!(msg.contains("nope.csv"), "{msg}"),
        other => panic!("expected EngineExecution, got {other:?}"),
    }
}

#[test]
fn test_unregistered_subgroup_is_engine_error() {
    let engine = memory_engine();
    let src = SourceRef::from_path("/mem/wxyz").unwrap();
    let frame = build_scan(engine, &src, Some("missing"), None).unwrap();
    assert!(matches!(
        materialize(&frame),
        Err(Error::EngineExecution(msg)) if msg.contains("missing")
    ));
}

#[test]
fn test_memory_subgroups() {
    let engine = MemoryEngine::new();
    engine
        .register_subgroup("/mem/h5", "table/columns", wxyz_table())
        .unwrap();
    let src = SourceRef::from_path("/mem/h5").unwrap();
    let table = read_eager(
        Arc::new(engine),
        &src,
        Some(&ColumnSelector::Names(vec!["x".into()])),
        Some("table/columns"),
        None,
    )
    .unwrap();
    assert_eq!(table.column_names(), vec!["x"]);
}

#[test]
fn test_concurrent_projection_on_shared_frame() {
    let engine = memory_engine();
    let src = SourceRef::from_path("/mem/wxyz").unwrap();
    let frame = build_scan(engine.clone(), &src, None, None).unwrap();

    let results: Vec<Vec<String>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4usize)
            .map(|i| {
                let frame = &frame;
                s.spawn(move || {
                    let sel = ColumnSelector::Positions(vec![i, (i + 1) % 4]);
                    select_columns(frame, Some(&sel)).unwrap().columns().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0], vec!["w", "x"]);
    assert_eq!(results[3], vec!["z", "w"]);
    assert_eq!(frame.columns().unwrap(), vec!["w", "x", "y", "z"]);
    assert_eq!(engine.execution_count(), 0);
    assert_eq!(engine.name(), "memory");
}
