//! Column projection on deferred frames

use std::sync::Arc;

use tabscan::{
    build_scan, materialize, select_columns, ColumnSelector, Error, ScanEngine, SourceRef,
};
mod test_data_gen;
use test_data_gen::{memory_engine, values, wxyz_table};

fn frame() -> (Arc<tabscan::MemoryEngine>, tabscan::DeferredFrame) {
    let engine = memory_engine();
    let src = SourceRef::from_path("/mem/wxyz").unwrap();
    let frame = build_scan(engine.clone(), &src, None, None).unwrap();
    (engine, frame)
}

#[test]
fn test_positions_select_in_requested_order() {
    let (_, f) = frame();
    let narrowed = select_columns(&f, Some(&ColumnSelector::Positions(vec![3, 0]))).unwrap();
    assert_eq!(narrowed.columns().unwrap(), vec!["z", "w"]);

    let table = materialize(&narrowed).unwrap();
    assert_eq!(table.column_names(), vec!["z", "w"]);
    assert_eq!(values(&table, "w"), values(&wxyz_table(), "w"));
}

#[test]
fn test_names_select_in_requested_order() {
    let (_, f) = frame();
    let sel = ColumnSelector::Names(vec!["y".into(), "x".into()]);
    let table = materialize(&select_columns(&f, Some(&sel)).unwrap()).unwrap();
    assert_eq!(table.column_names(), vec!["y", "x"]);
}

#[test]
fn test_duplicates_are_preserved() {
    let (_, f) = frame();
    let narrowed = select_columns(&f, Some(&ColumnSelector::Positions(vec![1, 1]))).unwrap();
    let table = materialize(&narrowed).unwrap();
    assert_eq!(table.column_names(), vec!["x", "x"]);
}

#[test]
fn test_absent_selector_is_noop() {
    let (_, f) = frame();
    let same = select_columns(&f, None).unwrap();
    assert_eq!(same, f);
    assert_eq!(same.columns().unwrap(), vec!["w", "x", "y", "z"]);
}

#[test]
fn test_name_selection_is_idempotent() {
    let (_, f) = frame();
    let sel = ColumnSelector::Names(vec!["z".into(), "x".into()]);
    let once = select_columns(&f, Some(&sel)).unwrap();
    let twice = select_columns(&once, Some(&sel)).unwrap();
    assert_eq!(once.schema().unwrap(), twice.schema().unwrap());
    assert_eq!(once, twice);
}

#[test]
fn test_out_of_range_index_names_index_and_len() {
    let (_, f) = frame();
    let before = f.clone();
    let err = select_columns(&f, Some(&ColumnSelector::Positions(vec![0, 7]))).unwrap_err();
    match err {
        Error::ColumnIndexOutOfRange { index, len } => {
            assert_eq!(index, 7);
            assert_eq!(len, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(f, before);
}

#[test]
fn test_positions_resolve_against_current_schema() {
    let (_, f) = frame();
    let narrowed = select_columns(&f, Some(&ColumnSelector::Positions(vec![2, 3]))).unwrap();
    // Position 0 now means "y", not "w".
    let again = select_columns(&narrowed, Some(&ColumnSelector::Positions(vec![0]))).unwrap();
    assert_eq!(again.columns().unwrap(), vec!["y"]);

    // Never widens: "w" is gone after the first projection.
    let err = select_columns(&narrowed, Some(&ColumnSelector::Names(vec!["w".into()]))).unwrap_err();
    assert!(matches!(err, Error::UnknownColumnReference { ref column, .. } if column == "w"));
    assert!(matches!(
        select_columns(&narrowed, Some(&ColumnSelector::Positions(vec![2]))),
        Err(Error::ColumnIndexOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn test_projection_runs_no_scan() {
    let (engine, f) = frame();
    let narrowed = f.select(&ColumnSelector::Positions(vec![1])).unwrap();
    let _ = narrowed.schema().unwrap();
    assert_eq!(engine.execution_count(), 0);
    assert_eq!(engine.name(), "memory");
}
