//! YAML pipelines end to end over the file engine

use std::fs;
use std::sync::Arc;

use tabscan::{parse_yaml_pipeline, FileEngine, PipelineError, Scalar};
mod test_data_gen;
use test_data_gen::{sales_csv, values};

#[test]
fn test_pipeline_run_and_sink() {
    let dir = tempfile::tempdir().unwrap();
    let data = sales_csv(dir.path());
    let out = dir.path().join("out").join("revenue.csv");
    let yaml = format!(
        r#"
steps:
  - op: scan
    source: "{}"
  - op: select
    columns: [price, qty, region]
  - op: with_column
    name: revenue
    template: "{{price}} * {{qty}}"
  - op: select
    columns: [region, revenue]
  - op: sink
    destination: "{}"
"#,
        data.display(),
        out.display()
    );

    let plan = parse_yaml_pipeline(&yaml)
        .unwrap()
        .plan(Arc::new(FileEngine::default()))
        .unwrap();
    assert_eq!(plan.frame.columns().unwrap(), vec!["price", "qty", "region"]);
    assert_eq!(plan.eager.len(), 2);
    assert_eq!(plan.sink.as_deref(), Some(out.as_path()));

    let table = plan.run().unwrap();
    assert_eq!(table.column_names(), vec!["region", "revenue"]);
    assert_eq!(
        values(&table, "revenue"),
        vec![Scalar::F64(10.0), Scalar::F64(3.0), Scalar::Null]
    );

    // Running twice gives the same table.
    assert_eq!(plan.run().unwrap(), table);
    assert!(!out.exists(), "planning and running never write the sink");
}

#[test]
fn test_explain_reports_plan() {
    let dir = tempfile::tempdir().unwrap();
    let data = sales_csv(dir.path());
    let yaml = format!(
        "steps:\n  - op: scan\n    source: [\"{}\"]\n  - op: select\n    columns: [3, 0]\n",
        data.display()
    );
    let plan = parse_yaml_pipeline(&yaml)
        .unwrap()
        .plan(Arc::new(FileEngine::default()))
        .unwrap();
    let explained = plan.explain().unwrap();
    let doc: serde_json::Value = serde_json::from_str(&explained).unwrap();

    assert_eq!(doc["engine"], "file");
    assert_eq!(doc["schema"], serde_json::json!(["region", "id"]));
    assert_eq!(
        doc["fingerprint"].as_str().unwrap(),
        plan.frame.fingerprint().unwrap().to_hex()
    );
    assert_eq!(doc["eager_steps"], serde_json::json!([]));
}

#[test]
fn test_unknown_template_column_fails_at_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = sales_csv(dir.path());
    let yaml = format!(
        "steps:\n  - op: scan\n    source: \"{}\"\n  - op: with_column\n    name: t\n    template: \"{{nope}} + 1\"\n",
        data.display()
    );
    let plan = parse_yaml_pipeline(&yaml)
        .unwrap()
        .plan(Arc::new(FileEngine::default()))
        .unwrap();
    assert!(matches!(
        plan.run(),
        Err(PipelineError::Core(tabscan::Error::UnknownColumnReference { .. }))
    ));
}

#[test]
fn test_invalid_pipelines() {
    assert!(matches!(
        parse_yaml_pipeline("steps: []\n"),
        Err(PipelineError::Invalid(_))
    ));
    assert!(matches!(
        parse_yaml_pipeline("steps:\n  - op: explode\n"),
        Err(PipelineError::Yaml(_))
    ));
    let two_scans = "steps:\n  - op: scan\n    source: a.csv\n  - op: scan\n    source: b.csv\n";
    assert!(matches!(
        parse_yaml_pipeline(two_scans),
        Err(PipelineError::Invalid(_))
    ));
    let bad_source = "steps:\n  - op: scan\n    source: 42\n";
    let pipeline = parse_yaml_pipeline(bad_source).unwrap();
    assert!(matches!(
        pipeline.plan(Arc::new(FileEngine::default())),
        Err(PipelineError::Core(tabscan::Error::InvalidSourceKind(_)))
    ));
}

#[test]
fn test_pipeline_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = sales_csv(dir.path());
    let path = dir.path().join("p.yaml");
    fs::write(
        &path,
        format!("steps:\n  - op: scan\n    source: \"{}\"\n", data.display()),
    )
    .unwrap();
    let yaml = fs::read_to_string(&path).unwrap();
    let table = parse_yaml_pipeline(&yaml)
        .unwrap()
        .plan(Arc::new(FileEngine::default()))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(table.num_rows(), 3);
}
