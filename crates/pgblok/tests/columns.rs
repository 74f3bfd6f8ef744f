use pgblok::{
    core::{
        column::JsonbError,
        obs::{metrics_report, metrics_reset_all},
        test_support::MemoryEngine,
    },
    prelude::*,
};
use serde_json::json;

#[test]
fn jsonb_distinguishes_absent_keys_from_nulls() {
    let column = Jsonb::new();
    let doc = json!({"name": "a", "note": null});

    let stored = column.to_value(Some(&doc));
    let back = column.from_value(&stored).unwrap().unwrap();

    assert_eq!(back["note"], json!(null));
    assert!(back.get("other").is_none());
    assert_eq!(column.to_value(None), Value::Null);
}

#[test]
fn jsonb_rejects_values_of_another_type() {
    let err = Jsonb::new().from_value(&Value::Bool(true)).unwrap_err();

    assert!(matches!(err, JsonbError::UnexpectedValue { found: "boolean" }));
}

#[test]
fn large_object_column_follows_configuration() {
    let config = Config::from_toml_str("[large_object]\nkeep_blob = true\n").unwrap();
    let column = LargeObject::from_config(&config.large_object);
    let mut engine = MemoryEngine::new();

    let first = column
        .write(&mut engine, None, Some(b"first".as_slice()))
        .unwrap();
    let second = column
        .write(&mut engine, first, Some(b"second".as_slice()))
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.large_object_count(), 2);
    assert_eq!(engine.open_cursors(), 0);
}

#[test]
fn large_object_overwrite_and_clear_without_keep_blob() {
    metrics_reset_all();
    let column = LargeObject::from_config(&Config::default().large_object);
    let mut engine = MemoryEngine::new();

    let oid = column
        .write(&mut engine, None, Some(b"payload".as_slice()))
        .unwrap();
    let same = column
        .write(&mut engine, oid, Some(b"new".as_slice()))
        .unwrap();
    assert_eq!(oid, same);
    assert_eq!(column.read(&mut engine, same).unwrap(), Some(b"new".to_vec()));

    let cleared = column.write(&mut engine, same, None).unwrap();
    assert_eq!(cleared, None);
    assert!(!engine.large_object_exists(oid.unwrap()));
    assert_eq!(engine.open_cursors(), 0);

    let report = metrics_report();
    assert_eq!(report.ops.large_object_writes, 2);
    assert_eq!(report.ops.large_object_bytes_written, 10);
    assert_eq!(report.ops.large_object_unlinks, 1);
}
