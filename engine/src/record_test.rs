use serde_json::json;

use super::*;

// =============================================================
// Parsing
// =============================================================

#[test]
fn parses_scalar_object() {
    let record = GenerationRecord::from_json(r#"{"name":"Ada","age":36,"member":true,"note":null}"#).unwrap();
    assert_eq!(record.len(), 4);
    assert_eq!(record.get("name"), Some(&json!("Ada")));
    assert_eq!(record.get("note"), Some(&Value::Null));
}

#[test]
fn empty_object_is_valid() {
    let record = GenerationRecord::from_json("{}").unwrap();
    assert!(record.is_empty());
}

#[test]
fn malformed_json_is_an_error() {
    let err = GenerationRecord::from_json("{\"name\": ").unwrap_err();
    assert!(matches!(err, RecordError::Json(_)));
    assert!(err.to_string().starts_with("invalid record JSON"));
}

#[test]
fn non_object_is_an_error() {
    assert!(matches!(GenerationRecord::from_json("[1, 2]"), Err(RecordError::NotAnObject)));
    assert!(matches!(GenerationRecord::from_json("\"text\""), Err(RecordError::NotAnObject)));
}

#[test]
fn nested_values_are_rejected() {
    let err = GenerationRecord::from_json(r#"{"ok": 1, "bad": {"x": 1}}"#).unwrap_err();
    match err {
        RecordError::NonScalar { key } => assert_eq!(key, "bad"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(GenerationRecord::from_value(json!({ "list": [1] })).is_err());
}

// =============================================================
// Lookups
// =============================================================

#[test]
fn filled_skips_blank_values() {
    let mut record = GenerationRecord::new();
    record.insert("empty", "");
    record.insert("null", Value::Null);
    record.insert("zero", 0);
    record.insert("no", false);
    record.insert("space", " ");

    assert!(record.filled("empty").is_none());
    assert!(record.filled("null").is_none());
    assert!(record.filled("missing").is_none());
    assert_eq!(record.filled("zero"), Some(&json!(0)));
    assert_eq!(record.filled("no"), Some(&json!(false)));
    assert_eq!(record.filled("space"), Some(&json!(" ")));
}

#[test]
fn insert_replaces() {
    let mut record = GenerationRecord::new();
    record.insert("k", "a");
    record.insert("k", "b");
    assert_eq!(record.get("k"), Some(&json!("b")));
    assert_eq!(record.len(), 1);
}

// =============================================================
// display_value / is_checked
// =============================================================

#[test]
fn display_value_forms() {
    assert_eq!(display_value(&json!("Ada")), "Ada");
    assert_eq!(display_value(&json!(42)), "42");
    assert_eq!(display_value(&json!(1.5)), "1.5");
    assert_eq!(display_value(&json!(true)), "true");
    assert_eq!(display_value(&Value::Null), "");
}

#[test]
fn checkbox_truth_is_strict() {
    assert!(is_checked(&json!(true)));
    assert!(is_checked(&json!("true")));
    assert!(is_checked(&json!("TRUE")));
    assert!(is_checked(&json!("True")));
    assert!(!is_checked(&json!(false)));
    assert!(!is_checked(&json!("yes")));
    assert!(!is_checked(&json!("1")));
    assert!(!is_checked(&json!(1)));
    assert!(!is_checked(&json!(" true")));
}
