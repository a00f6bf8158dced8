use std::collections::HashMap;

use serde_json::{Value, json};

use super::*;
use crate::overlay::generate;
use crate::record::GenerationRecord;
use crate::registry::Field;
use crate::transform::{FieldRect, PageDimensions};

fn instructions() -> Vec<PageInstruction> {
    let fields = [
        Field::new("b", 2, FieldRect::new(0.1, 0.1, 0.2, 0.05)),
        Field::new("a", 1, FieldRect::new(0.1, 0.1, 0.2, 0.05)),
        Field::new("c", 2, FieldRect::new(0.5, 0.5, 0.2, 0.05)),
    ];
    let dims = HashMap::from([(1, PageDimensions::new(612.0, 792.0)), (2, PageDimensions::new(612.0, 792.0))]);
    let record = GenerationRecord::from_value(json!({ "a": "A", "b": "B", "c": "C" })).unwrap();
    generate(&fields, &dims, &record)
}

#[test]
fn groups_by_page_in_order() {
    let bytes = JsonRenderer::default().render(&instructions()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    let pages = doc["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["page_number"], 1);
    assert_eq!(pages[1]["page_number"], 2);
    let texts: Vec<_> = pages[1]["instructions"].as_array().unwrap().iter().map(|i| i["text"].clone()).collect();
    assert_eq!(texts, [json!("B"), json!("C")]);
}

#[test]
fn empty_input_renders_no_pages() {
    let bytes = JsonRenderer::default().render(&[]).unwrap();
    assert_eq!(bytes, br#"{"pages":[]}"#);
}

#[test]
fn pretty_output_is_equivalent() {
    let compact: Value = serde_json::from_slice(&JsonRenderer { pretty: false }.render(&instructions()).unwrap()).unwrap();
    let pretty_bytes = JsonRenderer { pretty: true }.render(&instructions()).unwrap();
    assert!(pretty_bytes.contains(&b'\n'));
    let pretty: Value = serde_json::from_slice(&pretty_bytes).unwrap();
    assert_eq!(compact, pretty);
}

#[test]
fn renderer_is_object_safe() {
    let renderer: Box<dyn DocumentRenderer> = Box::new(JsonRenderer::default());
    assert_eq!(renderer.file_extension(), "json");
}
