use serde_json::{json, Value};
use shortstack::index::source::StaticSource;
use shortstack::types::IndexBundle;
use std::path::PathBuf;
use tempfile::TempDir;

/// Three documents; "foo" matches the two in category "x".
#[allow(dead_code)]
pub fn foo_bundle() -> Value {
    json!({
        "documents": [
            {"id": "1", "title": "foo fighters", "category": "x"},
            {"id": "2", "title": "foo bar", "category": "x"},
            {"id": "3", "title": "baz", "category": "y"}
        ],
        "mapping": {"ref": "id", "fields": ["title"]}
    })
}

#[allow(dead_code)]
pub fn recipes_bundle() -> Value {
    json!({
        "documents": [
            {"id": "r1", "title": "Blueberry pancakes", "course": "breakfast", "tags": ["sweet", "quick"], "minutes": 20},
            {"id": "r2", "title": "Buttermilk pancakes", "course": "breakfast", "tags": ["sweet"], "minutes": 25},
            {"id": "r3", "title": "Savory pancakes", "course": "dinner", "tags": ["savory"], "minutes": 30},
            {"id": "r4", "title": "Tomato soup", "course": "lunch", "tags": ["savory", "quick"], "minutes": 20},
            {"id": "r5", "title": "Pancakes with bacon", "course": "breakfast", "tags": ["savory"], "minutes": 35}
        ],
        "mapping": {"ref": "id", "fields": ["title"]}
    })
}

#[allow(dead_code)]
pub fn static_source(label: &str, bundle: &Value) -> StaticSource {
    let bundle: IndexBundle = serde_json::from_value(bundle.clone()).unwrap();
    StaticSource::new(label, bundle)
}

/// Write `bundle` as a JSON file and return its path.
#[allow(dead_code)]
pub fn write_bundle(dir: &TempDir, name: &str, bundle: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec(bundle).unwrap()).unwrap();
    path
}
