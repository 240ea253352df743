use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_bundle(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("bundle.json");
    let bundle = json!({
        "documents": [
            {"id": "1", "title": "Blueberry pancakes", "category": "breakfast"},
            {"id": "2", "title": "Tomato soup", "category": "lunch"}
        ],
        "mapping": {"ref": "id", "fields": ["title"]}
    });
    std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();
    path
}

#[test]
fn test_precompute_writes_index_and_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(&dir);
    let index_dir = dir.path().join("index");
    let out = dir.path().join("out.json");

    Command::cargo_bin("shortstack")
        .unwrap()
        .arg("precompute")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--index-dir")
        .arg(&index_dir)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed 2 documents"));

    let written: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(
        written["precomputedIndex"]["directory"],
        json!(std::fs::canonicalize(&index_dir).unwrap().to_str().unwrap())
    );
    assert_eq!(written["documents"].as_array().unwrap().len(), 2);
    assert!(index_dir.join("meta.json").exists());
}

#[test]
fn test_precompute_stores_relative_index_dir_as_absolute() {
    let dir = TempDir::new().unwrap();
    write_bundle(&dir);

    Command::cargo_bin("shortstack")
        .unwrap()
        .current_dir(dir.path())
        .args([
            "precompute",
            "--bundle",
            "bundle.json",
            "--index-dir",
            "index",
            "--out",
            "out.json",
        ])
        .assert()
        .success();

    let written: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("out.json")).unwrap()).unwrap();
    let stored = std::path::PathBuf::from(written["precomputedIndex"]["directory"].as_str().unwrap());
    assert!(stored.is_absolute());
    assert_eq!(stored, std::fs::canonicalize(dir.path().join("index")).unwrap());
    assert!(stored.join("meta.json").exists());
}

#[test]
fn test_precompute_refuses_non_empty_index_dir() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(&dir);
    let index_dir = dir.path().join("index");
    std::fs::create_dir_all(&index_dir).unwrap();
    std::fs::write(index_dir.join("stale"), b"x").unwrap();

    Command::cargo_bin("shortstack")
        .unwrap()
        .args(["precompute", "--out"])
        .arg(dir.path().join("out.json"))
        .arg("--bundle")
        .arg(&bundle)
        .arg("--index-dir")
        .arg(&index_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not empty"));
}

#[test]
fn test_precompute_rejects_invalid_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bad.json");
    std::fs::write(&bundle, b"{\"documents\": 3}").unwrap();

    Command::cargo_bin("shortstack")
        .unwrap()
        .arg("precompute")
        .arg("--bundle")
        .arg(&bundle)
        .arg("--index-dir")
        .arg(dir.path().join("index"))
        .arg("--out")
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidBundle"));
}
