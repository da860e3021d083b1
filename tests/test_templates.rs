//! Integration tests for the JSON template store.

use pdfmeta::config::{Config, TEMPLATE_STORE_ENV};
use pdfmeta::model::{Field, MetadataPatch, TemplateRecord};
use pdfmeta::{CancelToken, ErrorCode, FileTemplateStore, TemplateStore};
use std::fs;
use tempfile::tempdir;

fn record(name: &str, note: &str, author: &str) -> TemplateRecord {
    TemplateRecord {
        name: name.into(),
        note: note.into(),
        metadata: MetadataPatch::new().with(Field::Author, author),
    }
}

#[test]
fn test_missing_file_lists_nothing() {
    let dir = tempdir().unwrap();
    let store = FileTemplateStore::new(dir.path().join("none.json"));
    assert!(store.list(&CancelToken::new()).unwrap().is_empty());
}

#[test]
fn test_records_are_sorted_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("templates.json");
    let store = FileTemplateStore::new(&path);
    let cancel = CancelToken::new();

    store.save(&cancel, record("zeta", "", "Z"), false).unwrap();
    store.save(&cancel, record("alpha", "first", "A"), false).unwrap();

    let names: Vec<_> = store.list(&cancel).unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.ends_with("}\n"));
    assert!(raw.find("alpha").unwrap() < raw.find("zeta").unwrap());
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["templates"][0]["metadata"]["author"], "A");
    assert_eq!(parsed["templates"][0]["note"], "first");
    assert!(parsed["templates"][1].get("note").is_none());
}

#[test]
fn test_conflict_and_force() {
    let dir = tempdir().unwrap();
    let store = FileTemplateStore::new(dir.path().join("t.json"));
    let cancel = CancelToken::new();

    store.save(&cancel, record("release", "", "One"), false).unwrap();
    let err = store.save(&cancel, record("release", "", "Two"), false).unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.to_string(), "template \"release\" already exists");

    store.save(&cancel, record("release", "", "Two"), true).unwrap();
    let got = store.get(&cancel, "release").unwrap();
    assert_eq!(got.metadata.get(Field::Author), Some("Two"));
}

#[test]
fn test_get_and_delete_missing() {
    let dir = tempdir().unwrap();
    let store = FileTemplateStore::new(dir.path().join("t.json"));
    let cancel = CancelToken::new();

    let err = store.get(&cancel, "ghost").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(err.to_string(), "template \"ghost\" not found");
    assert_eq!(store.delete(&cancel, "ghost").unwrap_err().code, ErrorCode::NotFound);
    assert_eq!(store.get(&cancel, "  ").unwrap_err().code, ErrorCode::Validation);
}

#[test]
fn test_corrupt_store_is_internal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.json");
    fs::write(&path, "{ not json").unwrap();

    let err = FileTemplateStore::new(&path).list(&CancelToken::new()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(err.to_string().starts_with("decode template store"));
}

#[test]
fn test_explicit_path_wins_over_env() {
    let dir = tempdir().unwrap();
    let explicit = dir.path().join("explicit.json");
    let config = Config::new().with_template_store(&explicit);
    assert_eq!(config.template_store_path().unwrap(), explicit);
    assert_eq!(
        FileTemplateStore::from_config(config).path().unwrap(),
        dir.path().join("explicit.json")
    );
    assert_eq!(TEMPLATE_STORE_ENV, "PDFMETA_TEMPLATE_STORE");
}
