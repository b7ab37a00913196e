//! Tests for the index manager
//!
//! These tests verify:
//! - Bucket maintenance when documents are inserted and removed
//! - Candidate pruning (unbounded, single field, intersection)
//! - Persistence layout and lazy rebuild of missing structures
//! - Equivalence of pruned and full-scan results through the store

use std::collections::BTreeSet;
use std::fs;

use jsondb::catalog::{DirLayout, Namespace, PathResolver};
use jsondb::document::{Document, Value};
use jsondb::index::{Candidates, FieldIndex, IndexManager};
use jsondb::storage::Snapshot;
use jsondb::{CollectionStore, Engine, FindOptions};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn doc(value: serde_json::Value) -> Document {
    Document::from_json(value).unwrap()
}

fn snapshot_of(docs: &[(&str, serde_json::Value)]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for (id, value) in docs {
        let mut d = doc(value.clone());
        d.insert("_id", *id);
        snapshot.insert(id.to_string(), d);
    }
    snapshot
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn ids(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn setup_store() -> (TempDir, Engine, CollectionStore) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path()).unwrap();
    engine.create_database("shop").unwrap();
    let store = engine.create_collection("shop", "items").unwrap();
    (temp_dir, engine, store)
}

fn id_set(docs: &[Document]) -> BTreeSet<String> {
    docs.iter().map(|d| d.id().unwrap().to_string()).collect()
}

// =============================================================================
// Field Index Tests
// =============================================================================

#[test]
fn test_build_groups_ids_by_value() {
    let snapshot = snapshot_of(&[
        ("a", json!({"color": "red"})),
        ("b", json!({"color": "blue"})),
        ("c", json!({"color": "red"})),
        ("d", json!({"size": 3})),
    ]);

    let index = IndexManager::build("color", &snapshot);
    assert_eq!(index.bucket_count(), 2);
    assert_eq!(index.lookup(&Value::from("red")), Some(&ids(&["a", "c"])));
    assert_eq!(index.lookup(&Value::from("blue")), Some(&ids(&["b"])));
    assert!(!index.references("d"));
}

#[test]
fn test_remove_then_insert_moves_id_between_buckets() {
    let mut index = FieldIndex::new();
    index.insert(&Value::from("old"), "x");
    index.remove(&Value::from("old"), "x");
    index.insert(&Value::from("new"), "x");

    assert_eq!(index.lookup(&Value::from("old")), None);
    assert_eq!(index.lookup(&Value::from("new")), Some(&ids(&["x"])));
    assert_eq!(index.bucket_count(), 1);
}

// =============================================================================
// Candidate Pruning Tests
// =============================================================================

#[test]
fn test_no_indexed_key_is_unbounded() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DirLayout::new(temp_dir.path());
    let ns = Namespace::new("db", "c").unwrap();
    let snapshot = snapshot_of(&[("a", json!({"color": "red", "size": 1}))]);

    let manager = IndexManager::load(&layout, &ns, &fields(&["color"]), &snapshot).unwrap();

    assert_eq!(manager.candidate_ids(&doc(json!({"size": 1}))), Candidates::Unbounded);
    // Operator maps are not literal equalities
    assert_eq!(
        manager.candidate_ids(&doc(json!({"color": {"$ne": "red"}}))),
        Candidates::Unbounded
    );
}

#[test]
fn test_indexed_literal_prunes_to_bucket() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DirLayout::new(temp_dir.path());
    let ns = Namespace::new("db", "c").unwrap();
    let snapshot = snapshot_of(&[
        ("a", json!({"color": "red"})),
        ("b", json!({"color": "blue"})),
    ]);

    let manager = IndexManager::load(&layout, &ns, &fields(&["color"]), &snapshot).unwrap();

    let candidates = manager.candidate_ids(&doc(json!({"color": "red"})));
    assert_eq!(candidates, Candidates::Ids(ids(&["a"])));
    assert!(candidates.admits("a"));
    assert!(!candidates.admits("b"));

    assert_eq!(
        manager.candidate_ids(&doc(json!({"color": "green"}))),
        Candidates::Ids(BTreeSet::new())
    );
}

#[test]
fn test_multiple_indexed_literals_intersect() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DirLayout::new(temp_dir.path());
    let ns = Namespace::new("db", "c").unwrap();
    let snapshot = snapshot_of(&[
        ("a", json!({"color": "red", "size": 1})),
        ("b", json!({"color": "red", "size": 2})),
        ("c", json!({"color": "blue", "size": 1})),
    ]);

    let manager =
        IndexManager::load(&layout, &ns, &fields(&["color", "size"]), &snapshot).unwrap();

    assert_eq!(
        manager.candidate_ids(&doc(json!({"color": "red", "size": 1}))),
        Candidates::Ids(ids(&["a"]))
    );
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_missing_structure_is_rebuilt_and_saved() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DirLayout::new(temp_dir.path());
    let ns = Namespace::new("db", "c").unwrap();
    let snapshot = snapshot_of(&[("a", json!({"color": "red"}))]);

    let path = layout.index_location(&ns, "color");
    assert!(!path.exists());

    let manager = IndexManager::load(&layout, &ns, &fields(&["color"]), &snapshot).unwrap();
    assert!(manager.get("color").unwrap().references("a"));

    manager.save(&layout, &ns, false).unwrap();
    let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"\"red\"": ["a"]}));
}

#[test]
fn test_persisted_structure_is_loaded_as_is() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DirLayout::new(temp_dir.path());
    let ns = Namespace::new("db", "c").unwrap();
    let path = layout.index_location(&ns, "color");

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, r#"{"\"red\"":["z"]}"#).unwrap();

    let snapshot = snapshot_of(&[("a", json!({"color": "red"}))]);
    let manager = IndexManager::load(&layout, &ns, &fields(&["color"]), &snapshot).unwrap();

    assert_eq!(
        manager.get("color").unwrap().lookup(&Value::from("red")),
        Some(&ids(&["z"]))
    );
}

#[test]
fn test_index_location_encodes_field_name() {
    let layout = DirLayout::new("/data");
    let ns = Namespace::new("db", "c").unwrap();

    let plain = layout.index_location(&ns, "addr.city");
    assert!(plain.ends_with("db/c.addr.city.index"));

    let odd = layout.index_location(&ns, "../x");
    let name = odd.file_name().unwrap().to_str().unwrap();
    assert!(!name.contains('/'));
    assert!(odd.starts_with("/data/db"));
}

// =============================================================================
// Store-Level Tests
// =============================================================================

#[test]
fn test_indexed_find_equals_full_scan() {
    let (_temp, _engine, store) = setup_store();
    for i in 0..30 {
        store
            .insert_one(doc(json!({"cat": format!("c{}", i % 4), "tier": i % 3, "n": i})))
            .unwrap();
    }

    let filters = [
        json!({"cat": "c1"}),
        json!({"tier": 2}),
        json!({"cat": "c2", "tier": 0}),
        json!({"cat": "c3", "n": {"$gt": 10}}),
        json!({"cat": "nope"}),
    ];

    let scans: Vec<BTreeSet<String>> = filters
        .iter()
        .map(|f| id_set(&store.find(&doc(f.clone()), &FindOptions::new()).unwrap()))
        .collect();

    store.create_indexes(&["cat", "tier"]).unwrap();

    for (filter, scan) in filters.iter().zip(&scans) {
        let pruned = id_set(&store.find(&doc(filter.clone()), &FindOptions::new()).unwrap());
        assert_eq!(&pruned, scan, "filter {}", filter);
    }
}

#[test]
fn test_delete_leaves_no_stale_bucket_entries() {
    let (_temp, _engine, store) = setup_store();
    store.create_index("status").unwrap();

    let mut expired = Vec::new();
    for i in 0..6 {
        let status = if i % 2 == 0 { "expired" } else { "live" };
        let d = store.insert_one(doc(json!({"status": status, "i": i}))).unwrap();
        if status == "expired" {
            expired.push(d.id().unwrap().to_string());
        }
    }

    let removed = store.delete(&doc(json!({"status": "expired"}))).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(store.count().unwrap(), 3);

    let index = store.index("status").unwrap().unwrap();
    for id in &expired {
        assert!(!index.references(id));
    }
    assert_eq!(index.lookup(&Value::from("expired")), None);
    assert_eq!(index.lookup(&Value::from("live")).unwrap().len(), 3);
}

#[test]
fn test_update_moves_document_between_buckets() {
    let (_temp, _engine, store) = setup_store();
    store.create_index("status").unwrap();
    let d = store.insert_one(doc(json!({"status": "new"}))).unwrap();
    let id = d.id().unwrap().to_string();

    store
        .update_one(&doc(json!({"status": "new"})), &doc(json!({"status": "done"})))
        .unwrap();

    let index = store.index("status").unwrap().unwrap();
    assert_eq!(index.lookup(&Value::from("new")), None);
    assert_eq!(index.lookup(&Value::from("done")), Some(&ids(&[id.as_str()])));
}

#[test]
fn test_drop_and_recreate_index_is_idempotent() {
    let (_temp, _engine, store) = setup_store();
    store.create_index("color").unwrap();
    for color in ["red", "blue", "red", "green"] {
        store.insert_one(doc(json!({"color": color}))).unwrap();
    }

    let before = store.index("color").unwrap().unwrap();

    store.drop_index("color").unwrap();
    assert!(store.index("color").unwrap().is_none());

    store.create_index("color").unwrap();
    let after = store.index("color").unwrap().unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_deleted_index_file_is_rebuilt_on_next_write() {
    let (_temp, engine, store) = setup_store();
    store.create_index("color").unwrap();
    store.insert_one(doc(json!({"color": "red"}))).unwrap();

    let path = engine.paths().index_location(store.namespace(), "color");
    assert!(path.exists());
    fs::remove_file(&path).unwrap();

    // Reads rebuild in memory only
    assert_eq!(store.count_documents(&doc(json!({"color": "red"}))).unwrap(), 1);
    assert!(!path.exists());

    store.insert_one(doc(json!({"color": "blue"}))).unwrap();
    assert!(path.exists());
    let index = store.index("color").unwrap().unwrap();
    assert_eq!(index.bucket_count(), 2);
}

#[test]
fn test_declared_index_is_built_in_memory_until_first_write() {
    let (_temp, engine, store) = setup_store();
    store.insert_one(doc(json!({"color": "red"}))).unwrap();
    store.create_index("color").unwrap();

    let path = engine.paths().index_location(store.namespace(), "color");
    for _ in 0..3 {
        assert_eq!(store.count_documents(&doc(json!({"color": "red"}))).unwrap(), 1);
    }
    assert!(!path.exists());

    store.insert_one(doc(json!({"color": "red"}))).unwrap();
    assert!(path.exists());
    let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["\"red\""].as_array().unwrap().len(), 2);
}
