// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use tempfile::tempdir;

use masc_core::RoomError;

use super::{append_line, lock_path, read_json, with_file_lock, write_json_atomic};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Doc {
    name: String,
    count: u32,
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    let doc = Doc { name: "demo".into(), count: 3 };

    write_json_atomic(&path, &doc).unwrap();
    let back: Doc = read_json(&path).unwrap().unwrap();
    assert_eq!(back, doc);
}

#[test]
fn read_missing_file_is_none() {
    let dir = tempdir().unwrap();
    let got: Option<Doc> = read_json(&dir.path().join("absent.json")).unwrap();
    assert!(got.is_none());
}

#[test]
fn read_garbage_is_invalid_json_without_full_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, b"{nope").unwrap();

    let err = read_json::<Doc>(&path).unwrap_err();
    match err {
        RoomError::InvalidJson(msg) => {
            assert!(msg.contains("bad.json"), "{msg}");
            assert!(!msg.contains(dir.path().to_str().unwrap()), "{msg}");
        }
        other => panic!("expected InvalidJson, got {other:?}"),
    }
}

#[test]
fn atomic_write_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");
    write_json_atomic(&path, &Doc { name: "a".into(), count: 1 }).unwrap();
    write_json_atomic(&path, &Doc { name: "b".into(), count: 2 }).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["doc.json"]);
}

#[test]
fn lock_path_appends_extension() {
    assert_eq!(
        lock_path(std::path::Path::new("/tmp/room/state.json")),
        std::path::PathBuf::from("/tmp/room/state.json.lock")
    );
}

#[test]
fn with_file_lock_runs_closure_and_releases() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");

    let out = with_file_lock(&path, || Ok(41 + 1)).unwrap();
    assert_eq!(out, 42);

    // Re-acquirable: the guard released on drop.
    let again = with_file_lock(&path, || Ok(true)).unwrap();
    assert!(again);
}

#[test]
fn with_file_lock_releases_on_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.json");

    let err: Result<(), _> =
        with_file_lock(&path, || Err(RoomError::Validation("boom".into())));
    assert!(err.is_err());

    assert!(with_file_lock(&path, || Ok(())).is_ok());
}

#[test]
fn append_line_accumulates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    append_line(&path, "one").unwrap();
    append_line(&path, "two").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
}
