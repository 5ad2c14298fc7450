//! Unit tests for request and run store path handling.

use std::io::ErrorKind;

use camino::Utf8Path;

use super::helpers::{utf8_root, write_utf8};
use crate::fs::{create_store_parent, is_regular_file};
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
fn regular_files_are_told_apart_from_directories() {
    let tmp = TempDir::new().expect("tempdir");
    let root = utf8_root(&tmp);
    let request = root.join("request.json");
    write_utf8(&request, b"{}");

    assert!(is_regular_file(&request).expect("request metadata"));
    assert!(!is_regular_file(&root).expect("directory metadata"));
}

#[rstest]
fn missing_requests_report_not_found() {
    let tmp = TempDir::new().expect("tempdir");
    let missing = utf8_root(&tmp).join("absent.json");
    let err = is_regular_file(&missing).expect_err("nothing to inspect");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
fn store_parents_are_created_on_demand() {
    let tmp = TempDir::new().expect("tempdir");
    let store = utf8_root(&tmp).join("state").join("runs").join("fleet.sqlite");

    create_store_parent(&store).expect("directories created");
    create_store_parent(&store).expect("existing directories are kept");

    let parent = store.parent().expect("store has a parent");
    assert!(parent.is_dir());
    assert!(!store.exists());
}

#[rstest]
fn bare_store_names_need_no_directories() {
    create_store_parent(Utf8Path::new("fleet.sqlite")).expect("nothing to create");
}
