// Copyright 2026 The Minigit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use minigit_lib::index::Index;
use minigit_lib::object::FileMode;
use minigit_lib::object::ObjectKind;
use minigit_lib::object_store::ObjectStore;

fn new_store() -> (tempfile::TempDir, ObjectStore) {
    let temp_dir = testutils::new_temp_dir();
    let store = ObjectStore::init(&temp_dir.path().join("objects")).unwrap();
    (temp_dir, store)
}

#[test]
fn test_build_tree_nested_structure() {
    let (_temp_dir, store) = new_store();
    let blob = |content: &str| store.write(ObjectKind::Blob, content.as_bytes()).unwrap();

    let mut index = Index::empty();
    index.add("README.md", FileMode::Normal, blob("readme\n")).unwrap();
    index.add("src/main.rs", FileMode::Normal, blob("fn main() {}\n")).unwrap();
    index.add("src/util/helpers.rs", FileMode::Normal, blob("// helpers\n")).unwrap();
    index.add("tools/run.sh", FileMode::Executable, blob("#!/bin/sh\n")).unwrap();

    let root_id = index.build_tree(&store).unwrap();
    let root = store.read_tree(&root_id).unwrap();
    let names: Vec<_> = root.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["README.md", "src", "tools"]);

    let src = store.read_tree(&root.entry("src").unwrap().id).unwrap();
    let names: Vec<_> = src.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["main.rs", "util"]);

    let util = store.read_tree(&src.entry("util").unwrap().id).unwrap();
    assert_eq!(util.entries().len(), 1);
    assert_eq!(util.entries()[0].name, "helpers.rs");

    let tools = store.read_tree(&root.entry("tools").unwrap().id).unwrap();
    assert_eq!(tools.entries()[0].mode, FileMode::Executable);
}

#[test]
fn test_build_tree_is_deterministic() {
    let (_temp_dir, store) = new_store();
    let blob = store.write(ObjectKind::Blob, b"same\n").unwrap();

    let mut first = Index::empty();
    first.add("b.txt", FileMode::Normal, blob.clone()).unwrap();
    first.add("a/x.txt", FileMode::Normal, blob.clone()).unwrap();

    let mut second = Index::empty();
    second.add("a/x.txt", FileMode::Normal, blob.clone()).unwrap();
    second.add("b.txt", FileMode::Normal, blob.clone()).unwrap();

    assert_eq!(
        first.build_tree(&store).unwrap(),
        second.build_tree(&store).unwrap()
    );
}

#[test]
fn test_build_tree_of_empty_index_is_empty_tree() {
    let (_temp_dir, store) = new_store();
    let tree_id = Index::empty().build_tree(&store).unwrap();
    assert!(store.read_tree(&tree_id).unwrap().is_empty());
}

#[test]
fn test_tree_entry_ordering_matches_wire_rules() {
    let (_temp_dir, store) = new_store();
    let blob = store.write(ObjectKind::Blob, b"x").unwrap();
    let mut index = Index::empty();
    // "a.txt" < "a/" < "ab" in the on-disk ordering.
    index.add("a/inner.txt", FileMode::Normal, blob.clone()).unwrap();
    index.add("a.txt", FileMode::Normal, blob.clone()).unwrap();
    index.add("ab", FileMode::Normal, blob.clone()).unwrap();

    let root = store.read_tree(&index.build_tree(&store).unwrap()).unwrap();
    let names: Vec<_> = root.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "a", "ab"]);
}
