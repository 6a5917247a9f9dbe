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

use assert_matches::assert_matches;
use bstr::BString;
use minigit_lib::object::Commit;
use minigit_lib::object::FileMode;
use minigit_lib::object::Object;
use minigit_lib::object::ObjectKind;
use minigit_lib::object::Signature;
use minigit_lib::object::Tag;
use minigit_lib::object::Tree;
use minigit_lib::object::TreeEntry;
use minigit_lib::object_store::ObjectStore;
use minigit_lib::object_store::StoreError;

fn new_store() -> (tempfile::TempDir, ObjectStore) {
    let temp_dir = testutils::new_temp_dir();
    let store = ObjectStore::init(&temp_dir.path().join("objects")).unwrap();
    (temp_dir, store)
}

#[test]
fn test_known_blob_hash() {
    let (_temp_dir, store) = new_store();
    let id = store.write(ObjectKind::Blob, b"hello\n").unwrap();
    assert_eq!(id.hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    let (kind, payload) = store.read(&id).unwrap();
    assert_eq!(kind, ObjectKind::Blob);
    assert_eq!(payload, b"hello\n");
}

#[test]
fn test_all_kinds_round_trip() {
    let (_temp_dir, store) = new_store();
    let blob_id = store.write(ObjectKind::Blob, b"content\n").unwrap();

    let tree = Tree::from_entries(vec![TreeEntry {
        mode: FileMode::Normal,
        name: "file.txt".to_string(),
        id: blob_id.clone(),
    }]);
    let tree_id = store.write_object(&Object::Tree(tree.clone())).unwrap();
    assert_eq!(store.read_tree(&tree_id).unwrap(), tree);

    let commit = Commit {
        tree: tree_id.clone(),
        parents: vec![],
        author: testutils::signature("author", 1700000000),
        committer: testutils::signature("committer", 1700000001),
        message: BString::from("initial\n"),
    };
    let commit_id = store.write_object(&Object::Commit(commit.clone())).unwrap();
    assert_eq!(store.read_commit(&commit_id).unwrap(), commit);

    let tag = Tag {
        object: commit_id.clone(),
        kind: ObjectKind::Commit,
        name: "v1".to_string(),
        tagger: Some(testutils::signature("tagger", 1700000002)),
        message: BString::from("first release\n"),
    };
    let tag_id = store.write_object(&Object::Tag(tag.clone())).unwrap();
    assert_eq!(store.read_tag(&tag_id).unwrap(), tag);

    // Every referenced child exists after the leaves-first writes above.
    for id in [&blob_id, &tree_id, &commit_id, &tag_id] {
        assert!(store.exists(id));
    }
}

#[test]
fn test_typed_read_rejects_wrong_kind() {
    let (_temp_dir, store) = new_store();
    let blob_id = store.write(ObjectKind::Blob, b"not a commit").unwrap();
    assert_matches!(
        store.read_commit(&blob_id),
        Err(StoreError::UnexpectedKind { .. })
    );
}

#[test]
fn test_short_hash_resolution_and_ambiguity() {
    let (temp_dir, store) = new_store();
    // Fabricate two object files whose ids share the 5-hex prefix "abcde".
    let dir = temp_dir.path().join("objects").join("ab");
    std::fs::create_dir_all(&dir).unwrap();
    let first = format!("cde0{}", "0".repeat(34));
    let second = format!("cdef{}", "0".repeat(34));
    std::fs::write(dir.join(&first), b"").unwrap();
    std::fs::write(dir.join(&second), b"").unwrap();

    assert_matches!(
        store.resolve_short("abcde"),
        Err(StoreError::AmbiguousPrefix { .. })
    );
    let resolved = store.resolve_short("abcde0").unwrap();
    assert_eq!(resolved.hex(), format!("ab{first}"));
    let resolved = store.resolve_short("abcdef").unwrap();
    assert_eq!(resolved.hex(), format!("ab{second}"));
}

#[test]
fn test_short_hash_minimum_length_and_misses() {
    let (_temp_dir, store) = new_store();
    let id = store.write(ObjectKind::Blob, b"hello\n").unwrap();
    // 4 hex digits is the shortest accepted prefix.
    assert_eq!(store.resolve_short(&id.hex()[..4]).unwrap(), id);
    assert_matches!(
        store.resolve_short(&id.hex()[..3]),
        Err(StoreError::NotFound { .. })
    );
    assert_matches!(store.resolve_short("dead"), Err(StoreError::NotFound { .. }));
    // The full hash resolves to itself.
    assert_eq!(store.resolve_short(&id.hex()).unwrap(), id);
}

#[test]
fn test_write_twice_leaves_directory_unchanged() {
    let (temp_dir, store) = new_store();
    let id = store.write(ObjectKind::Blob, b"payload").unwrap();
    let objects_dir = temp_dir.path().join("objects");
    let list_files = || {
        let mut files = walk(&objects_dir);
        files.sort();
        files
    };
    let before = list_files();
    assert_eq!(store.write(ObjectKind::Blob, b"payload").unwrap(), id);
    assert_eq!(list_files(), before);
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = vec![];
    for entry in dir.read_dir().unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
