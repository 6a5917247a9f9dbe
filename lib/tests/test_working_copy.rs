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

use minigit_lib::object::FileMode;
use minigit_lib::working_copy::ChangeKind;
use minigit_lib::working_copy::checkout_tree;
use minigit_lib::working_copy::flatten_tree;
use testutils::TestRepo;

#[test]
fn test_checkout_projects_nested_tree() {
    let test_repo = TestRepo::init();
    test_repo.write_file("README.md", "hello\n");
    test_repo.write_file("src/lib.rs", "// lib\n");
    test_repo.write_file("src/deep/mod.rs", "// deep\n");
    test_repo.stage(&["README.md", "src/lib.rs", "src/deep/mod.rs"]);
    let index = test_repo.repo.load_index().unwrap();
    let tree_id = index.build_tree(test_repo.repo.store()).unwrap();

    let dest = testutils::new_temp_dir();
    checkout_tree(test_repo.repo.store(), &tree_id, dest.path()).unwrap();
    assert_eq!(
        std::fs::read_to_string(dest.path().join("README.md")).unwrap(),
        "hello\n"
    );
    assert_eq!(
        std::fs::read_to_string(dest.path().join("src/deep/mod.rs")).unwrap(),
        "// deep\n"
    );
}

#[cfg(unix)]
#[test]
fn test_checkout_restores_executable_bit() {
    use std::os::unix::fs::PermissionsExt as _;

    let test_repo = TestRepo::init();
    test_repo.write_file("run.sh", "#!/bin/sh\n");
    let script = test_repo.root().join("run.sh");
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    test_repo.stage(&["run.sh"]);
    let index = test_repo.repo.load_index().unwrap();
    assert_eq!(index.get("run.sh").unwrap().mode, FileMode::Executable);
    let tree_id = index.build_tree(test_repo.repo.store()).unwrap();

    let dest = testutils::new_temp_dir();
    checkout_tree(test_repo.repo.store(), &tree_id, dest.path()).unwrap();
    let mode = std::fs::metadata(dest.path().join("run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0, "executable bit lost");
}

#[test]
fn test_flatten_tree_lists_leaf_paths() {
    let test_repo = TestRepo::init();
    test_repo.write_file("a.txt", "a\n");
    test_repo.write_file("dir/b.txt", "b\n");
    test_repo.stage(&["a.txt", "dir/b.txt"]);
    let tree_id = test_repo
        .repo
        .load_index()
        .unwrap()
        .build_tree(test_repo.repo.store())
        .unwrap();

    let files = flatten_tree(test_repo.repo.store(), &tree_id).unwrap();
    let paths: Vec<_> = files.keys().map(|path| path.as_str()).collect();
    assert_eq!(paths, ["a.txt", "dir/b.txt"]);
}

#[test]
fn test_status_classifies_all_three_sets() {
    let test_repo = TestRepo::init();
    test_repo.commit_file("committed.txt", "v1\n", "initial", 100);

    // Staged: a new file and a modification of the committed one.
    test_repo.write_file("staged-new.txt", "new\n");
    test_repo.write_file("committed.txt", "v2\n");
    test_repo.stage(&["staged-new.txt", "committed.txt"]);

    // Unstaged: modify after staging; also delete a staged file on disk.
    test_repo.write_file("committed.txt", "v3\n");
    std::fs::remove_file(test_repo.root().join("staged-new.txt")).unwrap();

    // Untracked: on disk, never staged.
    test_repo.write_file("stray.txt", "stray\n");

    let status = test_repo.repo.status().unwrap();
    let staged: Vec<_> = status
        .staged
        .iter()
        .map(|entry| (entry.path.as_str(), entry.kind))
        .collect();
    assert_eq!(
        staged,
        [
            ("committed.txt", ChangeKind::Modified),
            ("staged-new.txt", ChangeKind::Added),
        ]
    );
    let unstaged: Vec<_> = status
        .unstaged
        .iter()
        .map(|entry| (entry.path.as_str(), entry.kind))
        .collect();
    assert_eq!(
        unstaged,
        [
            ("committed.txt", ChangeKind::Modified),
            ("staged-new.txt", ChangeKind::Deleted),
        ]
    );
    assert_eq!(status.untracked, ["stray.txt"]);
}

#[test]
fn test_status_reports_staged_deletion() {
    let test_repo = TestRepo::init();
    test_repo.commit_file("gone.txt", "bye\n", "initial", 100);

    let mut index = test_repo.repo.load_index().unwrap();
    index.remove("gone.txt");
    test_repo.repo.save_index(&index).unwrap();
    std::fs::remove_file(test_repo.root().join("gone.txt")).unwrap();

    let status = test_repo.repo.status().unwrap();
    assert_eq!(status.staged.len(), 1);
    assert_eq!(status.staged[0].kind, ChangeKind::Deleted);
    assert!(status.unstaged.is_empty());
    assert!(status.untracked.is_empty());
}

#[test]
fn test_clean_tree_has_empty_status() {
    let test_repo = TestRepo::init();
    test_repo.commit_file("file.txt", "content\n", "initial", 100);
    let status = test_repo.repo.status().unwrap();
    assert!(status.staged.is_empty());
    assert!(status.unstaged.is_empty());
    assert!(status.untracked.is_empty());
}
