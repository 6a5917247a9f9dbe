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

//! Projecting trees onto disk and classifying working-copy changes.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::file_util::ensure_dir;
use crate::hash;
use crate::index::Index;
use crate::object::FileMode;
use crate::object::ObjectKind;
use crate::object_id::ObjectId;
use crate::object_store::ObjectStore;
use crate::object_store::StoreError;

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum WorkingCopyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// How a path differs between two of the three states (HEAD tree, index,
/// working tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present on the newer side only.
    Added,
    /// Present on both sides with different content or mode.
    Modified,
    /// Present on the older side only.
    Deleted,
}

/// A classified path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Repository-relative path.
    pub path: String,
    /// What happened to it.
    pub kind: ChangeKind,
}

/// The three classified sets reported by `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// HEAD tree vs index.
    pub staged: Vec<StatusEntry>,
    /// Index vs working tree.
    pub unstaged: Vec<StatusEntry>,
    /// On disk but not in the index.
    pub untracked: Vec<String>,
}

#[cfg(unix)]
fn set_file_mode(path: &Path, executable: bool) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    let mode = if executable { 0o755 } else { 0o644 };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _executable: bool) -> io::Result<()> {
    Ok(())
}

fn write_symlink(path: &Path, target: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;
        std::os::unix::fs::symlink(OsStr::from_bytes(target), path)
    }
    #[cfg(not(unix))]
    {
        // Platforms without symlinks get the target as file content.
        fs::write(path, target)
    }
}

/// Projects a tree onto `dest`, depth first: directories are created as
/// needed, blobs are written with the mode recorded in the tree.
pub fn checkout_tree(
    store: &ObjectStore,
    tree_id: &ObjectId,
    dest: &Path,
) -> Result<(), WorkingCopyError> {
    tracing::debug!(%tree_id, dest = %dest.display(), "checking out tree");
    let tree = store.read_tree(tree_id)?;
    for entry in tree.entries() {
        let target = dest.join(&entry.name);
        match entry.mode {
            FileMode::Tree => {
                ensure_dir(&target)?;
                checkout_tree(store, &entry.id, &target)?;
            }
            FileMode::Normal | FileMode::Executable => {
                let content = store.read_blob(&entry.id)?;
                fs::write(&target, content).at(&target)?;
                set_file_mode(&target, entry.mode == FileMode::Executable).at(&target)?;
            }
            FileMode::Symlink => {
                let content = store.read_blob(&entry.id)?;
                write_symlink(&target, &content).at(&target)?;
            }
        }
    }
    Ok(())
}

/// Flattens a tree into `path -> (mode, blob id)` for its leaf entries.
pub fn flatten_tree(
    store: &ObjectStore,
    tree_id: &ObjectId,
) -> Result<BTreeMap<String, (FileMode, ObjectId)>, StoreError> {
    let mut out = BTreeMap::new();
    flatten_into(store, tree_id, "", &mut out)?;
    Ok(out)
}

fn flatten_into(
    store: &ObjectStore,
    tree_id: &ObjectId,
    prefix: &str,
    out: &mut BTreeMap<String, (FileMode, ObjectId)>,
) -> Result<(), StoreError> {
    let tree = store.read_tree(tree_id)?;
    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        if entry.mode.is_tree() {
            flatten_into(store, &entry.id, &path, out)?;
        } else {
            out.insert(path, (entry.mode, entry.id.clone()));
        }
    }
    Ok(())
}

// Content a path would hash to if staged right now. Symlinks hash their
// target, not the file they point at.
fn disk_content(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt as _;
            return Ok(Some(target.as_os_str().as_bytes().to_vec()));
        }
        #[cfg(not(unix))]
        return Ok(Some(target.to_string_lossy().into_owned().into_bytes()));
    }
    if metadata.is_dir() {
        return Ok(None);
    }
    fs::read(path).map(Some)
}

/// Compares HEAD tree vs index (staged), index vs working tree (unstaged),
/// and scans for untracked files. `repo_dir_name` is skipped wherever it
/// appears.
pub fn status(
    store: &ObjectStore,
    head_tree: Option<&ObjectId>,
    index: &Index,
    worktree: &Path,
    repo_dir_name: &str,
) -> Result<Status, WorkingCopyError> {
    let head: BTreeMap<String, (FileMode, ObjectId)> = match head_tree {
        Some(tree_id) => flatten_tree(store, tree_id)?,
        None => BTreeMap::new(),
    };

    let mut status = Status::default();
    let paths: BTreeSet<&str> = head
        .keys()
        .map(|path| path.as_str())
        .chain(index.iter().map(|(path, _)| path))
        .collect();
    for path in paths {
        let in_head = head.get(path);
        let in_index = index.get(path);
        let kind = match (in_head, in_index) {
            (None, Some(_)) => Some(ChangeKind::Added),
            (Some(_), None) => Some(ChangeKind::Deleted),
            (Some((head_mode, head_id)), Some(entry))
                if *head_mode != entry.mode || *head_id != entry.id =>
            {
                Some(ChangeKind::Modified)
            }
            _ => None,
        };
        if let Some(kind) = kind {
            status.staged.push(StatusEntry {
                path: path.to_string(),
                kind,
            });
        }
    }

    for (path, entry) in index.iter() {
        let disk_path = worktree.join(path);
        let kind = match disk_content(&disk_path).at(&disk_path)? {
            None => Some(ChangeKind::Deleted),
            Some(content) => {
                if hash::hash_object(ObjectKind::Blob, &content) != entry.id {
                    Some(ChangeKind::Modified)
                } else {
                    None
                }
            }
        };
        if let Some(kind) = kind {
            status.unstaged.push(StatusEntry {
                path: path.to_string(),
                kind,
            });
        }
    }

    let mut untracked = vec![];
    scan_untracked(worktree, "", index, repo_dir_name, &mut untracked)?;
    untracked.sort();
    status.untracked = untracked;
    Ok(status)
}

fn scan_untracked(
    dir: &Path,
    prefix: &str,
    index: &Index,
    repo_dir_name: &str,
    out: &mut Vec<String>,
) -> Result<(), WorkingCopyError> {
    for entry in dir.read_dir().at(dir)? {
        let entry = entry.at(dir)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name == repo_dir_name {
            continue;
        }
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type().at(entry.path())?;
        if file_type.is_dir() {
            scan_untracked(&entry.path(), &path, index, repo_dir_name, out)?;
        } else if index.get(&path).is_none() {
            out.push(path);
        }
    }
    Ok(())
}
