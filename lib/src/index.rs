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

//! The staging area: an ordered mapping of paths to staged blobs.
//!
//! Serialized as one `<mode> <id> <path>` line per entry, sorted by path.
//! The file is rewritten wholesale under a lock; no partial states are
//! observable.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::file_util::PathError;
use crate::file_util::write_file_atomic;
use crate::lock::FileLock;
use crate::lock::FileLockError;
use crate::object;
use crate::object::FileMode;
use crate::object::ObjectKind;
use crate::object::Tree;
use crate::object::TreeEntry;
use crate::object_id::ObjectId;
use crate::object_store::ObjectStore;
use crate::object_store::StoreError;

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Malformed index entry on line {line}")]
    Parse { line: usize },
    #[error("Invalid path {path:?}")]
    InvalidPath { path: String },
    #[error(transparent)]
    Lock(#[from] FileLockError),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// A staged blob: its mode and id. The path is the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// File mode to record in the tree.
    pub mode: FileMode,
    /// Id of the staged blob.
    pub id: ObjectId,
}

/// The staging area: a sorted map from path to entry. Path ordering is
/// lexicographic on bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// An index with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the index from disk. A missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(err) => return Err(PathError::new(path, err).into()),
        };
        let mut entries = BTreeMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let parse_err = || IndexError::Parse { line: lineno + 1 };
            let mut fields = line.splitn(3, ' ');
            let mode = fields
                .next()
                .and_then(|m| FileMode::from_octal(m.as_bytes()))
                .ok_or_else(parse_err)?;
            let id = fields
                .next()
                .and_then(ObjectId::try_from_hex)
                .ok_or_else(parse_err)?;
            let path = fields.next().ok_or_else(parse_err)?;
            entries.insert(path.to_string(), IndexEntry { mode, id });
        }
        Ok(Self { entries })
    }

    /// Rewrites the index wholesale: lock, temp file, rename, unlock.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let _lock = FileLock::acquire(path)?;
        let mut content = String::new();
        for (entry_path, entry) in &self.entries {
            writeln!(
                content,
                "{} {} {}",
                entry.mode.as_octal_str(),
                entry.id.hex(),
                entry_path
            )
            .expect("writing to a string never fails");
        }
        write_file_atomic(path, content.as_bytes())?;
        tracing::debug!(entries = self.entries.len(), "saved index");
        Ok(())
    }

    /// Stages a blob at `path`, replacing any existing entry there.
    pub fn add(&mut self, path: &str, mode: FileMode, id: ObjectId) -> Result<(), IndexError> {
        validate_path(path)?;
        self.entries.insert(path.to_string(), IndexEntry { mode, id });
        Ok(())
    }

    /// Removes the entry at `path`. Returns whether one existed.
    pub fn remove(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Looks up the entry at `path`.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Number of staged paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes the full nested tree structure for the staged paths and
    /// returns the root tree id. Subtrees are written leaves-first so that
    /// every referenced child exists in the store before its parent.
    pub fn build_tree(&self, store: &ObjectStore) -> Result<ObjectId, StoreError> {
        // Directory path ("" is the root) -> entries of that directory.
        let mut dirs: BTreeMap<String, Vec<TreeEntry>> = BTreeMap::new();
        dirs.insert(String::new(), vec![]);
        for (path, entry) in &self.entries {
            let (dir, name) = split_dirname(path);
            let mut ancestor = dir;
            loop {
                dirs.entry(ancestor.to_string()).or_default();
                if ancestor.is_empty() {
                    break;
                }
                (ancestor, _) = split_dirname(ancestor);
            }
            dirs.get_mut(dir).unwrap().push(TreeEntry {
                mode: entry.mode,
                name: name.to_string(),
                id: entry.id.clone(),
            });
        }
        // Directories sort before their contents, so popping from the back
        // yields every subtree before its parent.
        while let Some((dir, entries)) = dirs.pop_last() {
            let tree = Tree::from_entries(entries);
            let tree_id = store.write(ObjectKind::Tree, &object::encode_tree(&tree))?;
            if dir.is_empty() {
                return Ok(tree_id);
            }
            let (parent, name) = split_dirname(&dir);
            dirs.get_mut(parent).unwrap().push(TreeEntry {
                mode: FileMode::Tree,
                name: name.to_string(),
                id: tree_id,
            });
        }
        unreachable!("the root tree is always present");
    }
}

// Splits "a/b/c" into ("a/b", "c"); a bare name has the root "" directory.
fn split_dirname(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

fn validate_path(path: &str) -> Result<(), IndexError> {
    let invalid = || IndexError::InvalidPath {
        path: path.to_string(),
    };
    if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
        return Err(invalid());
    }
    for component in path.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(invalid());
        }
        if component.bytes().any(|b| b == 0 || b == b'\n') {
            return Err(invalid());
        }
    }
    Ok(())
}
