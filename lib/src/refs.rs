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

//! Branches, tags, and HEAD.
//!
//! A ref is a single-line text file: either a 40-digit hex id (direct) or
//! `ref: <other>` (symbolic). Writers serialize on a `<name>.lock` file and
//! replace the live file by atomic rename; readers take no lock.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::file_util::ensure_dir;
use crate::file_util::write_file_atomic;
use crate::lock::FileLock;
use crate::lock::FileLockError;
use crate::object_id::ObjectId;

/// The checkout pointer.
pub const HEAD_REF: &str = "HEAD";

/// Branch created by `init`.
pub const DEFAULT_BRANCH: &str = "main";

/// Maximum number of symbolic hops before a chain is declared cyclic.
const MAX_SYMBOLIC_HOPS: usize = 10;

/// Full ref name of a branch.
pub fn branch_ref(name: &str) -> String {
    format!("refs/heads/{name}")
}

/// Full ref name of a tag.
pub fn tag_ref(name: &str) -> String {
    format!("refs/tags/{name}")
}

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum RefError {
    #[error("Ref {name} not found")]
    NotFound { name: String },
    #[error("Ref {name} already exists")]
    AlreadyExists { name: String },
    #[error("Symbolic ref chain starting at {name} exceeds {max} hops", max = MAX_SYMBOLIC_HOPS)]
    Cycle { name: String },
    #[error("Invalid ref name {name:?}")]
    InvalidName { name: String },
    #[error("Ref {name} has an unparseable target")]
    Parse { name: String },
    #[error(transparent)]
    Lock(#[from] FileLockError),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// A named pointer: directly to an object, or to another ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// 40-hex id.
    Direct(ObjectId),
    /// `ref: <name>`.
    Symbolic(String),
}

/// The file-backed ref store rooted at the repository directory.
#[derive(Debug, Clone)]
pub struct RefStore {
    path: PathBuf,
}

impl RefStore {
    /// Creates `refs/heads`, `refs/tags`, and a HEAD pointing at the unborn
    /// default branch.
    pub fn init(path: &Path) -> Result<Self, RefError> {
        for dir in ["refs", "refs/heads", "refs/tags"] {
            ensure_dir(&path.join(dir))?;
        }
        let store = Self::load(path);
        store.set_head_to_branch(DEFAULT_BRANCH)?;
        Ok(store)
    }

    /// Returns a store over an existing repository directory.
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf, RefError> {
        validate_ref_name(name)?;
        Ok(self.path.join(name))
    }

    /// Reads a single ref without following symbolic targets. Returns `None`
    /// if the ref does not exist.
    pub fn read(&self, name: &str) -> Result<Option<RefTarget>, RefError> {
        let path = self.ref_path(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PathError::new(path, err).into()),
        };
        let line = content.trim_end_matches('\n');
        if let Some(target) = line.strip_prefix("ref: ") {
            Ok(Some(RefTarget::Symbolic(target.to_string())))
        } else if let Some(id) = ObjectId::try_from_hex(line) {
            Ok(Some(RefTarget::Direct(id)))
        } else {
            Err(RefError::Parse {
                name: name.to_string(),
            })
        }
    }

    /// Resolves a ref to a direct id, following symbolic targets with a hop
    /// bound to defeat cycles.
    pub fn resolve(&self, name: &str) -> Result<ObjectId, RefError> {
        let mut current = name.to_string();
        for _ in 0..MAX_SYMBOLIC_HOPS {
            match self.read(&current)? {
                None => {
                    return Err(RefError::NotFound { name: current });
                }
                Some(RefTarget::Direct(id)) => return Ok(id),
                Some(RefTarget::Symbolic(next)) => current = next,
            }
        }
        Err(RefError::Cycle {
            name: name.to_string(),
        })
    }

    /// Writes a ref atomically: lock, temp file, rename, unlock.
    pub fn write(&self, name: &str, target: &RefTarget) -> Result<(), RefError> {
        let path = self.ref_path(name)?;
        let dir = path.parent().unwrap();
        fs::create_dir_all(dir).at(dir)?;
        let _lock = FileLock::acquire(&path)?;
        let line = match target {
            RefTarget::Direct(id) => format!("{}\n", id.hex()),
            RefTarget::Symbolic(target) => format!("ref: {target}\n"),
        };
        write_file_atomic(&path, line.as_bytes())?;
        tracing::debug!(name, ?target, "updated ref");
        Ok(())
    }

    /// Points a ref directly at an object.
    pub fn write_direct(&self, name: &str, id: &ObjectId) -> Result<(), RefError> {
        self.write(name, &RefTarget::Direct(id.clone()))
    }

    /// Deletes a ref. Missing refs are an error.
    pub fn delete(&self, name: &str) -> Result<(), RefError> {
        let path = self.ref_path(name)?;
        let _lock = FileLock::acquire(&path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(RefError::NotFound {
                name: name.to_string(),
            }),
            Err(err) => Err(PathError::new(path, err).into()),
        }
    }

    /// Creates `refs/heads/<name>`, failing if the branch already exists.
    pub fn create_branch(&self, name: &str, id: &ObjectId) -> Result<(), RefError> {
        let full = branch_ref(name);
        if self.read(&full)?.is_some() {
            return Err(RefError::AlreadyExists { name: full });
        }
        self.write_direct(&full, id)
    }

    /// Lists `(short name, id)` pairs under a namespace such as
    /// `refs/heads`, fully resolving each ref. Nested names use `/`.
    pub fn list(&self, namespace: &str) -> Result<Vec<(String, ObjectId)>, RefError> {
        let root = self.ref_path(namespace)?;
        let mut out = vec![];
        if root.is_dir() {
            self.list_dir(&root, namespace, "", &mut out)?;
        }
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(out)
    }

    fn list_dir(
        &self,
        dir: &Path,
        namespace: &str,
        prefix: &str,
        out: &mut Vec<(String, ObjectId)>,
    ) -> Result<(), RefError> {
        for entry in dir.read_dir().at(dir)? {
            let entry = entry.at(dir)?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.ends_with(".lock") {
                continue;
            }
            let short = if prefix.is_empty() {
                file_name.clone()
            } else {
                format!("{prefix}/{file_name}")
            };
            let file_type = entry.file_type().at(entry.path())?;
            if file_type.is_dir() {
                self.list_dir(&entry.path(), namespace, &short, out)?;
            } else {
                let id = self.resolve(&format!("{namespace}/{short}"))?;
                out.push((short, id));
            }
        }
        Ok(())
    }

    /// Reads HEAD without resolving.
    pub fn head(&self) -> Result<Option<RefTarget>, RefError> {
        self.read(HEAD_REF)
    }

    /// Resolves HEAD to a commit id. Returns `None` on an unborn branch
    /// (HEAD names a branch that has no commits yet).
    pub fn resolve_head(&self) -> Result<Option<ObjectId>, RefError> {
        match self.head()? {
            None => Err(RefError::NotFound {
                name: HEAD_REF.to_string(),
            }),
            Some(RefTarget::Direct(id)) => Ok(Some(id)),
            Some(RefTarget::Symbolic(branch)) => match self.resolve(&branch) {
                Ok(id) => Ok(Some(id)),
                Err(RefError::NotFound { .. }) => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    /// Points HEAD at a branch (which need not exist yet).
    pub fn set_head_to_branch(&self, name: &str) -> Result<(), RefError> {
        self.write(HEAD_REF, &RefTarget::Symbolic(branch_ref(name)))
    }

    /// Detaches HEAD onto a specific commit.
    pub fn set_head_detached(&self, id: &ObjectId) -> Result<(), RefError> {
        self.write(HEAD_REF, &RefTarget::Direct(id.clone()))
    }

    /// The branch HEAD points at, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>, RefError> {
        match self.head()? {
            Some(RefTarget::Symbolic(target)) => {
                Ok(target.strip_prefix("refs/heads/").map(|s| s.to_string()))
            }
            _ => Ok(None),
        }
    }
}

fn validate_ref_name(name: &str) -> Result<(), RefError> {
    let invalid = || RefError::InvalidName {
        name: name.to_string(),
    };
    if name.is_empty() || name.starts_with('/') || name.ends_with('/') {
        return Err(invalid());
    }
    for component in name.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(invalid());
        }
        if component.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(invalid());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn new_store() -> (tempfile::TempDir, RefStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = RefStore::init(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    fn commit_id(byte: u8) -> ObjectId {
        ObjectId::from_bytes(&[byte; 20])
    }

    #[test]
    fn test_head_starts_on_unborn_default_branch() {
        let (_temp_dir, store) = new_store();
        assert_eq!(
            store.head().unwrap(),
            Some(RefTarget::Symbolic("refs/heads/main".to_string()))
        );
        assert_eq!(store.resolve_head().unwrap(), None);
        assert_eq!(store.current_branch().unwrap(), Some("main".to_string()));
    }

    #[test]
    fn test_symbolic_chain_resolution_is_bounded() {
        let (_temp_dir, store) = new_store();
        store
            .write("refs/heads/a", &RefTarget::Symbolic("refs/heads/b".to_string()))
            .unwrap();
        store
            .write("refs/heads/b", &RefTarget::Symbolic("refs/heads/a".to_string()))
            .unwrap();
        assert_matches!(store.resolve("refs/heads/a"), Err(RefError::Cycle { .. }));
    }

    #[test]
    fn test_create_branch_refuses_to_overwrite() {
        let (_temp_dir, store) = new_store();
        store.create_branch("topic", &commit_id(1)).unwrap();
        assert_matches!(
            store.create_branch("topic", &commit_id(2)),
            Err(RefError::AlreadyExists { .. })
        );
        assert_eq!(store.resolve("refs/heads/topic").unwrap(), commit_id(1));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let (_temp_dir, store) = new_store();
        for name in ["", "/abs", "trailing/", "refs/../escape", "refs/./x"] {
            assert_matches!(store.read(name), Err(RefError::InvalidName { .. }), "{name}");
        }
    }

    #[test]
    fn test_list_walks_nested_branches() {
        let (_temp_dir, store) = new_store();
        store.create_branch("main", &commit_id(1)).unwrap();
        store.create_branch("feature/deep/topic", &commit_id(2)).unwrap();
        let branches = store.list("refs/heads").unwrap();
        assert_eq!(
            branches,
            vec![
                ("feature/deep/topic".to_string(), commit_id(2)),
                ("main".to_string(), commit_id(1)),
            ]
        );
    }
}
