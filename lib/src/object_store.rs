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

//! Loose-object storage addressed by content hash.
//!
//! Objects live at `objects/<xx>/<yy...>` where `xx` is the first two hex
//! digits of the id. Writes are idempotent: the same payload always lands at
//! the same path with byte-identical content, so concurrent writers need no
//! coordination beyond write-to-temp-then-rename.

use std::fs;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::file_util::ensure_dir;
use crate::hash;
use crate::object;
use crate::object::Commit;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::object::Tag;
use crate::object::Tree;
use crate::object_id::HexPrefix;
use crate::object_id::ObjectId;
use crate::object_id::PrefixResolution;

/// Minimum number of hex digits accepted as a short hash.
pub const MIN_PREFIX_LEN: usize = 4;

const DIR_PERMISSIONS: u32 = 0o755;
const FILE_PERMISSIONS: u32 = 0o644;

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object {hash} not found")]
    NotFound { hash: String },
    #[error("Hash prefix \"{prefix}\" is ambiguous")]
    AmbiguousPrefix { prefix: String },
    #[error("Object {hash} is corrupt: {reason}")]
    CorruptObject { hash: String, reason: String },
    #[error("Expected {hash} to be a {expected} object, but it is a {actual}")]
    UnexpectedKind {
        hash: String,
        expected: ObjectKind,
        actual: ObjectKind,
    },
    #[error(transparent)]
    Io(#[from] PathError),
}

impl StoreError {
    fn corrupt(id: &ObjectId, reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            hash: id.hex(),
            reason: reason.into(),
        }
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// The loose-object store rooted at an `objects/` directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    path: PathBuf,
}

impl ObjectStore {
    /// Creates the `objects/` directory and returns a store over it.
    pub fn init(path: &Path) -> Result<Self, StoreError> {
        ensure_dir(path)?;
        set_permissions(path, DIR_PERMISSIONS).at(path)?;
        Ok(Self::load(path))
    }

    /// Returns a store over an existing `objects/` directory.
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.hex();
        self.path.join(&hex[..2]).join(&hex[2..])
    }

    /// Writes a typed payload and returns its id. Writing the same payload
    /// twice leaves the store unchanged the second time.
    pub fn write(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId, StoreError> {
        let id = hash::hash_object(kind, payload);
        let path = self.object_path(&id);
        if path.exists() {
            tracing::trace!(%id, %kind, "object already present");
            return Ok(id);
        }
        let dir = path.parent().unwrap();
        ensure_dir(dir)?;
        set_permissions(dir, DIR_PERMISSIONS).at(dir)?;

        let mut data = hash::object_header(kind, payload.len());
        data.extend_from_slice(payload);
        let compressed = hash::deflate(&data).at(&path)?;

        let mut temp_file = NamedTempFile::new_in(&self.path).at(&self.path)?;
        temp_file.write_all(&compressed).at(temp_file.path())?;
        set_permissions(temp_file.path(), FILE_PERMISSIONS).at(temp_file.path())?;
        temp_file.as_file().sync_data().at(temp_file.path())?;
        if let Err(err) = temp_file.persist(&path) {
            // The same id always carries byte-identical content, so losing a
            // rename race to a concurrent writer still leaves a valid object
            // in place.
            if !path.exists() {
                return Err(PathError::new(&path, err.error).into());
            }
        }
        tracing::trace!(%id, %kind, len = payload.len(), "wrote object");
        Ok(id)
    }

    /// Encodes and writes any object.
    pub fn write_object(&self, object: &Object) -> Result<ObjectId, StoreError> {
        self.write(object.kind(), &object::encode(object))
    }

    /// Reads the kind and payload of an object, verifying the stored length
    /// header against the payload.
    pub fn read(&self, id: &ObjectId) -> Result<(ObjectKind, Vec<u8>), StoreError> {
        let path = self.object_path(id);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { hash: id.hex() });
            }
            Err(err) => return Err(PathError::new(path, err).into()),
        };
        let data = hash::inflate(&compressed)
            .map_err(|err| StoreError::corrupt(id, format!("zlib: {err}")))?;
        let nul = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StoreError::corrupt(id, "missing header terminator"))?;
        let header = &data[..nul];
        let payload = data[nul + 1..].to_vec();
        let space = header
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| StoreError::corrupt(id, "malformed header"))?;
        let kind = ObjectKind::from_name(&header[..space])
            .ok_or_else(|| StoreError::corrupt(id, "unknown object kind"))?;
        let len: usize = std::str::from_utf8(&header[space + 1..])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| StoreError::corrupt(id, "malformed length header"))?;
        if len != payload.len() {
            return Err(StoreError::corrupt(
                id,
                format!("length header says {len}, payload has {} bytes", payload.len()),
            ));
        }
        Ok((kind, payload))
    }

    /// Reads and decodes an object.
    pub fn read_object(&self, id: &ObjectId) -> Result<Object, StoreError> {
        let (kind, payload) = self.read(id)?;
        object::decode(kind, &payload).map_err(|err| StoreError::corrupt(id, err.to_string()))
    }

    /// Reads an object that must be a commit.
    pub fn read_commit(&self, id: &ObjectId) -> Result<Commit, StoreError> {
        match self.read_object(id)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(unexpected_kind(id, ObjectKind::Commit, &other)),
        }
    }

    /// Reads an object that must be a tree.
    pub fn read_tree(&self, id: &ObjectId) -> Result<Tree, StoreError> {
        match self.read_object(id)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(unexpected_kind(id, ObjectKind::Tree, &other)),
        }
    }

    /// Reads an object that must be a blob.
    pub fn read_blob(&self, id: &ObjectId) -> Result<Vec<u8>, StoreError> {
        match self.read_object(id)? {
            Object::Blob(data) => Ok(data),
            other => Err(unexpected_kind(id, ObjectKind::Blob, &other)),
        }
    }

    /// Reads an object that must be a tag.
    pub fn read_tag(&self, id: &ObjectId) -> Result<Tag, StoreError> {
        match self.read_object(id)? {
            Object::Tag(tag) => Ok(tag),
            other => Err(unexpected_kind(id, ObjectKind::Tag, &other)),
        }
    }

    /// Whether an object with this id has been written.
    pub fn exists(&self, id: &ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// Scans the store for ids starting with `prefix`.
    pub fn resolve_prefix(&self, prefix: &HexPrefix) -> Result<PrefixResolution<ObjectId>, StoreError> {
        let hex = prefix.hex();
        if hex.len() < 2 {
            // Would require scanning every fan-out directory; the public
            // entry point enforces a longer minimum anyway.
            return Ok(PrefixResolution::NoMatch);
        }
        let dir = self.path.join(&hex[..2]);
        let entries = match dir.read_dir() {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(PrefixResolution::NoMatch);
            }
            Err(err) => return Err(PathError::new(dir, err).into()),
        };
        let mut found: Option<ObjectId> = None;
        for entry in entries {
            let entry = entry.at(&dir)?;
            let Some(name) = entry.file_name().to_str().map(|s| s.to_owned()) else {
                continue;
            };
            let Some(id) = ObjectId::try_from_hex(format!("{}{}", &hex[..2], name)) else {
                continue;
            };
            if prefix.matches(&id) {
                if found.is_some() {
                    return Ok(PrefixResolution::AmbiguousMatch);
                }
                found = Some(id);
            }
        }
        Ok(match found {
            Some(id) => PrefixResolution::SingleMatch(id),
            None => PrefixResolution::NoMatch,
        })
    }

    /// Expands a short hash of at least [`MIN_PREFIX_LEN`] hex digits to the
    /// unique matching id.
    pub fn resolve_short(&self, text: &str) -> Result<ObjectId, StoreError> {
        let not_found = || StoreError::NotFound {
            hash: text.to_string(),
        };
        if !(MIN_PREFIX_LEN..=40).contains(&text.len()) {
            return Err(not_found());
        }
        let prefix = HexPrefix::try_from_hex(text).ok_or_else(not_found)?;
        match self.resolve_prefix(&prefix)? {
            PrefixResolution::SingleMatch(id) => Ok(id),
            PrefixResolution::NoMatch => Err(not_found()),
            PrefixResolution::AmbiguousMatch => Err(StoreError::AmbiguousPrefix {
                prefix: text.to_string(),
            }),
        }
    }
}

fn unexpected_kind(id: &ObjectId, expected: ObjectKind, actual: &Object) -> StoreError {
    StoreError::UnexpectedKind {
        hash: id.hex(),
        expected,
        actual: actual.kind(),
    }
}
