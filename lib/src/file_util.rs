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

//! Atomic file plumbing shared by the ref store and the index.

use std::fs;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

/// An I/O failure annotated with the path it happened on.
#[derive(Debug, Error)]
#[error("I/O error at {path}")]
pub struct PathError {
    /// The offending path.
    pub path: PathBuf,
    /// The underlying failure.
    pub source: io::Error,
}

impl PathError {
    /// Wraps an `io::Error` with the path it was raised for.
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Attaches the offending path to a raw `io::Result`.
pub trait IoResultExt<T> {
    /// Maps the error to a [`PathError`] carrying `path`.
    fn at(self, path: impl AsRef<Path>) -> Result<T, PathError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T, PathError> {
        self.map_err(|source| PathError::new(path.as_ref(), source))
    }
}

/// Creates a single directory if it is not there yet. Unlike
/// `create_dir_all`, the parent must already exist, which keeps repository
/// initialization honest about its layout.
pub fn ensure_dir(dir: &Path) -> Result<(), PathError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(err) => Err(PathError::new(dir, err)),
    }
}

/// Replaces `target` with `content` by writing a sibling temp file, syncing
/// it, and renaming over the live file. Readers see either the old content
/// or the new, never a torn write.
pub fn write_file_atomic(target: &Path, content: &[u8]) -> Result<(), PathError> {
    let dir = target.parent().expect("target is inside a directory");
    let mut temp_file = NamedTempFile::new_in(dir).at(dir)?;
    temp_file.write_all(content).at(temp_file.path())?;
    temp_file.as_file().sync_data().at(temp_file.path())?;
    temp_file
        .persist(target)
        .map_err(|err| PathError::new(target, err.error))?;
    Ok(())
}
