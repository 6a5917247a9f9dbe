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

//! Exclusive-create file locks guarding mutable repository state.

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum FileLockError {
    #[error("Lock file {path} is held by another process")]
    Locked { path: PathBuf },
    #[error("Cannot create lock file {path}")]
    Io { path: PathBuf, source: io::Error },
}

/// A `<name>.lock` file created exclusively and removed on drop.
///
/// Readers take no lock; the protected file itself is only ever replaced by
/// atomic rename, so the lock serializes writers without blocking readers.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires `<target>.lock` next to `target`, failing immediately with
    /// [`FileLockError::Locked`] if another writer holds it.
    pub fn acquire(target: &Path) -> Result<Self, FileLockError> {
        let mut name = target.as_os_str().to_owned();
        name.push(".lock");
        let lock_path = PathBuf::from(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_file) => Ok(Self { lock_path }),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(FileLockError::Locked { path: lock_path })
            }
            Err(err) => Err(FileLockError::Io {
                path: lock_path,
                source: err,
            }),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.lock_path) {
            tracing::warn!(?err, path = ?self.lock_path, "failed to remove lock file");
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("index");

        let lock = FileLock::acquire(&target).unwrap();
        assert_matches!(
            FileLock::acquire(&target),
            Err(FileLockError::Locked { .. })
        );
        drop(lock);
        // Released locks can be re-acquired.
        FileLock::acquire(&target).unwrap();
    }
}
