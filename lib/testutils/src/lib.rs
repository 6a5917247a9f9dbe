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

use std::fs;
use std::path::Path;

use minigit_lib::object::Signature;
use minigit_lib::object_id::ObjectId;
use minigit_lib::repo::Repository;
use tempfile::TempDir;

pub fn new_temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("minigit-test-")
        .tempdir()
        .unwrap()
}

pub fn signature(name: &str, timestamp: i64) -> Signature {
    Signature {
        name: name.to_string(),
        email: format!("{name}@example.com"),
        timestamp,
        tz_offset: 0,
    }
}

/// A repository in a temp dir that lives as long as this value.
pub struct TestRepo {
    pub repo: Repository,
    _temp_dir: TempDir,
}

impl TestRepo {
    pub fn init() -> Self {
        let temp_dir = new_temp_dir();
        let repo = Repository::init(temp_dir.path()).unwrap();
        Self {
            repo,
            _temp_dir: temp_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.repo.root()
    }

    pub fn write_file(&self, path: &str, content: impl AsRef<[u8]>) {
        let disk_path = self.repo.root().join(path);
        if let Some(parent) = disk_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(disk_path, content.as_ref()).unwrap();
    }

    pub fn read_file(&self, path: &str) -> String {
        fs::read_to_string(self.repo.root().join(path)).unwrap()
    }

    pub fn stage(&self, paths: &[&str]) {
        let mut index = self.repo.load_index().unwrap();
        for path in paths {
            self.repo.stage_path(&mut index, path).unwrap();
        }
        self.repo.save_index(&index).unwrap();
    }

    pub fn commit(&self, message: &str, timestamp: i64) -> ObjectId {
        self.repo
            .commit(message, &signature("test", timestamp))
            .unwrap()
    }

    /// Writes, stages, and commits a single file.
    pub fn commit_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        timestamp: i64,
    ) -> ObjectId {
        self.write_file(path, content);
        self.stage(&[path]);
        self.commit(message, timestamp)
    }
}
