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

//! Repository configuration (`config.toml` in the repository directory).
//!
//! The library itself reads no environment variables; identity comes from
//! here or from explicit caller arguments.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::file_util::PathError;
use crate::object::Signature;

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot parse config file {path}")]
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Io(#[from] PathError),
}

/// `[user]` table: who commits are attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Person name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The full parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Commit identity.
    #[serde(default)]
    pub user: UserConfig,
}

impl RepoConfig {
    /// Loads the configuration. A missing file is the default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(PathError::new(path, err).into()),
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the configuration.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).expect("config is serializable");
        fs::write(path, content).map_err(|err| PathError::new(path, err).into())
    }

    /// Builds a signature from the configured identity and the given clock
    /// reading, substituting placeholders for unset fields.
    pub fn signature(&self, timestamp: i64, tz_offset: i32) -> Signature {
        Signature {
            name: self.user.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            email: self
                .user
                .email
                .clone()
                .unwrap_or_else(|| "unknown@example.invalid".to_string()),
            timestamp,
            tz_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = RepoConfig::load(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, RepoConfig::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        let config = RepoConfig {
            user: UserConfig {
                name: Some("Test User".to_string()),
                email: Some("test.user@example.com".to_string()),
            },
        };
        config.save(&path).unwrap();
        assert_eq!(RepoConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_signature_fills_placeholders() {
        let signature = RepoConfig::default().signature(1700000000, 60);
        assert_eq!(signature.name, "Unknown");
        assert_eq!(signature.email, "unknown@example.invalid");
        assert_eq!(signature.timestamp, 1700000000);
        assert_eq!(signature.tz_offset, 60);
    }
}
