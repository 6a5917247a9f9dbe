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

#![expect(missing_docs)]

use std::fmt;
use std::fmt::Debug;

use crate::hex_util;

/// Length of an object id in bytes.
pub const OBJECT_ID_LENGTH: usize = 20;

/// A 20-byte SHA-1 digest, canonically rendered as 40 lowercase hex digits.
/// The digest is both the identity and the storage address of an object.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct ObjectId(Vec<u8>);

impl ObjectId {
    pub fn new(value: Vec<u8>) -> Self {
        debug_assert_eq!(value.len(), OBJECT_ID_LENGTH);
        Self(value)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Parses the given hex string into an id.
    ///
    /// The given string must be valid. A static str is required to prevent
    /// API misuse.
    pub fn from_hex(hex: &'static str) -> Self {
        Self::try_from_hex(hex).unwrap()
    }

    /// Parses the given 40-digit hex string into an id.
    pub fn try_from_hex(hex: impl AsRef<[u8]>) -> Option<Self> {
        let hex = hex.as_ref();
        if hex.len() != 2 * OBJECT_ID_LENGTH {
            return None;
        }
        hex_util::decode_hex(hex).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn hex(&self) -> String {
        hex_util::encode_hex(&self.0)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("ObjectId").field(&self.hex()).finish()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.pad(&self.hex())
    }
}

impl serde::Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            self.hex().serialize(serializer)
        } else {
            self.as_bytes().serialize(serializer)
        }
    }
}

/// A short hash: between zero and forty hex digits, matched against the
/// rendered form of full ids. Keeping the digits as text sidesteps the
/// half-byte bookkeeping an odd-length prefix would otherwise need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexPrefix {
    hex: String,
}

impl HexPrefix {
    /// Validates and lowercases a prefix. Returns `None` if `prefix` is not
    /// hex or is longer than a full id.
    pub fn try_from_hex(prefix: impl AsRef<[u8]>) -> Option<Self> {
        let prefix = prefix.as_ref();
        if prefix.len() > 2 * OBJECT_ID_LENGTH {
            return None;
        }
        if !prefix.iter().all(|digit| digit.is_ascii_hexdigit()) {
            return None;
        }
        let hex = std::str::from_utf8(prefix).ok()?.to_ascii_lowercase();
        Some(Self { hex })
    }

    /// The prefix digits, lowercase.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Number of hex digits in the prefix.
    pub fn len(&self) -> usize {
        self.hex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }

    /// Whether the rendering of `id` starts with this prefix.
    pub fn matches(&self, id: &ObjectId) -> bool {
        id.hex().starts_with(&self.hex)
    }
}

/// The result of a prefix search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixResolution<T> {
    NoMatch,
    SingleMatch(T),
    AmbiguousMatch,
}
