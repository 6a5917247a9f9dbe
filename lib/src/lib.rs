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

//! Library for minigit, a content-addressed version control engine.
//!
//! The crate is split into a storage half (object store, refs, index,
//! commit graph, working copy) and a pure-text half (diff, unified
//! patches, three-way merge, conflict markers). The text half has no
//! dependency on the storage half and is reusable as a standalone
//! diff/merge/patch library.

#![warn(missing_docs)]

pub mod config;
pub mod conflicts;
pub mod diff;
pub mod file_util;
pub mod hash;
pub mod hex_util;
pub mod index;
pub mod lock;
pub mod merge;
pub mod object;
pub mod object_id;
pub mod object_store;
pub mod patch;
pub mod refs;
pub mod repo;
pub mod revwalk;
pub mod unified;
pub mod working_copy;
