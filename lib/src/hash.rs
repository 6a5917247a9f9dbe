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

//! SHA-1 hashing of typed payloads and zlib compression.

use std::io;
use std::io::Read as _;
use std::io::Write as _;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use sha1::Digest as _;
use sha1::Sha1;

use crate::object::ObjectKind;
use crate::object_id::ObjectId;

/// Formats the `"<kind> <length>\0"` header that prefixes every stored
/// object. The id of an object is computed over this header plus the payload.
pub fn object_header(kind: ObjectKind, len: usize) -> Vec<u8> {
    format!("{} {}\0", kind.name(), len).into_bytes()
}

/// Hashes a typed payload.
pub fn hash_object(kind: ObjectKind, payload: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(object_header(kind, payload.len()));
    hasher.update(payload);
    ObjectId::new(hasher.finalize().to_vec())
}

/// Compresses `data` with zlib at the default level.
pub fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompresses zlib `data`.
pub fn inflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
