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

//! The four object kinds and their wire codec.
//!
//! Every object is stored as `"<kind> <length>\0<payload>"`, zlib-deflated.
//! This module defines the in-memory shapes and the payload encoding; the
//! header and compression live in [`crate::hash`] and
//! [`crate::object_store`].

use std::cmp::Ordering;
use std::fmt;

use bstr::BString;
use bstr::ByteSlice as _;
use thiserror::Error;

use crate::object_id::OBJECT_ID_LENGTH;
use crate::object_id::ObjectId;

/// Discriminant of the closed object sum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Opaque user data.
    Blob,
    /// Ordered directory listing.
    Tree,
    /// A snapshot with ancestry.
    Commit,
    /// An annotated tag.
    Tag,
}

impl ObjectKind {
    /// The kind name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    /// Parses a wire kind name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            b"tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mode of a tree entry, stored as an octal string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Regular file (`100644`).
    Normal,
    /// Executable file (`100755`).
    Executable,
    /// Subtree (`040000`, written `40000`).
    Tree,
    /// Symbolic link (`120000`).
    Symlink,
}

impl FileMode {
    /// The octal string written to tree payloads. Leading zeros are dropped
    /// to stay compatible with the canonical wire format.
    pub fn as_octal_str(self) -> &'static str {
        match self {
            Self::Normal => "100644",
            Self::Executable => "100755",
            Self::Tree => "40000",
            Self::Symlink => "120000",
        }
    }

    /// Parses an octal mode string, tolerating a leading zero on subtrees.
    pub fn from_octal(mode: &[u8]) -> Option<Self> {
        match mode {
            b"100644" => Some(Self::Normal),
            b"100755" => Some(Self::Executable),
            b"40000" | b"040000" => Some(Self::Tree),
            b"120000" => Some(Self::Symlink),
            _ => None,
        }
    }

    /// Whether this entry points at a subtree.
    pub fn is_tree(self) -> bool {
        matches!(self, Self::Tree)
    }
}

/// A single `(mode, name, child id)` row of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry mode.
    pub mode: FileMode,
    /// Entry name. Non-empty, no `/`, no NUL.
    pub name: String,
    /// Id of the referenced blob or subtree.
    pub id: ObjectId,
}

// Trees are ordered by a byte comparison in which directory entries behave
// as if a trailing `/` were appended to their name.
fn cmp_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    let suffix = |entry: &TreeEntry| if entry.mode.is_tree() { &b"/"[..] } else { &b""[..] };
    let a_key = a.name.as_bytes().iter().chain(suffix(a));
    let b_key = b.name.as_bytes().iter().chain(suffix(b));
    a_key.cmp(b_key)
}

/// An ordered sequence of entries, sorted and distinct by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree from entries in any order.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(cmp_entries);
        debug_assert!(entries.windows(2).all(|w| w[0].name != w[1].name));
        Self { entries }
    }

    /// Builds a tree from entries already in wire order.
    pub fn from_sorted_entries(entries: Vec<TreeEntry>) -> Self {
        Self { entries }
    }

    /// Entries in wire order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `Name <email> unix-timestamp ±HHMM`, as carried by commit and tag
/// headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Person name.
    pub name: String,
    /// Email address (without the angle brackets).
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes east of UTC.
    pub tz_offset: i32,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let offset = self.tz_offset.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            sign,
            offset / 60,
            offset % 60
        )
    }
}

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Zero or more parent commits.
    pub parents: Vec<ObjectId>,
    /// Who wrote the change.
    pub author: Signature,
    /// Who created the commit.
    pub committer: Signature,
    /// Commit message, preserved byte-for-byte.
    pub message: BString,
}

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The tagged object.
    pub object: ObjectId,
    /// Kind of the tagged object.
    pub kind: ObjectKind,
    /// Tag name.
    pub name: String,
    /// Who created the tag, if recorded.
    pub tagger: Option<Signature>,
    /// Tag message, preserved byte-for-byte.
    pub message: BString,
}

/// A decoded object of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// Opaque bytes.
    Blob(Vec<u8>),
    /// Directory listing.
    Tree(Tree),
    /// Snapshot with ancestry.
    Commit(Commit),
    /// Annotated tag.
    Tag(Tag),
}

impl Object {
    /// The wire discriminant of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }
}

/// Structural decoding failure. Only trees fail structurally; commit and tag
/// bodies decode best-effort so that hand-written fixtures survive.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A tree entry row could not be split into mode, name, and id.
    #[error("Malformed tree entry: {reason}")]
    TreeEntry {
        /// What was wrong with the row.
        reason: String,
    },
    /// A tree entry carried a mode outside the four known codes.
    #[error("Unknown file mode {mode}")]
    UnknownFileMode {
        /// The unrecognized octal string.
        mode: String,
    },
}

/// Encodes any object to its wire payload (header excluded).
pub fn encode(object: &Object) -> Vec<u8> {
    match object {
        Object::Blob(data) => encode_blob(data),
        Object::Tree(tree) => encode_tree(tree),
        Object::Commit(commit) => encode_commit(commit),
        Object::Tag(tag) => encode_tag(tag),
    }
}

/// Decodes a wire payload of the given kind.
pub fn decode(kind: ObjectKind, payload: &[u8]) -> Result<Object, DecodeError> {
    match kind {
        ObjectKind::Blob => Ok(Object::Blob(payload.to_vec())),
        ObjectKind::Tree => decode_tree(payload).map(Object::Tree),
        ObjectKind::Commit => Ok(Object::Commit(decode_commit(payload))),
        ObjectKind::Tag => Ok(Object::Tag(decode_tag(payload))),
    }
}

/// Encodes a blob payload.
pub fn encode_blob(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

/// Encodes a tree payload: `mode SP name NUL <20 raw id bytes>` per entry.
pub fn encode_tree(tree: &Tree) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in tree.entries() {
        out.extend_from_slice(entry.mode.as_octal_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(entry.name.as_bytes());
        out.push(0);
        out.extend_from_slice(entry.id.as_bytes());
    }
    out
}

/// Decodes a tree payload, preserving the stored entry order.
pub fn decode_tree(payload: &[u8]) -> Result<Tree, DecodeError> {
    let mut entries = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let space = rest.find_byte(b' ').ok_or_else(|| DecodeError::TreeEntry {
            reason: "missing space after mode".to_string(),
        })?;
        let mode = FileMode::from_octal(&rest[..space]).ok_or_else(|| {
            DecodeError::UnknownFileMode {
                mode: String::from_utf8_lossy(&rest[..space]).into_owned(),
            }
        })?;
        rest = &rest[space + 1..];
        let nul = rest.find_byte(0).ok_or_else(|| DecodeError::TreeEntry {
            reason: "missing NUL after name".to_string(),
        })?;
        let name = std::str::from_utf8(&rest[..nul])
            .map_err(|_| DecodeError::TreeEntry {
                reason: "name is not valid UTF-8".to_string(),
            })?
            .to_string();
        if name.is_empty() {
            return Err(DecodeError::TreeEntry {
                reason: "empty name".to_string(),
            });
        }
        rest = &rest[nul + 1..];
        if rest.len() < OBJECT_ID_LENGTH {
            return Err(DecodeError::TreeEntry {
                reason: "truncated id".to_string(),
            });
        }
        let (id_bytes, tail) = rest.split_at(OBJECT_ID_LENGTH);
        entries.push(TreeEntry {
            mode,
            name,
            id: ObjectId::from_bytes(id_bytes),
        });
        rest = tail;
    }
    Ok(Tree::from_sorted_entries(entries))
}

fn push_message(out: &mut Vec<u8>, message: &BString) {
    out.push(b'\n');
    out.extend_from_slice(message);
    if !message.is_empty() && !message.ends_with(b"\n") {
        out.push(b'\n');
    }
}

/// Encodes a commit payload: header block, blank line, message. A final
/// newline is appended to the message if missing.
pub fn encode_commit(commit: &Commit) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("tree {}\n", commit.tree.hex()).as_bytes());
    for parent in &commit.parents {
        out.extend_from_slice(format!("parent {}\n", parent.hex()).as_bytes());
    }
    out.extend_from_slice(format!("author {}\n", commit.author).as_bytes());
    out.extend_from_slice(format!("committer {}\n", commit.committer).as_bytes());
    push_message(&mut out, &commit.message);
    out
}

/// Decodes a commit payload. Unknown or malformed headers are skipped and
/// missing fields are defaulted.
pub fn decode_commit(payload: &[u8]) -> Commit {
    let (header, message) = split_message(payload);
    let mut commit = Commit {
        tree: ObjectId::from_bytes(&[0; OBJECT_ID_LENGTH]),
        parents: vec![],
        author: Signature::default(),
        committer: Signature::default(),
        message,
    };
    for line in header.lines() {
        if let Some(value) = line.strip_prefix(b"tree ") {
            if let Some(id) = ObjectId::try_from_hex(value) {
                commit.tree = id;
            }
        } else if let Some(value) = line.strip_prefix(b"parent ") {
            if let Some(id) = ObjectId::try_from_hex(value) {
                commit.parents.push(id);
            }
        } else if let Some(value) = line.strip_prefix(b"author ") {
            commit.author = decode_signature(value);
        } else if let Some(value) = line.strip_prefix(b"committer ") {
            commit.committer = decode_signature(value);
        }
    }
    commit
}

/// Encodes a tag payload.
pub fn encode_tag(tag: &Tag) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("object {}\n", tag.object.hex()).as_bytes());
    out.extend_from_slice(format!("type {}\n", tag.kind).as_bytes());
    out.extend_from_slice(format!("tag {}\n", tag.name).as_bytes());
    if let Some(tagger) = &tag.tagger {
        out.extend_from_slice(format!("tagger {tagger}\n").as_bytes());
    }
    push_message(&mut out, &tag.message);
    out
}

/// Decodes a tag payload, best-effort like [`decode_commit`].
pub fn decode_tag(payload: &[u8]) -> Tag {
    let (header, message) = split_message(payload);
    let mut tag = Tag {
        object: ObjectId::from_bytes(&[0; OBJECT_ID_LENGTH]),
        kind: ObjectKind::Blob,
        name: String::new(),
        tagger: None,
        message,
    };
    for line in header.lines() {
        if let Some(value) = line.strip_prefix(b"object ") {
            if let Some(id) = ObjectId::try_from_hex(value) {
                tag.object = id;
            }
        } else if let Some(value) = line.strip_prefix(b"type ") {
            if let Some(kind) = ObjectKind::from_name(value) {
                tag.kind = kind;
            }
        } else if let Some(value) = line.strip_prefix(b"tag ") {
            tag.name = String::from_utf8_lossy(value).into_owned();
        } else if let Some(value) = line.strip_prefix(b"tagger ") {
            tag.tagger = Some(decode_signature(value));
        }
    }
    tag
}

// Splits a commit/tag payload at the first blank line. The message keeps its
// bytes exactly as stored.
fn split_message(payload: &[u8]) -> (&[u8], BString) {
    match payload.find(b"\n\n") {
        Some(pos) => (&payload[..pos + 1], BString::from(&payload[pos + 2..])),
        None => (payload, BString::default()),
    }
}

fn decode_signature(data: &[u8]) -> Signature {
    let mut signature = Signature::default();
    let text = String::from_utf8_lossy(data);
    let Some(lt) = text.find(" <") else {
        signature.name = text.into_owned();
        return signature;
    };
    signature.name = text[..lt].to_string();
    let Some(gt) = text[lt + 2..].find('>') else {
        return signature;
    };
    signature.email = text[lt + 2..lt + 2 + gt].to_string();
    let mut tail = text[lt + 2 + gt + 1..].split_whitespace();
    if let Some(timestamp) = tail.next() {
        signature.timestamp = timestamp.parse().unwrap_or_default();
    }
    if let Some(tz) = tail.next() {
        signature.tz_offset = decode_tz_offset(tz);
    }
    signature
}

fn decode_tz_offset(tz: &str) -> i32 {
    let (sign, digits) = match tz.split_at_checked(1) {
        Some(("-", digits)) => (-1, digits),
        Some(("+", digits)) => (1, digits),
        _ => return 0,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    let hours: i32 = digits[..2].parse().unwrap();
    let minutes: i32 = digits[2..].parse().unwrap();
    sign * (hours * 60 + minutes)
}
