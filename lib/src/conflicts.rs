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

//! Conflict-marker parsing and resolution.
//!
//! Markers are exactly seven bytes (`<<<<<<<`, `|||||||`, `=======`,
//! `>>>>>>>`) at the start of a line, optionally followed by a space and a
//! label. Text produced by [`crate::merge::merge3`] can be re-parsed here
//! and resolved conflict by conflict.

use serde::Serialize;

use crate::diff::split_lines;

/// Opens the "ours" section.
pub const CONFLICT_START_MARKER: &str = "<<<<<<<";
/// Opens the base section (diff3 style only).
pub const CONFLICT_BASE_MARKER: &str = "|||||||";
/// Separates "ours" from "theirs".
pub const CONFLICT_SEPARATOR_MARKER: &str = "=======";
/// Closes the conflict.
pub const CONFLICT_END_MARKER: &str = ">>>>>>>";

/// An unresolved region of a merged text. Line numbers are 1-based and
/// refer to the text the conflict was extracted from: `start_line` is the
/// opening marker, `end_line` the closing marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Lines of the "ours" section.
    pub ours: Vec<String>,
    /// Lines of the base section, present only with diff3-style markers.
    pub base: Option<Vec<String>>,
    /// Lines of the "theirs" section.
    pub theirs: Vec<String>,
    /// Line of the `<<<<<<<` marker.
    pub start_line: usize,
    /// Line of the `>>>>>>>` marker.
    pub end_line: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Start,
    Base,
    Separator,
    End,
}

fn marker_kind(line: &str) -> Option<MarkerKind> {
    let markers = [
        (CONFLICT_START_MARKER, MarkerKind::Start),
        (CONFLICT_BASE_MARKER, MarkerKind::Base),
        (CONFLICT_SEPARATOR_MARKER, MarkerKind::Separator),
        (CONFLICT_END_MARKER, MarkerKind::End),
    ];
    for (marker, kind) in markers {
        if let Some(rest) = line.strip_prefix(marker)
            && (rest.is_empty() || rest.starts_with(' '))
        {
            return Some(kind);
        }
    }
    None
}

/// Whether the text contains at least one well-formed conflict.
///
/// Equivalent to `!extract_conflicts(text).is_empty()`: a quick scan for an
/// opening marker short-circuits the common case.
pub fn has_conflicts(text: &str) -> bool {
    if !text.contains(CONFLICT_START_MARKER) {
        return false;
    }
    !extract_conflicts(text).is_empty()
}

/// Walks the text once, pairing markers into [`Conflict`]s. The base
/// section is filled only when a `|||||||` section is present. Unterminated
/// or out-of-order marker runs are ignored.
pub fn extract_conflicts(text: &str) -> Vec<Conflict> {
    enum State {
        Outside,
        Ours,
        Base,
        Theirs,
    }
    let mut conflicts = vec![];
    let mut state = State::Outside;
    let mut start_line = 0;
    let mut ours = vec![];
    let mut base: Option<Vec<String>> = None;
    let mut theirs = vec![];
    for (lineno, line) in split_lines(text).iter().enumerate() {
        let lineno = lineno + 1;
        let marker = marker_kind(line);
        if marker == Some(MarkerKind::Start) {
            // A fresh opening marker always restarts collection; whatever
            // came before it was not a complete conflict.
            state = State::Ours;
            start_line = lineno;
            ours = vec![];
            base = None;
            theirs = vec![];
            continue;
        }
        match state {
            State::Outside => {}
            State::Ours => match marker {
                Some(MarkerKind::Base) => {
                    base = Some(vec![]);
                    state = State::Base;
                }
                Some(MarkerKind::Separator) => state = State::Theirs,
                _ => ours.push(line.to_string()),
            },
            State::Base => match marker {
                Some(MarkerKind::Separator) => state = State::Theirs,
                _ => base.as_mut().unwrap().push(line.to_string()),
            },
            State::Theirs => match marker {
                Some(MarkerKind::End) => {
                    conflicts.push(Conflict {
                        ours: std::mem::take(&mut ours),
                        base: base.take(),
                        theirs: std::mem::take(&mut theirs),
                        start_line,
                        end_line: lineno,
                    });
                    state = State::Outside;
                }
                _ => theirs.push(line.to_string()),
            },
        }
    }
    conflicts
}

/// Rewrites only the `index`-th conflict (0-based). A resolution of
/// `"ours"`, `"theirs"`, or `"base"` substitutes the respective section;
/// any other string is a literal replacement, split on LF with a trailing
/// empty segment dropped. Returns `None` if there is no such conflict.
pub fn resolve_conflict(text: &str, index: usize, resolution: &str) -> Option<String> {
    let conflicts = extract_conflicts(text);
    let conflict = conflicts.get(index)?;
    let replacement: Vec<String> = match resolution {
        "ours" => conflict.ours.clone(),
        "theirs" => conflict.theirs.clone(),
        "base" => conflict.base.clone().unwrap_or_default(),
        literal => {
            let mut lines: Vec<String> = literal.split('\n').map(|s| s.to_string()).collect();
            if lines.last().is_some_and(|s| s.is_empty()) {
                lines.pop();
            }
            lines
        }
    };
    let mut lines: Vec<String> = split_lines(text).iter().map(|s| s.to_string()).collect();
    lines.splice(conflict.start_line - 1..conflict.end_line, replacement);
    if lines.is_empty() {
        return Some(String::new());
    }
    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}
