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

//! Unified diffs: generation, parsing, and reversal.
//!
//! The wire format is `--- old` / `+++ new` headers followed by
//! `@@ -os,oc +ns,nc @@` hunks whose lines are prefixed with a space, `+`,
//! or `-`. Producers and consumers of this module are bit-compatible.

use serde::Serialize;
use thiserror::Error;

use crate::diff::DiffOp;
use crate::diff::DiffOptions;
use crate::diff::Hunk;
use crate::diff::diff_lines;
use crate::diff::is_binary;

/// Placeholder produced instead of a patch when either input is binary.
pub const BINARY_PATCH: &str = "Binary files differ\n";

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum PatchParseError {
    #[error("Patch has no `---` header")]
    MissingOldHeader,
    #[error("Patch has no `+++` header")]
    MissingNewHeader,
    #[error("Malformed hunk header: {line}")]
    HunkHeader { line: String },
}

/// One prefixed line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchLine {
    /// `' '` (context), `'+'` (addition), or `'-'` (removal).
    pub origin: char,
    /// Line content without the prefix or terminator.
    pub content: String,
}

/// One `@@` hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchHunk {
    /// First line of the hunk in the old file (1-based).
    pub old_start: usize,
    /// Number of old-file lines the hunk covers.
    pub old_count: usize,
    /// First line of the hunk in the new file (1-based).
    pub new_start: usize,
    /// Number of new-file lines the hunk covers.
    pub new_count: usize,
    /// Prefixed lines in order.
    pub lines: Vec<PatchLine>,
}

/// A parsed unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    /// Name from the `---` header.
    pub old_file: String,
    /// Name from the `+++` header.
    pub new_file: String,
    /// Hunks in file order.
    pub hunks: Vec<PatchHunk>,
}

/// Generates a unified diff between two texts with the default `a`/`b` file
/// names.
pub fn create_patch(old: &str, new: &str, options: &DiffOptions) -> String {
    create_file_patch("a", "b", old, new, options)
}

/// Generates a unified diff with explicit file names. Binary inputs (any
/// NUL byte) short-circuit to [`BINARY_PATCH`].
pub fn create_file_patch(
    old_file: &str,
    new_file: &str,
    old: &str,
    new: &str,
    options: &DiffOptions,
) -> String {
    if is_binary(old.as_bytes()) || is_binary(new.as_bytes()) {
        return BINARY_PATCH.to_string();
    }
    let diff = diff_lines(old, new, options);
    let patch = patch_from_hunks(old_file, new_file, &diff.hunks, options.context_lines);
    emit_patch(&patch)
}

/// Groups flat per-line hunks into `@@` hunks, keeping up to
/// `context` equal lines adjacent to any change and dropping the rest.
fn patch_from_hunks(old_file: &str, new_file: &str, hunks: &[Hunk], context: usize) -> Patch {
    let mut included: Vec<bool> = hunks.iter().map(|h| h.op != DiffOp::Equal).collect();
    let mut budget = 0;
    for index in 0..hunks.len() {
        if hunks[index].op != DiffOp::Equal {
            budget = context;
        } else if budget > 0 {
            included[index] = true;
            budget -= 1;
        }
    }
    budget = 0;
    for index in (0..hunks.len()).rev() {
        if hunks[index].op != DiffOp::Equal {
            budget = context;
        } else if budget > 0 {
            included[index] = true;
            budget -= 1;
        }
    }

    let mut patch_hunks = vec![];
    // Next line numbers, kept in sync with the per-hunk positions so that
    // hunks which skip lines (e.g. ignored blanks) don't drift.
    let mut old_line = 1;
    let mut new_line = 1;
    let mut current: Option<PatchHunk> = None;
    let finish = |hunk: PatchHunk, out: &mut Vec<PatchHunk>| {
        let mut hunk = hunk;
        // A hunk with no lines on one side names the line *before* the
        // change on that side, per the usual `-N,0` convention.
        if hunk.old_count == 0 {
            hunk.old_start -= 1;
        }
        if hunk.new_count == 0 {
            hunk.new_start -= 1;
        }
        out.push(hunk);
    };
    for (index, hunk) in hunks.iter().enumerate() {
        if let Some(position) = hunk.old_start {
            old_line = position;
        }
        if let Some(position) = hunk.new_start {
            new_line = position;
        }
        if included[index] {
            let current = current.get_or_insert_with(|| PatchHunk {
                old_start: old_line,
                old_count: 0,
                new_start: new_line,
                new_count: 0,
                lines: vec![],
            });
            let (origin, old_used, new_used) = match hunk.op {
                DiffOp::Equal => (' ', 1, 1),
                DiffOp::Delete => ('-', 1, 0),
                DiffOp::Insert => ('+', 0, 1),
            };
            current.old_count += old_used;
            current.new_count += new_used;
            current.lines.push(PatchLine {
                origin,
                content: hunk.content.clone(),
            });
        } else if let Some(done) = current.take() {
            finish(done, &mut patch_hunks);
        }
        match hunk.op {
            DiffOp::Equal => {
                old_line += 1;
                new_line += 1;
            }
            DiffOp::Delete => old_line += 1,
            DiffOp::Insert => new_line += 1,
        }
    }
    if let Some(done) = current.take() {
        finish(done, &mut patch_hunks);
    }
    Patch {
        old_file: old_file.to_string(),
        new_file: new_file.to_string(),
        hunks: patch_hunks,
    }
}

/// Renders a patch back to text. Counts are always written explicitly.
pub fn emit_patch(patch: &Patch) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {}\n", patch.old_file));
    out.push_str(&format!("+++ {}\n", patch.new_file));
    for hunk in &patch.hunks {
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        ));
        for line in &hunk.lines {
            out.push(line.origin);
            out.push_str(&line.content);
            out.push('\n');
        }
    }
    out
}

/// Parses a unified diff. Missing counts default to 1; parsing stops at the
/// next `---` header or end of input.
pub fn parse_patch(text: &str) -> Result<Patch, PatchParseError> {
    let mut lines = text.lines().peekable();
    let old_file = loop {
        match lines.next() {
            Some(line) => {
                if let Some(name) = line.strip_prefix("--- ") {
                    break name.to_string();
                }
            }
            None => return Err(PatchParseError::MissingOldHeader),
        }
    };
    let new_file = match lines.next().and_then(|line| line.strip_prefix("+++ ")) {
        Some(name) => name.to_string(),
        None => return Err(PatchParseError::MissingNewHeader),
    };

    let mut hunks = vec![];
    while let Some(&line) = lines.peek() {
        if line.starts_with("--- ") {
            // A following file section; not ours.
            break;
        }
        if !line.starts_with("@@") {
            // Trailing junk ends the patch.
            break;
        }
        lines.next();
        let (old_start, old_count, new_start, new_count) =
            parse_hunk_header(line).ok_or_else(|| PatchParseError::HunkHeader {
                line: line.to_string(),
            })?;
        let mut hunk_lines = vec![];
        while let Some(&body_line) = lines.peek() {
            if body_line.starts_with("@@") || body_line.starts_with("--- ") {
                break;
            }
            lines.next();
            if body_line.starts_with('\\') {
                // "\ No newline at end of file" and friends.
                continue;
            }
            let (origin, content) = match body_line.chars().next() {
                Some(origin @ (' ' | '+' | '-')) => (origin, &body_line[1..]),
                // Some tools strip the prefix from blank context lines.
                None => (' ', ""),
                Some(_) => break,
            };
            hunk_lines.push(PatchLine {
                origin,
                content: content.to_string(),
            });
        }
        hunks.push(PatchHunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines: hunk_lines,
        });
    }
    Ok(Patch {
        old_file,
        new_file,
        hunks,
    })
}

fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let end = rest.find(" @@")?;
    let (old_part, new_part) = rest[..end].split_once(" +")?;
    let (old_start, old_count) = parse_range(old_part)?;
    let (new_start, new_count) = parse_range(new_part)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(text: &str) -> Option<(usize, usize)> {
    match text.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((text.parse().ok()?, 1)),
    }
}

/// Swaps the direction of a parsed patch: `+`/`-` prefixes, the file
/// headers, and the two count pairs of every hunk.
pub fn reverse(patch: &Patch) -> Patch {
    Patch {
        old_file: patch.new_file.clone(),
        new_file: patch.old_file.clone(),
        hunks: patch
            .hunks
            .iter()
            .map(|hunk| PatchHunk {
                old_start: hunk.new_start,
                old_count: hunk.new_count,
                new_start: hunk.old_start,
                new_count: hunk.old_count,
                lines: hunk
                    .lines
                    .iter()
                    .map(|line| PatchLine {
                        origin: match line.origin {
                            '+' => '-',
                            '-' => '+',
                            origin => origin,
                        },
                        content: line.content.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Parses, reverses, and re-renders a patch.
pub fn reverse_patch(text: &str) -> Result<String, PatchParseError> {
    Ok(emit_patch(&reverse(&parse_patch(text)?)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_create_patch_with_one_context_line() {
        let options = DiffOptions {
            context_lines: 1,
            ..Default::default()
        };
        let patch = create_patch("1\n2\n3\n4\n5\n", "1\n2\nX\n4\n5\n", &options);
        assert_eq!(
            patch,
            indoc! {"
                --- a
                +++ b
                @@ -2,3 +2,3 @@
                 2
                -3
                +X
                 4
            "}
        );
    }

    #[test]
    fn test_create_patch_insert_at_top() {
        let options = DiffOptions {
            context_lines: 0,
            ..Default::default()
        };
        let patch = create_patch("a\n", "x\na\n", &options);
        assert_eq!(patch, "--- a\n+++ b\n@@ -0,0 +1,1 @@\n+x\n");
    }

    #[test]
    fn test_create_patch_no_changes_emits_headers_only() {
        let patch = create_patch("a\n", "a\n", &DiffOptions::default());
        assert_eq!(patch, "--- a\n+++ b\n");
        assert!(parse_patch(&patch).unwrap().hunks.is_empty());
    }

    #[test]
    fn test_binary_input_short_circuits() {
        let patch = create_patch("a\0b", "text", &DiffOptions::default());
        assert_eq!(patch, BINARY_PATCH);
    }

    #[test]
    fn test_two_changes_with_shared_context_merge_into_one_hunk() {
        let options = DiffOptions {
            context_lines: 2,
            ..Default::default()
        };
        let patch = create_patch("1\n2\n3\n4\n5\n", "X\n2\n3\n4\nY\n", &options);
        let parsed = parse_patch(&patch).unwrap();
        assert_eq!(parsed.hunks.len(), 1);
        assert_eq!(parsed.hunks[0].old_start, 1);
        assert_eq!(parsed.hunks[0].old_count, 5);
    }

    #[test]
    fn test_parse_tolerates_missing_counts() {
        let patch = parse_patch("--- a\n+++ b\n@@ -2 +2 @@\n-x\n+y\n").unwrap();
        assert_eq!(parsed_counts(&patch), vec![(2, 1, 2, 1)]);
    }

    fn parsed_counts(patch: &Patch) -> Vec<(usize, usize, usize, usize)> {
        patch
            .hunks
            .iter()
            .map(|h| (h.old_start, h.old_count, h.new_start, h.new_count))
            .collect()
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        assert_matches!(parse_patch(""), Err(PatchParseError::MissingOldHeader));
        assert_matches!(
            parse_patch("--- a\njunk\n"),
            Err(PatchParseError::MissingNewHeader)
        );
        assert_matches!(
            parse_patch("--- a\n+++ b\n@@ nonsense @@\n"),
            Err(PatchParseError::HunkHeader { .. })
        );
    }

    #[test]
    fn test_parse_stops_at_next_file_header() {
        let text = indoc! {"
            --- a
            +++ b
            @@ -1,1 +1,1 @@
            -x
            +y
            --- c
            +++ d
            @@ -9,1 +9,1 @@
            -q
            +r
        "};
        let patch = parse_patch(text).unwrap();
        assert_eq!(patch.old_file, "a");
        assert_eq!(patch.hunks.len(), 1);
    }

    #[test]
    fn test_parse_emit_round_trip_is_stable() {
        let text = indoc! {"
            --- old.txt
            +++ new.txt
            @@ -1,3 +1,3 @@
             keep
            -drop
            +add
             keep2
        "};
        let parsed = parse_patch(text).unwrap();
        assert_eq!(parse_patch(&emit_patch(&parsed)).unwrap(), parsed);
    }

    #[test]
    fn test_reverse_swaps_everything() {
        let text = "--- a\n+++ b\n@@ -2,3 +5,4 @@\n ctx\n-del\n+add1\n+add2\n ctx2\n";
        let reversed = reverse_patch(text).unwrap();
        assert_eq!(
            reversed,
            "--- b\n+++ a\n@@ -5,4 +2,3 @@\n ctx\n+del\n-add1\n-add2\n ctx2\n"
        );
        // Reversing twice is the identity (modulo normalized counts).
        assert_eq!(reverse_patch(&reversed).unwrap(), text);
    }
}
