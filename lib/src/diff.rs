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

//! Line, word, and character diffs.
//!
//! The backbone is a longest common subsequence over comparison keys: a
//! dynamic-programming table for modest inputs, Myers' O((N+M)D) algorithm
//! when the table would grow too large. Hunks are per line (or per token),
//! in input order, with 1-based positions; character diffs additionally
//! merge consecutive same-operation hunks.

use itertools::Itertools as _;
use serde::Serialize;

/// What a hunk does to the old text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOp {
    /// Present on both sides.
    Equal,
    /// Present only in the new text.
    Insert,
    /// Present only in the old text.
    Delete,
}

/// One line (or token) of a diff, with 1-based positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    /// Operation kind.
    pub op: DiffOp,
    /// Original content, even when comparison was normalized.
    pub content: String,
    /// Position in the old text; absent for inserts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_start: Option<usize>,
    /// Position in the new text; absent for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_start: Option<usize>,
}

/// Aggregate counts over a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Number of inserted lines/tokens.
    pub additions: usize,
    /// Number of deleted lines/tokens.
    pub deletions: usize,
    /// `min(additions, deletions)`, approximating paired modifications.
    pub changes: usize,
}

/// Hunks plus stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// All hunks in input order, equal runs included.
    pub hunks: Vec<Hunk>,
    /// Aggregate counts.
    pub stats: DiffStats,
}

/// Tuning knobs shared by the diff functions and unified-patch generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Compare lines/tokens with leading and trailing whitespace stripped.
    /// Interior whitespace is significant; emitted hunks carry the original
    /// content either way.
    pub ignore_whitespace: bool,
    /// Exclude blank lines from comparison. They never appear in hunks or
    /// stats; surviving hunks keep their original line numbers.
    pub ignore_blank_lines: bool,
    /// Number of equal lines kept around each change when generating a
    /// unified patch.
    pub context_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace: false,
            ignore_blank_lines: false,
            context_lines: 3,
        }
    }
}

/// Whether the bytes look binary (contain a NUL).
pub fn is_binary(data: &[u8]) -> bool {
    data.contains(&0)
}

/// Rewrites CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Splits into lines without terminators. A trailing newline does not
/// produce an empty final line.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![];
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

// Splits into maximal runs of word characters, whitespace, and punctuation.
fn split_words(text: &str) -> Vec<&str> {
    #[derive(PartialEq, Clone, Copy)]
    enum Class {
        Word,
        Space,
        Punct,
    }
    fn classify(c: char) -> Class {
        if c.is_alphanumeric() || c == '_' {
            Class::Word
        } else if c.is_whitespace() {
            Class::Space
        } else {
            Class::Punct
        }
    }
    let mut tokens = vec![];
    let mut run_start = 0;
    let mut run_class = None;
    for (pos, c) in text.char_indices() {
        let class = classify(c);
        if run_class.is_some() && run_class != Some(class) {
            tokens.push(&text[run_start..pos]);
            run_start = pos;
        }
        run_class = Some(class);
    }
    if run_class.is_some() {
        tokens.push(&text[run_start..]);
    }
    tokens
}

// Splits by Unicode code point.
fn split_chars(text: &str) -> Vec<&str> {
    let mut tokens = vec![];
    let mut iter = text.char_indices().peekable();
    while let Some((pos, _)) = iter.next() {
        let end = iter.peek().map_or(text.len(), |&(next, _)| next);
        tokens.push(&text[pos..end]);
    }
    tokens
}

/// Diffs two texts line by line.
pub fn diff_lines(old: &str, new: &str, options: &DiffOptions) -> Diff {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let (old_view, old_positions) = filter_tokens(&old_lines, options.ignore_blank_lines);
    let (new_view, new_positions) = filter_tokens(&new_lines, options.ignore_blank_lines);
    diff_tokens(
        &old_view,
        &new_view,
        &old_positions,
        &new_positions,
        options.ignore_whitespace,
        false,
    )
}

/// Diffs two texts token by token (word, whitespace, and punctuation runs).
pub fn diff_words(old: &str, new: &str, options: &DiffOptions) -> Diff {
    let old_tokens = split_words(old);
    let new_tokens = split_words(new);
    let (old_view, old_positions) = filter_tokens(&old_tokens, false);
    let (new_view, new_positions) = filter_tokens(&new_tokens, false);
    diff_tokens(
        &old_view,
        &new_view,
        &old_positions,
        &new_positions,
        options.ignore_whitespace,
        false,
    )
}

/// Diffs two texts by code point, merging consecutive same-operation hunks.
pub fn diff_chars(old: &str, new: &str, options: &DiffOptions) -> Diff {
    let old_tokens = split_chars(old);
    let new_tokens = split_chars(new);
    let (old_view, old_positions) = filter_tokens(&old_tokens, false);
    let (new_view, new_positions) = filter_tokens(&new_tokens, false);
    diff_tokens(
        &old_view,
        &new_view,
        &old_positions,
        &new_positions,
        options.ignore_whitespace,
        true,
    )
}

// Drops blank tokens when asked to, remembering 1-based original positions.
fn filter_tokens<'a>(tokens: &[&'a str], drop_blank: bool) -> (Vec<&'a str>, Vec<usize>) {
    let mut view = Vec::with_capacity(tokens.len());
    let mut positions = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        if drop_blank && token.trim().is_empty() {
            continue;
        }
        view.push(*token);
        positions.push(index + 1);
    }
    (view, positions)
}

fn diff_tokens(
    old_tokens: &[&str],
    new_tokens: &[&str],
    old_positions: &[usize],
    new_positions: &[usize],
    ignore_whitespace: bool,
    merge_runs: bool,
) -> Diff {
    let matches = if ignore_whitespace {
        let old_keys: Vec<&str> = old_tokens.iter().map(|t| t.trim()).collect();
        let new_keys: Vec<&str> = new_tokens.iter().map(|t| t.trim()).collect();
        common_subsequence(&old_keys, &new_keys)
    } else {
        common_subsequence(old_tokens, new_tokens)
    };

    let mut hunks = vec![];
    let mut old_index = 0;
    let mut new_index = 0;
    let emit_gap = |hunks: &mut Vec<Hunk>, old_to: usize, new_to: usize, old_index: usize, new_index: usize| {
        for k in old_index..old_to {
            hunks.push(Hunk {
                op: DiffOp::Delete,
                content: old_tokens[k].to_string(),
                old_start: Some(old_positions[k]),
                new_start: None,
            });
        }
        for k in new_index..new_to {
            hunks.push(Hunk {
                op: DiffOp::Insert,
                content: new_tokens[k].to_string(),
                old_start: None,
                new_start: Some(new_positions[k]),
            });
        }
    };
    for &(i, j) in &matches {
        emit_gap(&mut hunks, i, j, old_index, new_index);
        hunks.push(Hunk {
            op: DiffOp::Equal,
            content: old_tokens[i].to_string(),
            old_start: Some(old_positions[i]),
            new_start: Some(new_positions[j]),
        });
        old_index = i + 1;
        new_index = j + 1;
    }
    emit_gap(&mut hunks, old_tokens.len(), new_tokens.len(), old_index, new_index);

    if merge_runs {
        hunks = merge_consecutive(hunks);
    }
    let stats = compute_stats(&hunks);
    Diff { hunks, stats }
}

fn merge_consecutive(hunks: Vec<Hunk>) -> Vec<Hunk> {
    hunks
        .into_iter()
        .coalesce(|mut previous, hunk| {
            if previous.op == hunk.op {
                previous.content.push_str(&hunk.content);
                Ok(previous)
            } else {
                Err((previous, hunk))
            }
        })
        .collect()
}

fn compute_stats(hunks: &[Hunk]) -> DiffStats {
    let additions = hunks.iter().filter(|h| h.op == DiffOp::Insert).count();
    let deletions = hunks.iter().filter(|h| h.op == DiffOp::Delete).count();
    DiffStats {
        additions,
        deletions,
        changes: additions.min(deletions),
    }
}

// Above this product of input lengths the DP table is too expensive and the
// walk switches to Myers.
const DP_TABLE_LIMIT: usize = 1 << 20;

/// Longest common subsequence of `a` and `b` as strictly increasing
/// `(old_index, new_index)` pairs.
pub(crate) fn common_subsequence<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    if a.len().saturating_mul(b.len()) <= DP_TABLE_LIMIT {
        lcs_matches(a, b)
    } else {
        myers_matches(a, b)
    }
}

fn lcs_matches<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    // lengths[i][j] = LCS length of a[i..] and b[j..], flattened.
    let width = m + 1;
    let mut lengths = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i * width + j] = if a[i] == b[j] {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }
    let mut matches = vec![];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matches
}

// Myers' greedy O((N+M)D) algorithm. Keeps a snapshot of the furthest-x
// vector per edit distance and backtracks over the snapshots to recover the
// matched diagonals.
fn myers_matches<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    let offset = max;
    let width = (2 * max + 1) as usize;
    let index = |k: isize| (k + offset) as usize;

    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = vec![];
    let mut final_d = None;
    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[index(k - 1)] < v[index(k + 1)]) {
                v[index(k + 1)]
            } else {
                v[index(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[index(k)] = x;
            if x >= n && y >= m {
                final_d = Some(d);
                break 'search;
            }
            k += 2;
        }
    }
    let final_d = final_d.expect("the edit distance is bounded by N+M");

    let mut matches = vec![];
    let (mut x, mut y) = (n, m);
    for d in (0..=final_d).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[index(k - 1)] < v[index(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[index(prev_k)];
        let prev_y = prev_x - prev_k;
        // Walk back along the snake: these are the matches.
        while x > prev_x.max(0) && y > prev_y.max(0) && x > 0 && y > 0 {
            matches.push((x as usize - 1, y as usize - 1));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            x = prev_x;
            y = prev_y;
        }
    }
    matches.reverse();
    matches
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn ops(diff: &Diff) -> Vec<(DiffOp, &str)> {
        diff.hunks.iter().map(|h| (h.op, h.content.as_str())).collect()
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines(""), Vec::<&str>::new());
        assert_eq!(split_lines("a"), ["a"]);
        assert_eq!(split_lines("a\n"), ["a"]);
        assert_eq!(split_lines("a\n\nb\n"), ["a", "", "b"]);
        assert_eq!(split_lines("\n"), [""]);
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("hello world"), ["hello", " ", "world"]);
        assert_eq!(split_words("a_1+b, c"), ["a_1", "+", "b", ",", " ", "c"]);
        assert_eq!(split_words(""), Vec::<&str>::new());
    }

    #[test]
    fn test_line_diff_positions_are_one_based() {
        let diff = diff_lines("a\nb\nc\n", "a\nB\nc\n", &DiffOptions::default());
        assert_eq!(
            diff.hunks,
            vec![
                Hunk {
                    op: DiffOp::Equal,
                    content: "a".to_string(),
                    old_start: Some(1),
                    new_start: Some(1),
                },
                Hunk {
                    op: DiffOp::Delete,
                    content: "b".to_string(),
                    old_start: Some(2),
                    new_start: None,
                },
                Hunk {
                    op: DiffOp::Insert,
                    content: "B".to_string(),
                    old_start: None,
                    new_start: Some(2),
                },
                Hunk {
                    op: DiffOp::Equal,
                    content: "c".to_string(),
                    old_start: Some(3),
                    new_start: Some(3),
                },
            ]
        );
        assert_eq!(
            diff.stats,
            DiffStats {
                additions: 1,
                deletions: 1,
                changes: 1
            }
        );
    }

    #[test]
    fn test_word_diff_tokens() {
        let diff = diff_words("hello world", "hello brave world", &DiffOptions::default());
        assert_eq!(
            ops(&diff),
            vec![
                (DiffOp::Equal, "hello"),
                (DiffOp::Equal, " "),
                (DiffOp::Insert, "brave"),
                (DiffOp::Insert, " "),
                (DiffOp::Equal, "world"),
            ]
        );
    }

    #[test]
    fn test_char_diff_merges_runs() {
        let diff = diff_chars("abc", "axyc", &DiffOptions::default());
        assert_eq!(
            ops(&diff),
            vec![
                (DiffOp::Equal, "a"),
                (DiffOp::Delete, "b"),
                (DiffOp::Insert, "xy"),
                (DiffOp::Equal, "c"),
            ]
        );
    }

    #[test]
    fn test_ignore_whitespace_compares_trimmed() {
        let options = DiffOptions {
            ignore_whitespace: true,
            ..Default::default()
        };
        let diff = diff_lines("  a  \nb\n", "a\n  b\n", &options);
        assert_eq!(diff.stats.additions, 0);
        assert_eq!(diff.stats.deletions, 0);
        // Emitted hunks carry original content.
        assert_eq!(diff.hunks[0].content, "  a  ");
        // Interior whitespace stays significant.
        let diff = diff_lines("a b\n", "a  b\n", &options);
        assert_eq!(diff.stats.additions, 1);
        assert_eq!(diff.stats.deletions, 1);
    }

    #[test]
    fn test_ignore_blank_lines_keeps_original_numbers() {
        let options = DiffOptions {
            ignore_blank_lines: true,
            ..Default::default()
        };
        let diff = diff_lines("a\n\nb\n", "a\nb\nc\n", &options);
        assert_eq!(
            ops(&diff),
            vec![(DiffOp::Equal, "a"), (DiffOp::Equal, "b"), (DiffOp::Insert, "c")]
        );
        // "b" is line 3 of the old text, line 2 of the new text.
        let b = &diff.hunks[1];
        assert_eq!((b.old_start, b.new_start), (Some(3), Some(2)));
        assert_eq!(diff.stats.additions, 1);
        assert_eq!(diff.stats.deletions, 0);
    }

    #[test]
    fn test_identical_and_empty_inputs() {
        let diff = diff_lines("a\nb\n", "a\nb\n", &DiffOptions::default());
        assert_eq!(diff.stats.additions + diff.stats.deletions, 0);
        assert_eq!(diff.hunks.len(), 2);

        let diff = diff_lines("", "", &DiffOptions::default());
        assert!(diff.hunks.is_empty());

        let diff = diff_lines("", "a\n", &DiffOptions::default());
        assert_eq!(ops(&diff), vec![(DiffOp::Insert, "a")]);
    }

    #[test_case(b"plain text", false; "text")]
    #[test_case(b"nul\0inside", true; "nul")]
    #[test_case(b"", false; "empty")]
    fn test_is_binary(data: &[u8], expected: bool) {
        assert_eq!(is_binary(data), expected);
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test_case(&["a", "b", "c"], &["a", "b", "c"]; "identical")]
    #[test_case(&["a", "b", "c"], &["x", "y"]; "disjoint")]
    #[test_case(&["a", "b", "c", "d"], &["b", "d", "e"]; "interleaved")]
    #[test_case(&[], &["a"]; "empty left")]
    #[test_case(&["x", "a", "b", "x", "c", "d"], &["a", "b", "y", "c", "d", "y"]; "mixed")]
    fn test_myers_agrees_with_dp(a: &[&str], b: &[&str]) {
        let dp = lcs_matches(a, b);
        let myers = myers_matches(a, b);
        // Both must be maximal common subsequences; Myers may pick different
        // but equally long matchings.
        assert_eq!(myers.len(), dp.len());
        for &(i, j) in &myers {
            assert_eq!(a[i], b[j]);
        }
        // Strictly increasing in both coordinates.
        for pair in myers.windows(2) {
            assert!(pair[0].0 < pair[1].0 && pair[0].1 < pair[1].1);
        }
    }
}
