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

//! Patch application with fuzzy offset tolerance.
//!
//! Application never raises on logical failure; it returns an
//! [`ApplyResult`] so callers can present partial success.

use serde::Serialize;

use crate::diff::split_lines;
use crate::unified::Patch;
use crate::unified::PatchHunk;

/// Tuning knobs for [`apply_patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// How far (in lines, each direction) a hunk may be relocated from its
    /// declared position when the context does not match there.
    pub max_offset: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self { max_offset: 20 }
    }
}

/// Outcome of one hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkApplication {
    /// Index of the hunk within the patch.
    pub hunk_index: usize,
    /// Whether the hunk's effect is present in the output.
    pub applied: bool,
    /// Lines between the expected position and where the hunk matched.
    pub offset: isize,
    /// The expected post-image was already present, so nothing was changed.
    pub already_applied: bool,
}

/// Outcome of applying a whole patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    /// The patched text.
    pub content: String,
    /// `hunks_failed == 0`.
    pub success: bool,
    /// Number of hunks whose effect is present in the output.
    pub hunks_applied: usize,
    /// Number of hunks that could not be placed.
    pub hunks_failed: usize,
    /// Per-hunk outcomes, in patch order.
    pub hunk_results: Vec<HunkApplication>,
    /// One message per failed hunk.
    pub errors: Vec<String>,
}

fn hunk_old_lines(hunk: &PatchHunk) -> Vec<&str> {
    hunk.lines
        .iter()
        .filter(|line| line.origin != '+')
        .map(|line| line.content.as_str())
        .collect()
}

fn hunk_new_lines(hunk: &PatchHunk) -> Vec<&str> {
    hunk.lines
        .iter()
        .filter(|line| line.origin != '-')
        .map(|line| line.content.as_str())
        .collect()
}

fn matches_at(lines: &[String], position: usize, expected: &[&str]) -> bool {
    position + expected.len() <= lines.len()
        && std::iter::zip(&lines[position..], expected).all(|(have, want)| have == want)
}

// Scans the offset window around `target` for the first position where
// `expected` matches, lowest position first.
fn find_in_window(
    lines: &[String],
    target: isize,
    max_offset: usize,
    expected: &[&str],
) -> Option<usize> {
    let lo = (target - max_offset as isize).max(0);
    let hi = (target + max_offset as isize).min(lines.len() as isize - expected.len() as isize);
    let mut position = lo;
    while position <= hi {
        if matches_at(lines, position as usize, expected) {
            return Some(position as usize);
        }
        position += 1;
    }
    None
}

/// Applies a parsed patch to `content`.
///
/// Each hunk is matched at its declared position first (adjusted by the
/// drift of previously applied hunks), then within `max_offset` lines of
/// it. Hunks whose post-image is already present count as applied with
/// [`HunkApplication::already_applied`] set.
pub fn apply_patch(content: &str, patch: &Patch, options: &ApplyOptions) -> ApplyResult {
    let mut lines: Vec<String> = split_lines(content)
        .into_iter()
        .map(|line| line.to_string())
        .collect();
    let mut shift: isize = 0;
    let mut hunk_results = vec![];
    let mut errors = vec![];

    for (hunk_index, hunk) in patch.hunks.iter().enumerate() {
        let old_lines = hunk_old_lines(hunk);
        let new_lines = hunk_new_lines(hunk);
        let delta = new_lines.len() as isize - old_lines.len() as isize;

        if old_lines.is_empty() {
            // A pure insertion has no context to anchor on: it goes right
            // after the line its header names.
            let at = (hunk.old_start as isize + shift).clamp(0, lines.len() as isize) as usize;
            lines.splice(at..at, new_lines.iter().map(|line| line.to_string()));
            shift += delta;
            hunk_results.push(HunkApplication {
                hunk_index,
                applied: true,
                offset: 0,
                already_applied: false,
            });
            continue;
        }

        let target = hunk.old_start as isize - 1 + shift;
        if let Some(position) = find_in_window(&lines, target, options.max_offset, &old_lines) {
            lines.splice(
                position..position + old_lines.len(),
                new_lines.iter().map(|line| line.to_string()),
            );
            shift += delta;
            hunk_results.push(HunkApplication {
                hunk_index,
                applied: true,
                offset: position as isize - target,
                already_applied: false,
            });
            continue;
        }

        if !new_lines.is_empty()
            && let Some(position) = find_in_window(&lines, target, options.max_offset, &new_lines)
        {
            // The file already looks patched here; count it as success and
            // keep accounting for the line drift it implies.
            shift += delta;
            hunk_results.push(HunkApplication {
                hunk_index,
                applied: true,
                offset: position as isize - target,
                already_applied: true,
            });
            continue;
        }

        hunk_results.push(HunkApplication {
            hunk_index,
            applied: false,
            offset: 0,
            already_applied: false,
        });
        errors.push(format!(
            "hunk #{} could not be placed near line {}",
            hunk_index + 1,
            hunk.old_start
        ));
    }

    let hunks_applied = hunk_results.iter().filter(|r| r.applied).count();
    let hunks_failed = hunk_results.len() - hunks_applied;
    let content = if lines.is_empty() {
        String::new()
    } else {
        let mut joined = lines.join("\n");
        joined.push('\n');
        joined
    };
    ApplyResult {
        content,
        success: hunks_failed == 0,
        hunks_applied,
        hunks_failed,
        hunk_results,
        errors,
    }
}
