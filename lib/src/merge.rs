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

//! Three-way text merge.
//!
//! Both sides are diffed against the common base, producing change regions
//! over base line intervals. Disjoint regions apply directly; touching or
//! overlapping regions are coalesced and either merge cleanly (identical
//! replacements) or become a marked conflict. The presence of conflicts is
//! normal success, not an error.

use thiserror::Error;

use crate::conflicts::CONFLICT_BASE_MARKER;
use crate::conflicts::CONFLICT_END_MARKER;
use crate::conflicts::CONFLICT_SEPARATOR_MARKER;
use crate::conflicts::CONFLICT_START_MARKER;
use crate::conflicts::Conflict;
use crate::diff::common_subsequence;
use crate::diff::normalize_line_endings;
use crate::diff::split_lines;

/// How conflict blocks are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStyle {
    /// Two sections: ours and theirs.
    Merge,
    /// Three sections: the base lines appear between `|||||||` and
    /// `=======`.
    Diff3,
}

/// Options for [`merge3`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Marker style for conflict blocks.
    pub style: ConflictStyle,
    /// Label after the `<<<<<<<` marker.
    pub ours_label: String,
    /// Label after the `|||||||` marker (diff3 style only).
    pub base_label: String,
    /// Label after the `>>>>>>>` marker.
    pub theirs_label: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            style: ConflictStyle::Merge,
            ours_label: "ours".to_string(),
            base_label: "base".to_string(),
            theirs_label: "theirs".to_string(),
        }
    }
}

/// Violation of an internal invariant. Distinct from the presence of
/// conflicts, which is reported through [`MergeOutcome`].
#[derive(Debug, Error)]
pub enum MergeError {
    /// Change regions were not sorted and disjoint.
    #[error("Merge invariant violated: {reason}")]
    Invariant {
        /// Which invariant broke.
        reason: String,
    },
}

/// Result of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MergeOutcome {
    /// Merged text, conflict markers included when `has_conflicts`.
    /// Ends with a newline iff any lines were emitted.
    pub content: String,
    /// One record per conflict block, with marker line numbers.
    pub conflicts: Vec<Conflict>,
    /// `!conflicts.is_empty()`.
    pub has_conflicts: bool,
}

// One side's edit: base lines `base_start..base_end` (half-open) become
// `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangeRegion {
    base_start: usize,
    base_end: usize,
    replacement: Vec<String>,
}

fn change_regions(base: &[&str], side: &[&str]) -> Vec<ChangeRegion> {
    let matches = common_subsequence(base, side);
    let mut regions = vec![];
    let mut base_index = 0;
    let mut side_index = 0;
    let push_gap = |regions: &mut Vec<ChangeRegion>, base_to: usize, side_to: usize, base_index: usize, side_index: usize| {
        if base_index < base_to || side_index < side_to {
            regions.push(ChangeRegion {
                base_start: base_index,
                base_end: base_to,
                replacement: side[side_index..side_to].iter().map(|s| s.to_string()).collect(),
            });
        }
    };
    for &(i, j) in &matches {
        push_gap(&mut regions, i, j, base_index, side_index);
        base_index = i + 1;
        side_index = j + 1;
    }
    push_gap(&mut regions, base.len(), side.len(), base_index, side_index);
    regions
}

// Whether two regions must be reconciled together: properly overlapping
// base intervals, or both anchored at the same base position.
fn regions_collide(a: &ChangeRegion, b: &ChangeRegion) -> bool {
    (a.base_start < b.base_end && b.base_start < a.base_end) || a.base_start == b.base_start
}

// Replays `regions` (all inside `lo..hi`) over the base slice, yielding the
// side's content for that span.
fn splice_side(
    base: &[&str],
    regions: &[&ChangeRegion],
    lo: usize,
    hi: usize,
) -> Result<Vec<String>, MergeError> {
    let mut lines = vec![];
    let mut cursor = lo;
    for region in regions {
        if region.base_start < cursor || region.base_end > hi {
            return Err(MergeError::Invariant {
                reason: format!(
                    "region {}..{} escapes its conflict span {lo}..{hi}",
                    region.base_start, region.base_end
                ),
            });
        }
        lines.extend(base[cursor..region.base_start].iter().map(|s| s.to_string()));
        lines.extend(region.replacement.iter().cloned());
        cursor = region.base_end;
    }
    lines.extend(base[cursor..hi].iter().map(|s| s.to_string()));
    Ok(lines)
}

/// Merges two side texts against their common base.
///
/// Line endings are normalized (CRLF and CR become LF) in all three inputs
/// before comparison, so the output always uses LF.
pub fn merge3(
    base: &str,
    ours: &str,
    theirs: &str,
    options: &MergeOptions,
) -> Result<MergeOutcome, MergeError> {
    let base = normalize_line_endings(base);
    let ours = normalize_line_endings(ours);
    let theirs = normalize_line_endings(theirs);
    let base_lines = split_lines(&base);
    let ours_regions = change_regions(&base_lines, &split_lines(&ours));
    let theirs_regions = change_regions(&base_lines, &split_lines(&theirs));

    let mut out: Vec<String> = vec![];
    let mut conflicts = vec![];
    let mut pos = 0;
    let mut ours_next = 0;
    let mut theirs_next = 0;

    let copy_base = |out: &mut Vec<String>, from: usize, to: usize| {
        out.extend(base_lines[from..to].iter().map(|s| s.to_string()));
    };

    loop {
        let next_ours = ours_regions.get(ours_next);
        let next_theirs = theirs_regions.get(theirs_next);
        let collide = match (next_ours, next_theirs) {
            (None, None) => break,
            (Some(a), Some(b)) => regions_collide(a, b),
            _ => false,
        };

        if !collide {
            // Apply whichever single region comes first in base order.
            let take_ours = match (next_ours, next_theirs) {
                (Some(a), Some(b)) => a.base_start <= b.base_start,
                (Some(_), None) => true,
                _ => false,
            };
            let region = if take_ours {
                ours_next += 1;
                next_ours.unwrap()
            } else {
                theirs_next += 1;
                next_theirs.unwrap()
            };
            copy_base(&mut out, pos, region.base_start);
            out.extend(region.replacement.iter().cloned());
            pos = region.base_end;
            continue;
        }

        // Coalesce the colliding regions, absorbing any further region on
        // either side that reaches into the combined span.
        let a = next_ours.unwrap();
        let b = next_theirs.unwrap();
        let lo = a.base_start.min(b.base_start);
        let mut hi = a.base_end.max(b.base_end);
        let mut ours_group = vec![];
        let mut theirs_group = vec![];
        ours_group.push(a);
        theirs_group.push(b);
        ours_next += 1;
        theirs_next += 1;
        loop {
            if let Some(region) = ours_regions.get(ours_next)
                && region.base_start < hi
            {
                hi = hi.max(region.base_end);
                ours_group.push(region);
                ours_next += 1;
                continue;
            }
            if let Some(region) = theirs_regions.get(theirs_next)
                && region.base_start < hi
            {
                hi = hi.max(region.base_end);
                theirs_group.push(region);
                theirs_next += 1;
                continue;
            }
            break;
        }

        let ours_content = splice_side(&base_lines, &ours_group, lo, hi)?;
        let theirs_content = splice_side(&base_lines, &theirs_group, lo, hi)?;
        copy_base(&mut out, pos, lo);
        pos = hi;

        if ours_content == theirs_content {
            // Both sides made the same change.
            out.extend(ours_content);
            continue;
        }

        let marker = |marker: &str, label: &str| {
            if label.is_empty() {
                marker.to_string()
            } else {
                format!("{marker} {label}")
            }
        };
        out.push(marker(CONFLICT_START_MARKER, &options.ours_label));
        let start_line = out.len();
        out.extend(ours_content.iter().cloned());
        if options.style == ConflictStyle::Diff3 {
            out.push(marker(CONFLICT_BASE_MARKER, &options.base_label));
            copy_base(&mut out, lo, hi);
        }
        out.push(CONFLICT_SEPARATOR_MARKER.to_string());
        out.extend(theirs_content.iter().cloned());
        out.push(marker(CONFLICT_END_MARKER, &options.theirs_label));
        let end_line = out.len();
        conflicts.push(Conflict {
            ours: ours_content,
            base: Some(base_lines[lo..hi].iter().map(|s| s.to_string()).collect()),
            theirs: theirs_content,
            start_line,
            end_line,
        });
    }
    copy_base(&mut out, pos, base_lines.len());

    let content = if out.is_empty() {
        String::new()
    } else {
        let mut joined = out.join("\n");
        joined.push('\n');
        joined
    };
    let has_conflicts = !conflicts.is_empty();
    Ok(MergeOutcome {
        content,
        conflicts,
        has_conflicts,
    })
}
