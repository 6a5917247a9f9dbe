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

use indoc::indoc;
use minigit_lib::conflicts::extract_conflicts;
use minigit_lib::conflicts::has_conflicts;
use minigit_lib::conflicts::resolve_conflict;
use minigit_lib::merge::ConflictStyle;
use minigit_lib::merge::MergeOptions;
use minigit_lib::merge::merge3;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn diff3() -> MergeOptions {
    MergeOptions {
        style: ConflictStyle::Diff3,
        ..Default::default()
    }
}

#[test_case(""; "empty")]
#[test_case("one line\n"; "single line")]
#[test_case("A\nB\nC\n"; "several lines")]
#[test_case("no trailing newline"; "no trailing newline")]
fn test_merge_of_three_identical_inputs(base: &str) {
    let outcome = merge3(base, base, base, &MergeOptions::default()).unwrap();
    assert!(!outcome.has_conflicts);
    // Output is newline-terminated iff any lines were emitted.
    if base.is_empty() {
        assert_eq!(outcome.content, "");
    } else {
        let mut expected = base.to_string();
        if !expected.ends_with('\n') {
            expected.push('\n');
        }
        assert_eq!(outcome.content, expected);
    }
}

#[test_case("A\nB\nC\n", "A\nX\nC\n"; "replace middle")]
#[test_case("A\nB\nC\n", "A\nC\n"; "delete line")]
#[test_case("A\nB\nC\n", "A\nB\nB2\nC\n"; "insert line")]
#[test_case("A\nB\nC\n", "entirely\ndifferent\n"; "rewrite all")]
#[test_case("A\nB\nC\n", ""; "delete all")]
fn test_one_sided_change_wins(base: &str, changed: &str) {
    let outcome = merge3(base, changed, base, &MergeOptions::default()).unwrap();
    assert!(!outcome.has_conflicts, "ours-side change conflicted");
    assert_eq!(outcome.content, changed);

    let outcome = merge3(base, base, changed, &MergeOptions::default()).unwrap();
    assert!(!outcome.has_conflicts, "theirs-side change conflicted");
    assert_eq!(outcome.content, changed);
}

#[test]
fn test_clean_merge_of_disjoint_edits() {
    let base = "A\nB\nC\n";
    let outcome = merge3(base, "A\nB1\nC\n", "A\nB\nC1\n", &MergeOptions::default()).unwrap();
    assert_eq!(outcome.content, "A\nB1\nC1\n");
    assert!(!outcome.has_conflicts);
    assert!(outcome.conflicts.is_empty());
}

#[test]
fn test_conflict_scenario_diff3() {
    let outcome = merge3("A\nB\nC\n", "A\nX\nC\n", "A\nY\nC\n", &diff3()).unwrap();
    assert_eq!(
        outcome.content,
        indoc! {"
            A
            <<<<<<< ours
            X
            ||||||| base
            B
            =======
            Y
            >>>>>>> theirs
            C
        "}
    );
    assert_eq!(outcome.conflicts.len(), 1);
    assert!(outcome.has_conflicts);

    let resolved = resolve_conflict(&outcome.content, 0, "ours").unwrap();
    assert_eq!(resolved, "A\nX\nC\n");
    assert!(!has_conflicts(&resolved));
}

#[test]
fn test_conflict_wire_format_merge_style() {
    let outcome = merge3("A\nB\nC\n", "A\nX\nC\n", "A\nY\nC\n", &MergeOptions::default()).unwrap();
    insta::assert_snapshot!(outcome.content, @r"
    A
    <<<<<<< ours
    X
    =======
    Y
    >>>>>>> theirs
    C
    ");
}

#[test]
fn test_conflict_marker_invariant_over_merge_outputs() {
    let cases = [
        ("A\nB\nC\n", "A\nX\nC\n", "A\nY\nC\n"),
        ("A\nB\nC\n", "A\nX\nC\n", "A\nX\nC\n"),
        ("a\nb\n", "a\nb\nmore\n", "a\nb\nother\n"),
        ("x\n", "x\n", "x\n"),
        ("1\n2\n3\n4\n", "1\nA\n3\nB\n", "1\n2\n3\n4\nextra\n"),
    ];
    for (base, ours, theirs) in cases {
        for options in [MergeOptions::default(), diff3()] {
            let outcome = merge3(base, ours, theirs, &options).unwrap();
            // has_conflicts(s) == (extract_conflicts(s) is non-empty), and
            // both agree with the merge's own report.
            assert_eq!(
                has_conflicts(&outcome.content),
                !extract_conflicts(&outcome.content).is_empty()
            );
            assert_eq!(has_conflicts(&outcome.content), outcome.has_conflicts);
            assert_eq!(
                extract_conflicts(&outcome.content).len(),
                outcome.conflicts.len()
            );
        }
    }
}

#[test]
fn test_multiple_conflicts_resolve_independently() {
    let base = "A\nB\nC\nD\nE\n";
    let ours = "A\nB1\nC\nD1\nE\n";
    let theirs = "A\nB2\nC\nD2\nE\n";
    let outcome = merge3(base, ours, theirs, &MergeOptions::default()).unwrap();
    assert_eq!(outcome.conflicts.len(), 2);

    // Take ours for the first conflict, theirs for the (now first
    // remaining) second one.
    let step1 = resolve_conflict(&outcome.content, 0, "ours").unwrap();
    let step2 = resolve_conflict(&step1, 0, "theirs").unwrap();
    assert_eq!(step2, "A\nB1\nC\nD2\nE\n");
    assert!(!has_conflicts(&step2));
}

#[test]
fn test_conflict_line_numbers_point_at_markers() {
    let base = "keep1\nkeep2\nchange\nkeep3\n";
    let outcome = merge3(
        base,
        "keep1\nkeep2\nmine\nkeep3\n",
        "keep1\nkeep2\ntheirs\nkeep3\n",
        &MergeOptions::default(),
    )
    .unwrap();
    let conflict = &outcome.conflicts[0];
    let lines: Vec<&str> = outcome.content.lines().collect();
    assert!(lines[conflict.start_line - 1].starts_with("<<<<<<<"));
    assert!(lines[conflict.end_line - 1].starts_with(">>>>>>>"));
}

#[test]
fn test_adjacent_but_not_overlapping_edits_do_not_conflict() {
    // Ours edits line 2, theirs edits line 3; the regions touch but do
    // not overlap.
    let base = "1\n2\n3\n4\n";
    let outcome = merge3(base, "1\nTWO\n3\n4\n", "1\n2\nTHREE\n4\n", &MergeOptions::default()).unwrap();
    assert!(!outcome.has_conflicts);
    assert_eq!(outcome.content, "1\nTWO\nTHREE\n4\n");
}

#[test]
fn test_both_sides_delete_same_line_is_clean() {
    let outcome = merge3("A\nB\nC\n", "A\nC\n", "A\nC\n", &MergeOptions::default()).unwrap();
    assert!(!outcome.has_conflicts);
    assert_eq!(outcome.content, "A\nC\n");
}

#[test]
fn test_crlf_inputs_normalize_to_lf() {
    let outcome = merge3("A\r\nB\r\n", "A\r\nX\r\n", "A\r\nB\r\n", &MergeOptions::default()).unwrap();
    assert_eq!(outcome.content, "A\nX\n");
}
