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

use minigit_lib::diff::DiffOp;
use minigit_lib::diff::DiffOptions;
use minigit_lib::diff::diff_lines;
use minigit_lib::patch::ApplyOptions;
use minigit_lib::patch::apply_patch;
use minigit_lib::unified::create_patch;
use minigit_lib::unified::emit_patch;
use minigit_lib::unified::parse_patch;
use minigit_lib::unified::reverse_patch;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn apply(content: &str, patch_text: &str) -> minigit_lib::patch::ApplyResult {
    let patch = parse_patch(patch_text).unwrap();
    apply_patch(content, &patch, &ApplyOptions::default())
}

#[test_case("1\n2\n3\n4\n5\n", "1\n2\nX\n4\n5\n"; "single change")]
#[test_case("a\nb\nc\n", "x\na\nb\nc\ny\n"; "inserts at both ends")]
#[test_case("a\nb\nc\nd\ne\nf\ng\nh\ni\nj\nk\nl\n", "a\nB\nc\nd\ne\nf\ng\nh\ni\nj\nK\nl\n"; "two separated hunks")]
#[test_case("only\n", ""; "delete everything")]
#[test_case("", "brand\nnew\n"; "create from nothing")]
fn test_apply_create_patch_round_trip(old: &str, new: &str) {
    let patch = create_patch(old, new, &DiffOptions::default());
    let result = apply(old, &patch);
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.content, new);

    // The reverse patch takes `new` back to `old`.
    let reversed = reverse_patch(&patch).unwrap();
    let result = apply(new, &reversed);
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.content, old);
}

#[test]
fn test_apply_is_idempotent() {
    let old = "1\n2\n3\n4\n5\n";
    let new = "1\n2\nX\n4\n5\n";
    let patch = create_patch(old, new, &DiffOptions::default());

    let first = apply(old, &patch);
    assert!(first.success);
    assert_eq!(first.content, new);

    // Applying again is a success without further changes.
    let second = apply(&first.content, &patch);
    assert!(second.success);
    assert_eq!(second.content, new);
    assert!(second.hunk_results.iter().all(|r| r.already_applied));
}

#[test]
fn test_unified_scenario_with_one_context_line() {
    let old = "1\n2\n3\n4\n5\n";
    let new = "1\n2\nX\n4\n5\n";
    let options = DiffOptions {
        context_lines: 1,
        ..Default::default()
    };
    let patch = create_patch(old, new, &options);
    assert!(patch.contains("@@ -2,3 +2,3 @@"));
    assert!(patch.contains(" 2\n-3\n+X\n 4\n"));
    assert_eq!(apply(old, &patch).content, new);
}

#[test]
fn test_fuzzy_apply_records_offset() {
    let old = "1\n2\n3\n4\n5\n";
    let new = "1\n2\nX\n4\n5\n";
    let options = DiffOptions {
        context_lines: 1,
        ..Default::default()
    };
    let patch = create_patch(old, new, &options);

    let shifted_old = format!("\n\n{old}");
    let result = apply(&shifted_old, &patch);
    assert!(result.success);
    assert_eq!(result.hunks_applied, 1);
    assert_eq!(result.hunk_results[0].offset, 2);
    assert_eq!(result.content, format!("\n\n{new}"));
}

#[test]
fn test_patch_wire_format() {
    let options = DiffOptions {
        context_lines: 1,
        ..Default::default()
    };
    let patch = create_patch("1\n2\n3\n4\n5\n", "1\n2\nX\n4\n5\n", &options);
    insta::assert_snapshot!(patch, @r"
    --- a
    +++ b
    @@ -2,3 +2,3 @@
     2
    -3
    +X
     4
    ");
}

#[test]
fn test_parse_emit_fixed_point() {
    let texts = [
        "--- a\n+++ b\n@@ -1,2 +1,2 @@\n-x\n+y\n z\n",
        "--- left\n+++ right\n@@ -4 +4 @@\n-m\n+n\n",
    ];
    for text in texts {
        let parsed = parse_patch(text).unwrap();
        let emitted = emit_patch(&parsed);
        assert_eq!(parse_patch(&emitted).unwrap(), parsed);
        // Emitting is a fixed point after one normalization.
        assert_eq!(emit_patch(&parse_patch(&emitted).unwrap()), emitted);
    }
}

#[test]
fn test_diff_hunks_reconstruct_both_sides() {
    let cases = [
        ("a\nb\nc\n", "a\nB\nc\n"),
        ("x\n", "x\ny\nz\n"),
        ("1\n2\n3\n", "3\n2\n1\n"),
        ("", "fresh\n"),
    ];
    for (old, new) in cases {
        let diff = diff_lines(old, new, &DiffOptions::default());
        let mut rebuilt_old = vec![];
        let mut rebuilt_new = vec![];
        for hunk in &diff.hunks {
            match hunk.op {
                DiffOp::Equal => {
                    rebuilt_old.push(hunk.content.as_str());
                    rebuilt_new.push(hunk.content.as_str());
                }
                DiffOp::Delete => rebuilt_old.push(hunk.content.as_str()),
                DiffOp::Insert => rebuilt_new.push(hunk.content.as_str()),
            }
        }
        let join = |lines: &[&str]| {
            if lines.is_empty() {
                String::new()
            } else {
                format!("{}\n", lines.join("\n"))
            }
        };
        assert_eq!(join(&rebuilt_old), old, "old side of {old:?} -> {new:?}");
        assert_eq!(join(&rebuilt_new), new, "new side of {old:?} -> {new:?}");
    }
}
