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

//! The standalone text-tool verbs: each reads one JSON object from stdin
//! and writes one JSON object to stdout. The core returns plain values;
//! all framing lives here.

use std::io::Read as _;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use minigit_lib::conflicts;
use minigit_lib::diff;
use minigit_lib::diff::DiffOptions;
use minigit_lib::merge;
use minigit_lib::merge::ConflictStyle;
use minigit_lib::merge::MergeOptions;
use minigit_lib::patch;
use minigit_lib::patch::ApplyOptions;
use minigit_lib::unified;

use super::CommandError;

#[derive(clap::Args, Debug)]
pub(crate) struct DiffTextArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct CreatePatchArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct ApplyPatchArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct ReversePatchArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct ParsePatchArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct Merge3Args {}

#[derive(clap::Args, Debug)]
pub(crate) struct ConflictTextArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct ResolveConflictArgs {}

fn read_input<T: DeserializeOwned>() -> Result<T, CommandError> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(serde_json::from_str(&buffer)?)
}

fn write_output<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value).expect("output is serializable"));
    Ok(())
}

#[derive(Deserialize)]
struct DiffInput {
    old: String,
    new: String,
    #[serde(default)]
    ignore_whitespace: bool,
    #[serde(default)]
    ignore_blank_lines: bool,
}

impl DiffInput {
    fn options(&self) -> DiffOptions {
        DiffOptions {
            ignore_whitespace: self.ignore_whitespace,
            ignore_blank_lines: self.ignore_blank_lines,
            ..Default::default()
        }
    }
}

pub(crate) fn diff_lines(_args: DiffTextArgs) -> Result<(), CommandError> {
    let input: DiffInput = read_input()?;
    write_output(&diff::diff_lines(&input.old, &input.new, &input.options()))
}

pub(crate) fn diff_words(_args: DiffTextArgs) -> Result<(), CommandError> {
    let input: DiffInput = read_input()?;
    write_output(&diff::diff_words(&input.old, &input.new, &input.options()))
}

pub(crate) fn diff_chars(_args: DiffTextArgs) -> Result<(), CommandError> {
    let input: DiffInput = read_input()?;
    write_output(&diff::diff_chars(&input.old, &input.new, &input.options()))
}

#[derive(Deserialize)]
struct CreatePatchInput {
    old: String,
    new: String,
    #[serde(default = "default_context_lines")]
    context_lines: usize,
    #[serde(default = "default_old_file")]
    old_file: String,
    #[serde(default = "default_new_file")]
    new_file: String,
}

fn default_context_lines() -> usize {
    DiffOptions::default().context_lines
}

fn default_old_file() -> String {
    "a".to_string()
}

fn default_new_file() -> String {
    "b".to_string()
}

#[derive(Serialize)]
struct PatchOutput {
    patch: String,
}

pub(crate) fn create_patch(_args: CreatePatchArgs) -> Result<(), CommandError> {
    let input: CreatePatchInput = read_input()?;
    let options = DiffOptions {
        context_lines: input.context_lines,
        ..Default::default()
    };
    let patch = unified::create_file_patch(
        &input.old_file,
        &input.new_file,
        &input.old,
        &input.new,
        &options,
    );
    write_output(&PatchOutput { patch })
}

#[derive(Deserialize)]
struct ApplyPatchInput {
    content: String,
    patch: String,
    #[serde(default = "default_max_offset")]
    max_offset: usize,
}

fn default_max_offset() -> usize {
    ApplyOptions::default().max_offset
}

pub(crate) fn apply_patch(_args: ApplyPatchArgs) -> Result<(), CommandError> {
    let input: ApplyPatchInput = read_input()?;
    let parsed = unified::parse_patch(&input.patch)?;
    let options = ApplyOptions {
        max_offset: input.max_offset,
    };
    let result = patch::apply_patch(&input.content, &parsed, &options);
    write_output(&result)?;
    if result.success {
        Ok(())
    } else {
        // The JSON above carries the details; exit code 2 signals the
        // failure to scripts.
        Err(CommandError::Domain(String::new()))
    }
}

#[derive(Deserialize)]
struct PatchTextInput {
    patch: String,
}

pub(crate) fn reverse_patch(_args: ReversePatchArgs) -> Result<(), CommandError> {
    let input: PatchTextInput = read_input()?;
    let patch = unified::reverse_patch(&input.patch)?;
    write_output(&PatchOutput { patch })
}

pub(crate) fn parse_patch(_args: ParsePatchArgs) -> Result<(), CommandError> {
    let input: PatchTextInput = read_input()?;
    write_output(&unified::parse_patch(&input.patch)?)
}

#[derive(Deserialize)]
struct Merge3Input {
    base: String,
    ours: String,
    theirs: String,
    #[serde(default)]
    conflict_style: Option<ConflictStyle>,
    #[serde(default)]
    ours_label: Option<String>,
    #[serde(default)]
    base_label: Option<String>,
    #[serde(default)]
    theirs_label: Option<String>,
}

pub(crate) fn merge3(_args: Merge3Args) -> Result<(), CommandError> {
    let input: Merge3Input = read_input()?;
    let defaults = MergeOptions::default();
    let options = MergeOptions {
        style: input.conflict_style.unwrap_or(defaults.style),
        ours_label: input.ours_label.unwrap_or(defaults.ours_label),
        base_label: input.base_label.unwrap_or(defaults.base_label),
        theirs_label: input.theirs_label.unwrap_or(defaults.theirs_label),
    };
    let outcome = merge::merge3(&input.base, &input.ours, &input.theirs, &options)?;
    write_output(&outcome)
}

#[derive(Deserialize)]
struct ContentInput {
    content: String,
}

#[derive(Serialize)]
struct HasConflictsOutput {
    has_conflicts: bool,
}

pub(crate) fn has_conflicts(_args: ConflictTextArgs) -> Result<(), CommandError> {
    let input: ContentInput = read_input()?;
    write_output(&HasConflictsOutput {
        has_conflicts: conflicts::has_conflicts(&input.content),
    })
}

#[derive(Serialize)]
struct ExtractConflictsOutput {
    conflicts: Vec<conflicts::Conflict>,
}

pub(crate) fn extract_conflicts(_args: ConflictTextArgs) -> Result<(), CommandError> {
    let input: ContentInput = read_input()?;
    write_output(&ExtractConflictsOutput {
        conflicts: conflicts::extract_conflicts(&input.content),
    })
}

#[derive(Deserialize)]
struct ResolveConflictInput {
    content: String,
    index: usize,
    resolution: String,
}

#[derive(Serialize)]
struct ContentOutput {
    content: String,
}

pub(crate) fn resolve_conflict(_args: ResolveConflictArgs) -> Result<(), CommandError> {
    let input: ResolveConflictInput = read_input()?;
    match conflicts::resolve_conflict(&input.content, input.index, &input.resolution) {
        Some(content) => write_output(&ContentOutput { content }),
        None => Err(CommandError::Domain(format!(
            "no conflict at index {}",
            input.index
        ))),
    }
}

#[derive(Serialize)]
struct IsBinaryOutput {
    is_binary: bool,
}

pub(crate) fn is_binary(_args: ConflictTextArgs) -> Result<(), CommandError> {
    let input: ContentInput = read_input()?;
    write_output(&IsBinaryOutput {
        is_binary: diff::is_binary(input.content.as_bytes()),
    })
}

pub(crate) fn normalize_line_endings(_args: ConflictTextArgs) -> Result<(), CommandError> {
    let input: ContentInput = read_input()?;
    write_output(&ContentOutput {
        content: diff::normalize_line_endings(&input.content),
    })
}
