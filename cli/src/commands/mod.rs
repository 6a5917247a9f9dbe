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

mod repo;
mod text;

use minigit_lib::config::ConfigError;
use minigit_lib::index::IndexError;
use minigit_lib::merge::MergeError;
use minigit_lib::object_store::StoreError;
use minigit_lib::refs::RefError;
use minigit_lib::repo::RepoError;
use minigit_lib::unified::PatchParseError;
use minigit_lib::working_copy::WorkingCopyError;

/// How a command failed; decides the process exit code (1 for usage, 2 for
/// domain errors).
#[derive(Debug)]
pub enum CommandError {
    Usage(String),
    Domain(String),
}

impl CommandError {
    pub fn domain(err: impl std::fmt::Display) -> Self {
        Self::Domain(err.to_string())
    }
}

macro_rules! domain_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CommandError {
                fn from(err: $ty) -> Self {
                    Self::domain(err)
                }
            }
        )*
    };
}

domain_error!(
    RepoError,
    StoreError,
    RefError,
    IndexError,
    ConfigError,
    MergeError,
    WorkingCopyError,
    PatchParseError,
    std::io::Error,
);

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::Usage(format!("invalid JSON input: {err}"))
    }
}

#[derive(clap::Parser, Debug)]
#[command(name = "minigit", version, about = "A content-addressed version control engine")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    // Repository commands.
    Init(repo::InitArgs),
    Add(repo::AddArgs),
    Rm(repo::RmArgs),
    Commit(repo::CommitArgs),
    Log(repo::LogArgs),
    Branch(repo::BranchArgs),
    Tag(repo::TagArgs),
    Checkout(repo::CheckoutArgs),
    Status(repo::StatusArgs),
    Diff(repo::DiffArgs),
    Merge(repo::MergeArgs),
    MergeBase(repo::MergeBaseArgs),
    CatFile(repo::CatFileArgs),

    // Text-tool verbs: JSON on stdin, JSON on stdout.
    DiffLines(text::DiffTextArgs),
    DiffWords(text::DiffTextArgs),
    DiffChars(text::DiffTextArgs),
    CreatePatch(text::CreatePatchArgs),
    ApplyPatch(text::ApplyPatchArgs),
    ReversePatch(text::ReversePatchArgs),
    ParsePatch(text::ParsePatchArgs),
    Merge3(text::Merge3Args),
    HasConflicts(text::ConflictTextArgs),
    ExtractConflicts(text::ConflictTextArgs),
    ResolveConflict(text::ResolveConflictArgs),
    IsBinary(text::ConflictTextArgs),
    NormalizeLineEndings(text::ConflictTextArgs),
}

impl Cli {
    pub fn run(self) -> Result<(), CommandError> {
        match self.command {
            Command::Init(args) => repo::init(args),
            Command::Add(args) => repo::add(args),
            Command::Rm(args) => repo::rm(args),
            Command::Commit(args) => repo::commit(args),
            Command::Log(args) => repo::log(args),
            Command::Branch(args) => repo::branch(args),
            Command::Tag(args) => repo::tag(args),
            Command::Checkout(args) => repo::checkout(args),
            Command::Status(args) => repo::status(args),
            Command::Diff(args) => repo::diff(args),
            Command::Merge(args) => repo::merge(args),
            Command::MergeBase(args) => repo::merge_base(args),
            Command::CatFile(args) => repo::cat_file(args),
            Command::DiffLines(args) => text::diff_lines(args),
            Command::DiffWords(args) => text::diff_words(args),
            Command::DiffChars(args) => text::diff_chars(args),
            Command::CreatePatch(args) => text::create_patch(args),
            Command::ApplyPatch(args) => text::apply_patch(args),
            Command::ReversePatch(args) => text::reverse_patch(args),
            Command::ParsePatch(args) => text::parse_patch(args),
            Command::Merge3(args) => text::merge3(args),
            Command::HasConflicts(args) => text::has_conflicts(args),
            Command::ExtractConflicts(args) => text::extract_conflicts(args),
            Command::ResolveConflict(args) => text::resolve_conflict(args),
            Command::IsBinary(args) => text::is_binary(args),
            Command::NormalizeLineEndings(args) => text::normalize_line_endings(args),
        }
    }
}
