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

//! Repository-facing commands, each a thin wrapper over the library.

use std::path::PathBuf;

use minigit_lib::diff::DiffOptions;
use minigit_lib::object::Object;
use minigit_lib::object::Signature;
use minigit_lib::object_id::ObjectId;
use minigit_lib::refs::DEFAULT_BRANCH;
use minigit_lib::repo::REPO_DIR_NAME;
use minigit_lib::repo::Repository;
use minigit_lib::revwalk;
use minigit_lib::unified;
use minigit_lib::working_copy::ChangeKind;

use super::CommandError;

#[derive(clap::Args, Debug)]
pub(crate) struct InitArgs {
    /// Directory to initialize (defaults to the current directory).
    #[arg(default_value = ".")]
    path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub(crate) struct AddArgs {
    /// Files or directories to stage, relative to the repository root.
    #[arg(required = true)]
    paths: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RmArgs {
    /// Paths to unstage.
    #[arg(required = true)]
    paths: Vec<String>,
    /// Only remove from the index, keep the file on disk.
    #[arg(long)]
    cached: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CommitArgs {
    /// Commit message.
    #[arg(short, long)]
    message: String,
    /// Override the configured identity, as `Name <email>`.
    #[arg(long)]
    author: Option<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct LogArgs {
    /// Stop after this many commits.
    #[arg(short = 'n', long)]
    max_count: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct BranchArgs {
    /// Branch to create at HEAD; lists branches when omitted.
    name: Option<String>,
    /// Delete the named branch instead.
    #[arg(short, long)]
    delete: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct TagArgs {
    /// Tag to create; lists tags when omitted.
    name: Option<String>,
    /// Revision to tag (defaults to HEAD).
    rev: Option<String>,
    /// Create an annotated tag with this message.
    #[arg(short, long)]
    message: Option<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CheckoutArgs {
    /// Branch to check out.
    branch: String,
}

#[derive(clap::Args, Debug)]
pub(crate) struct StatusArgs {}

#[derive(clap::Args, Debug)]
pub(crate) struct DiffArgs {
    /// Compare the index against HEAD instead of the working tree against
    /// the index.
    #[arg(long)]
    cached: bool,
    /// Limit the diff to these paths.
    paths: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct MergeArgs {
    /// Branch to merge into the current one.
    branch: String,
    /// Merge commit message.
    #[arg(short, long)]
    message: Option<String>,
    /// Override the configured identity, as `Name <email>`.
    #[arg(long)]
    author: Option<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct MergeBaseArgs {
    rev_a: String,
    rev_b: String,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CatFileArgs {
    /// Revision or (short) hash.
    rev: String,
    /// Print the object kind instead of the content.
    #[arg(short = 't', long)]
    kind: bool,
}

fn open_repo() -> Result<Repository, CommandError> {
    let cwd = std::env::current_dir()?;
    Ok(Repository::open(&cwd)?)
}

fn signature(repo: &Repository, author: Option<&str>) -> Result<Signature, CommandError> {
    let now = chrono::Local::now();
    let timestamp = now.timestamp();
    let tz_offset = now.offset().local_minus_utc() / 60;
    match author {
        Some(spec) => parse_author(spec, timestamp, tz_offset),
        None => Ok(repo.config().signature(timestamp, tz_offset)),
    }
}

fn parse_author(spec: &str, timestamp: i64, tz_offset: i32) -> Result<Signature, CommandError> {
    let malformed = || CommandError::Usage(format!("author must be `Name <email>`, got {spec:?}"));
    let (name, rest) = spec.split_once(" <").ok_or_else(malformed)?;
    let email = rest.strip_suffix('>').ok_or_else(malformed)?;
    Ok(Signature {
        name: name.to_string(),
        email: email.to_string(),
        timestamp,
        tz_offset,
    })
}

fn format_date(signature: &Signature) -> String {
    let offset = chrono::FixedOffset::east_opt(signature.tz_offset * 60)
        .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap());
    match chrono::DateTime::from_timestamp(signature.timestamp, 0) {
        Some(datetime) => datetime.with_timezone(&offset).to_rfc2822(),
        None => signature.timestamp.to_string(),
    }
}

pub(crate) fn init(args: InitArgs) -> Result<(), CommandError> {
    let repo = Repository::init(&args.path)?;
    println!(
        "Initialized empty repository in {}",
        repo.repo_path().display()
    );
    Ok(())
}

// Stages one path; directories are staged recursively.
fn add_path(repo: &Repository, index: &mut minigit_lib::index::Index, path: &str) -> Result<(), CommandError> {
    let disk_path = repo.root().join(path);
    if disk_path.is_dir() {
        let mut names: Vec<String> = disk_path
            .read_dir()?
            .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
            .filter(|name| name != REPO_DIR_NAME)
            .collect();
        names.sort();
        for name in names {
            add_path(repo, index, &format!("{path}/{name}"))?;
        }
        return Ok(());
    }
    repo.stage_path(index, path)?;
    Ok(())
}

pub(crate) fn add(args: AddArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let mut index = repo.load_index()?;
    for path in &args.paths {
        let path = path.trim_end_matches('/');
        add_path(&repo, &mut index, path)?;
    }
    repo.save_index(&index)?;
    Ok(())
}

pub(crate) fn rm(args: RmArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let mut index = repo.load_index()?;
    for path in &args.paths {
        if !index.remove(path) {
            return Err(CommandError::Domain(format!("{path} is not staged")));
        }
        if !args.cached {
            match std::fs::remove_file(repo.root().join(path)) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
    repo.save_index(&index)?;
    Ok(())
}

pub(crate) fn commit(args: CommitArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let author = signature(&repo, args.author.as_deref())?;
    let id = repo.commit(&args.message, &author)?;
    println!("[{}] {}", &id.hex()[..7], first_line(&args.message));
    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

pub(crate) fn log(args: LogArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let limit = args.max_count.unwrap_or(usize::MAX);
    for (id, commit) in repo.log()?.take(limit) {
        println!("commit {id}");
        println!("Author: {} <{}>", commit.author.name, commit.author.email);
        println!("Date:   {}", format_date(&commit.author));
        println!();
        for line in commit.message.to_string().lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

pub(crate) fn branch(args: BranchArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    match (args.name, args.delete) {
        (Some(name), true) => {
            repo.refs().delete(&minigit_lib::refs::branch_ref(&name))?;
            println!("Deleted branch {name}");
        }
        (Some(name), false) => repo.create_branch(&name)?,
        (None, true) => {
            return Err(CommandError::Usage("--delete needs a branch name".to_string()));
        }
        (None, false) => {
            let current = repo.refs().current_branch()?;
            for (name, _) in repo.refs().list("refs/heads")? {
                let marker = if Some(&name) == current.as_ref() { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
    }
    Ok(())
}

pub(crate) fn tag(args: TagArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let Some(name) = args.name else {
        for (name, _) in repo.refs().list("refs/tags")? {
            println!("{name}");
        }
        return Ok(());
    };
    let rev = args.rev.as_deref().unwrap_or("HEAD");
    let target = repo.resolve_revision(rev)?;
    let tagger = signature(&repo, None)?;
    repo.create_tag(&name, &target, args.message.as_deref(), &tagger)?;
    Ok(())
}

pub(crate) fn checkout(args: CheckoutArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    repo.checkout_branch(&args.branch)?;
    println!("Switched to branch {}", args.branch);
    Ok(())
}

pub(crate) fn status(_args: StatusArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    match repo.refs().current_branch()? {
        Some(branch) => println!("On branch {branch}"),
        None => println!("HEAD detached"),
    }
    let status = repo.status()?;
    let kind_word = |kind: ChangeKind| match kind {
        ChangeKind::Added => "added:   ",
        ChangeKind::Modified => "modified:",
        ChangeKind::Deleted => "deleted: ",
    };
    if !status.staged.is_empty() {
        println!("\nChanges to be committed:");
        for entry in &status.staged {
            println!("  {} {}", kind_word(entry.kind), entry.path);
        }
    }
    if !status.unstaged.is_empty() {
        println!("\nChanges not staged for commit:");
        for entry in &status.unstaged {
            println!("  {} {}", kind_word(entry.kind), entry.path);
        }
    }
    if !status.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &status.untracked {
            println!("  {path}");
        }
    }
    if status.staged.is_empty() && status.unstaged.is_empty() && status.untracked.is_empty() {
        println!("nothing to commit, working tree clean");
    }
    Ok(())
}

fn blob_text(repo: &Repository, id: &ObjectId) -> Result<String, CommandError> {
    let bytes = repo.store().read_blob(id)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn diff(args: DiffArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let index = repo.load_index()?;
    let status = repo.status()?;
    let options = DiffOptions::default();
    let wanted = |path: &str| args.paths.is_empty() || args.paths.iter().any(|p| p == path);

    if args.cached {
        let head: std::collections::BTreeMap<_, _> = match repo.head_commit()? {
            Some((_, commit)) => {
                minigit_lib::working_copy::flatten_tree(repo.store(), &commit.tree)?
            }
            None => Default::default(),
        };
        for entry in status.staged.iter().filter(|entry| wanted(&entry.path)) {
            let old = match head.get(&entry.path) {
                Some((_, id)) => blob_text(&repo, id)?,
                None => String::new(),
            };
            let new = match index.get(&entry.path) {
                Some(index_entry) => blob_text(&repo, &index_entry.id)?,
                None => String::new(),
            };
            print_file_patch(&entry.path, &old, &new, &options);
        }
    } else {
        for entry in status.unstaged.iter().filter(|entry| wanted(&entry.path)) {
            let old = match index.get(&entry.path) {
                Some(index_entry) => blob_text(&repo, &index_entry.id)?,
                None => String::new(),
            };
            let disk_path = repo.root().join(&entry.path);
            let new = match std::fs::read(&disk_path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(err) => return Err(err.into()),
            };
            print_file_patch(&entry.path, &old, &new, &options);
        }
    }
    Ok(())
}

fn print_file_patch(path: &str, old: &str, new: &str, options: &DiffOptions) {
    let patch = unified::create_file_patch(
        &format!("a/{path}"),
        &format!("b/{path}"),
        old,
        new,
        options,
    );
    print!("{patch}");
}

pub(crate) fn merge(args: MergeArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let author = signature(&repo, args.author.as_deref())?;
    let message = args
        .message
        .unwrap_or_else(|| format!("Merge branch '{}' into {}", args.branch, current_branch_name(&repo)));
    let report = repo.merge_branch(&args.branch, &message, &author)?;
    if report.already_up_to_date {
        println!("Already up to date.");
    } else if report.fast_forward {
        println!("Fast-forward");
    } else if let Some(id) = &report.commit {
        println!("Merge made commit {}", &id.hex()[..7]);
    } else {
        println!("Automatic merge failed; fix conflicts and commit the result.");
        for path in &report.conflicted_paths {
            println!("CONFLICT: {path}");
        }
        return Err(CommandError::Domain(String::new()));
    }
    Ok(())
}

fn current_branch_name(repo: &Repository) -> String {
    repo.refs()
        .current_branch()
        .ok()
        .flatten()
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
}

pub(crate) fn merge_base(args: MergeBaseArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let a = repo.resolve_commit(&args.rev_a)?;
    let b = repo.resolve_commit(&args.rev_b)?;
    match revwalk::merge_base(repo.store(), &a, &b)? {
        Some(base) => {
            println!("{base}");
            Ok(())
        }
        None => Err(CommandError::Domain("no common ancestor".to_string())),
    }
}

pub(crate) fn cat_file(args: CatFileArgs) -> Result<(), CommandError> {
    let repo = open_repo()?;
    let id = repo.resolve_revision(&args.rev)?;
    let object = repo.store().read_object(&id)?;
    if args.kind {
        println!("{}", object.kind());
        return Ok(());
    }
    match object {
        Object::Blob(data) => {
            use std::io::Write as _;
            std::io::stdout().write_all(&data)?;
        }
        Object::Tree(tree) => {
            for entry in tree.entries() {
                let kind = if entry.mode.is_tree() { "tree" } else { "blob" };
                println!(
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_octal_str(),
                    kind,
                    entry.id.hex(),
                    entry.name
                );
            }
        }
        Object::Commit(commit) => {
            println!("tree {}", commit.tree);
            for parent in &commit.parents {
                println!("parent {parent}");
            }
            println!("author {}", commit.author);
            println!("committer {}", commit.committer);
            println!();
            print!("{}", commit.message);
        }
        Object::Tag(tag) => {
            println!("object {}", tag.object);
            println!("type {}", tag.kind);
            println!("tag {}", tag.name);
            if let Some(tagger) = &tag.tagger {
                println!("tagger {tagger}");
            }
            println!();
            print!("{}", tag.message);
        }
    }
    Ok(())
}
