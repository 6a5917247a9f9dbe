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

//! The `Repository` value tying the stores together.
//!
//! All state is owned here: the object store, the ref store, the index
//! path, and the parsed configuration. There are no hidden singletons.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use bstr::BString;
use thiserror::Error;

use crate::config::ConfigError;
use crate::config::RepoConfig;
use crate::diff;
use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::file_util::ensure_dir;
use crate::index::Index;
use crate::index::IndexError;
use crate::merge;
use crate::merge::MergeError;
use crate::merge::MergeOptions;
use crate::object::Commit;
use crate::object::FileMode;
use crate::object::Object;
use crate::object::ObjectKind;
use crate::object::Signature;
use crate::object::Tag;
use crate::object_id::ObjectId;
use crate::object_store::ObjectStore;
use crate::object_store::StoreError;
use crate::refs::RefError;
use crate::refs::RefStore;
use crate::refs::RefTarget;
use crate::refs::branch_ref;
use crate::refs::tag_ref;
use crate::revwalk;
use crate::revwalk::RevWalk;
use crate::working_copy;
use crate::working_copy::Status;
use crate::working_copy::WorkingCopyError;

/// Name of the repository directory created under the working-tree root.
pub const REPO_DIR_NAME: &str = ".minigit";

#[expect(missing_docs)]
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("No repository found at {path} or any ancestor")]
    NotFound { path: PathBuf },
    #[error("Repository already exists at {path}")]
    AlreadyExists { path: PathBuf },
    #[error("No commit checked out")]
    NoHead,
    #[error("Revision {rev:?} not found")]
    UnknownRevision { rev: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ref(#[from] RefError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    WorkingCopy(#[from] WorkingCopyError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// Outcome of [`Repository::merge_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// The merge commit, when one was created.
    pub commit: Option<ObjectId>,
    /// The current branch already contained the other branch.
    pub already_up_to_date: bool,
    /// The branch pointer was moved without creating a commit.
    pub fast_forward: bool,
    /// Paths left with conflict markers in the working tree.
    pub conflicted_paths: Vec<String>,
}

/// An open repository: working-tree root plus the `.minigit` state dir.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    repo_path: PathBuf,
    store: ObjectStore,
    refs: RefStore,
    config: RepoConfig,
}

impl Repository {
    /// Creates a fresh repository under `root/.minigit`.
    pub fn init(root: &Path) -> Result<Self, RepoError> {
        let repo_path = root.join(REPO_DIR_NAME);
        if repo_path.exists() {
            return Err(RepoError::AlreadyExists { path: repo_path });
        }
        fs::create_dir_all(root).at(root)?;
        ensure_dir(&repo_path)?;
        let store = ObjectStore::init(&repo_path.join("objects"))?;
        let refs = RefStore::init(&repo_path)?;
        let config = RepoConfig::default();
        config.save(&repo_path.join("config.toml"))?;
        tracing::info!(path = %repo_path.display(), "initialized repository");
        Ok(Self {
            root: root.to_path_buf(),
            repo_path,
            store,
            refs,
            config,
        })
    }

    /// Opens the repository containing `start`, walking up the directory
    /// tree until a `.minigit` directory is found.
    pub fn open(start: &Path) -> Result<Self, RepoError> {
        for dir in start.ancestors() {
            let repo_path = dir.join(REPO_DIR_NAME);
            if repo_path.is_dir() {
                let store = ObjectStore::load(&repo_path.join("objects"));
                let refs = RefStore::load(&repo_path);
                let config = RepoConfig::load(&repo_path.join("config.toml"))?;
                return Ok(Self {
                    root: dir.to_path_buf(),
                    repo_path,
                    store,
                    refs,
                    config,
                });
            }
        }
        Err(RepoError::NotFound {
            path: start.to_path_buf(),
        })
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.minigit` directory.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// The object store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// The ref store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// The parsed configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn index_path(&self) -> PathBuf {
        self.repo_path.join("index")
    }

    /// Loads the staging area.
    pub fn load_index(&self) -> Result<Index, RepoError> {
        Ok(Index::load(&self.index_path())?)
    }

    /// Persists the staging area.
    pub fn save_index(&self, index: &Index) -> Result<(), RepoError> {
        Ok(index.save(&self.index_path())?)
    }

    /// Hashes the working-tree file at `path` into the store and stages it.
    pub fn stage_path(&self, index: &mut Index, path: &str) -> Result<(), RepoError> {
        let disk_path = self.root.join(path);
        let metadata = fs::symlink_metadata(&disk_path).at(&disk_path)?;
        let (mode, content) = if metadata.file_type().is_symlink() {
            let target = fs::read_link(&disk_path).at(&disk_path)?;
            (FileMode::Symlink, target.to_string_lossy().into_owned().into_bytes())
        } else {
            (detect_mode(&metadata), fs::read(&disk_path).at(&disk_path)?)
        };
        let id = self.store.write(ObjectKind::Blob, &content)?;
        index.add(path, mode, id)?;
        Ok(())
    }

    /// The commit HEAD resolves to, or `None` on an unborn branch.
    pub fn head_commit(&self) -> Result<Option<(ObjectId, Commit)>, RepoError> {
        match self.refs.resolve_head()? {
            None => Ok(None),
            Some(id) => {
                let commit = self.store.read_commit(&id)?;
                Ok(Some((id, commit)))
            }
        }
    }

    /// Builds a tree from the index and commits it onto the current branch
    /// (or the detached HEAD), returning the new commit id.
    pub fn commit(&self, message: &str, author: &Signature) -> Result<ObjectId, RepoError> {
        let index = self.load_index()?;
        let tree = index.build_tree(&self.store)?;
        let parents = self.refs.resolve_head()?.into_iter().collect();
        self.commit_tree(tree, parents, message, author)
    }

    fn commit_tree(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
        author: &Signature,
    ) -> Result<ObjectId, RepoError> {
        let commit = Commit {
            tree,
            parents,
            author: author.clone(),
            committer: author.clone(),
            message: BString::from(message),
        };
        let id = self.store.write_object(&Object::Commit(commit))?;
        match self.refs.head()? {
            Some(RefTarget::Symbolic(branch)) => self.refs.write_direct(&branch, &id)?,
            Some(RefTarget::Direct(_)) => self.refs.set_head_detached(&id)?,
            None => {
                return Err(RepoError::Ref(RefError::NotFound {
                    name: "HEAD".to_string(),
                }));
            }
        }
        tracing::info!(%id, "created commit");
        Ok(id)
    }

    /// Walks history from HEAD, newest first.
    pub fn log(&self) -> Result<RevWalk, RepoError> {
        let tips = self.refs.resolve_head()?.into_iter().collect::<Vec<_>>();
        Ok(RevWalk::new(&self.store, tips)?)
    }

    /// Creates a branch at the current HEAD commit.
    pub fn create_branch(&self, name: &str) -> Result<(), RepoError> {
        let (head, _) = self.head_commit()?.ok_or(RepoError::NoHead)?;
        Ok(self.refs.create_branch(name, &head)?)
    }

    /// Creates a tag. With a message, an annotated tag object is written
    /// and the ref points at it; otherwise the ref points straight at the
    /// target.
    pub fn create_tag(
        &self,
        name: &str,
        target: &ObjectId,
        message: Option<&str>,
        tagger: &Signature,
    ) -> Result<ObjectId, RepoError> {
        let full = tag_ref(name);
        if self.refs.read(&full)?.is_some() {
            return Err(RepoError::Ref(RefError::AlreadyExists { name: full }));
        }
        let (kind, _) = self.store.read(target)?;
        let ref_target = match message {
            Some(message) => {
                let tag = Tag {
                    object: target.clone(),
                    kind,
                    name: name.to_string(),
                    tagger: Some(tagger.clone()),
                    message: BString::from(message),
                };
                self.store.write_object(&Object::Tag(tag))?
            }
            None => target.clone(),
        };
        self.refs.write_direct(&full, &ref_target)?;
        Ok(ref_target)
    }

    /// Follows tag objects until a non-tag object is reached.
    pub fn peel(&self, id: &ObjectId) -> Result<ObjectId, RepoError> {
        let mut current = id.clone();
        // Tags of tags are legal; bound the chase like symbolic refs.
        for _ in 0..10 {
            match self.store.read_object(&current)? {
                Object::Tag(tag) => current = tag.object,
                _ => return Ok(current),
            }
        }
        Ok(current)
    }

    /// Resolves a revision string: `HEAD`, a branch, a tag, a full ref
    /// name, or a (short) hash.
    pub fn resolve_revision(&self, rev: &str) -> Result<ObjectId, RepoError> {
        if rev == "HEAD" {
            return self.refs.resolve_head()?.ok_or(RepoError::NoHead);
        }
        for name in [branch_ref(rev), tag_ref(rev), rev.to_string()] {
            match self.refs.read(&name) {
                Ok(Some(_)) => return Ok(self.refs.resolve(&name)?),
                Ok(None) | Err(RefError::InvalidName { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        match self.store.resolve_short(rev) {
            Ok(id) => Ok(id),
            Err(StoreError::NotFound { .. }) => Err(RepoError::UnknownRevision {
                rev: rev.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Resolves a revision all the way to a commit, peeling tags.
    pub fn resolve_commit(&self, rev: &str) -> Result<ObjectId, RepoError> {
        let id = self.resolve_revision(rev)?;
        self.peel(&id)
    }

    /// Checks out a branch: projects its tree, drops tracked files that
    /// are gone, rewrites the index, and repoints HEAD.
    pub fn checkout_branch(&self, name: &str) -> Result<(), RepoError> {
        let commit_id = self.refs.resolve(&branch_ref(name))?;
        let commit = self.store.read_commit(&commit_id)?;
        self.checkout_tree_and_reset_index(&commit.tree)?;
        self.refs.set_head_to_branch(name)?;
        tracing::info!(branch = name, %commit_id, "checked out branch");
        Ok(())
    }

    fn checkout_tree_and_reset_index(&self, tree: &ObjectId) -> Result<(), RepoError> {
        let files = working_copy::flatten_tree(&self.store, tree)?;
        let old_index = self.load_index()?;
        for (path, _) in old_index.iter() {
            if !files.contains_key(path) {
                let disk_path = self.root.join(path);
                match fs::remove_file(&disk_path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(PathError::new(disk_path, err).into()),
                }
            }
        }
        working_copy::checkout_tree(&self.store, tree, &self.root)?;
        let mut index = Index::empty();
        for (path, (mode, id)) in &files {
            index.add(path, *mode, id.clone())?;
        }
        self.save_index(&index)?;
        Ok(())
    }

    /// Classifies staged, unstaged, and untracked paths.
    pub fn status(&self) -> Result<Status, RepoError> {
        let head_tree = self.head_commit()?.map(|(_, commit)| commit.tree);
        let index = self.load_index()?;
        Ok(working_copy::status(
            &self.store,
            head_tree.as_ref(),
            &index,
            &self.root,
            REPO_DIR_NAME,
        )?)
    }

    /// Merges `branch` into the current HEAD.
    ///
    /// Fast-forwards when possible. Otherwise file-level three-way merges
    /// run against the merge base; clean merges produce a merge commit with
    /// both parents, conflicts leave marked files in the working tree and
    /// no commit.
    pub fn merge_branch(
        &self,
        branch: &str,
        message: &str,
        author: &Signature,
    ) -> Result<MergeReport, RepoError> {
        let (ours_id, ours_commit) = self.head_commit()?.ok_or(RepoError::NoHead)?;
        let theirs_id = self.refs.resolve(&branch_ref(branch))?;
        let theirs_commit = self.store.read_commit(&theirs_id)?;

        if revwalk::is_ancestor(&self.store, &theirs_id, &ours_id)? {
            return Ok(MergeReport {
                commit: None,
                already_up_to_date: true,
                fast_forward: false,
                conflicted_paths: vec![],
            });
        }
        if revwalk::is_ancestor(&self.store, &ours_id, &theirs_id)? {
            self.checkout_tree_and_reset_index(&theirs_commit.tree)?;
            match self.refs.head()? {
                Some(RefTarget::Symbolic(head_branch)) => {
                    self.refs.write_direct(&head_branch, &theirs_id)?;
                }
                _ => self.refs.set_head_detached(&theirs_id)?,
            }
            return Ok(MergeReport {
                commit: None,
                already_up_to_date: false,
                fast_forward: true,
                conflicted_paths: vec![],
            });
        }

        let base = revwalk::merge_base(&self.store, &ours_id, &theirs_id)?;
        let base_files = match &base {
            Some(base_id) => {
                let base_commit = self.store.read_commit(base_id)?;
                working_copy::flatten_tree(&self.store, &base_commit.tree)?
            }
            None => Default::default(),
        };
        let ours_files = working_copy::flatten_tree(&self.store, &ours_commit.tree)?;
        let theirs_files = working_copy::flatten_tree(&self.store, &theirs_commit.tree)?;

        let mut merged_index = Index::empty();
        let mut conflicted_paths = vec![];
        let paths: BTreeSet<&String> = ours_files
            .keys()
            .chain(theirs_files.keys())
            .chain(base_files.keys())
            .collect();
        let merge_options = MergeOptions {
            ours_label: "HEAD".to_string(),
            theirs_label: branch.to_string(),
            ..Default::default()
        };
        for path in paths {
            let base_entry = base_files.get(path);
            let ours_entry = ours_files.get(path);
            let theirs_entry = theirs_files.get(path);
            let ours_changed = ours_entry != base_entry;
            let theirs_changed = theirs_entry != base_entry;
            let chosen = if !theirs_changed || ours_entry == theirs_entry {
                ours_entry
            } else if !ours_changed {
                theirs_entry
            } else {
                // Both sides changed the path in different ways.
                match (ours_entry, theirs_entry) {
                    (Some((ours_mode, ours_blob)), Some((_, theirs_blob))) => {
                        let base_text = match base_entry {
                            Some((_, base_blob)) => self.store.read_blob(base_blob)?,
                            None => vec![],
                        };
                        let ours_text = self.store.read_blob(ours_blob)?;
                        let theirs_text = self.store.read_blob(theirs_blob)?;
                        if [&base_text, &ours_text, &theirs_text]
                            .iter()
                            .any(|content| diff::is_binary(content))
                        {
                            self.write_conflicted(path, &ours_text, &mut conflicted_paths)?;
                            continue;
                        }
                        let outcome = merge::merge3(
                            &String::from_utf8_lossy(&base_text),
                            &String::from_utf8_lossy(&ours_text),
                            &String::from_utf8_lossy(&theirs_text),
                            &merge_options,
                        )?;
                        if outcome.has_conflicts {
                            self.write_conflicted(
                                path,
                                outcome.content.as_bytes(),
                                &mut conflicted_paths,
                            )?;
                            continue;
                        }
                        let merged_blob =
                            self.store.write(ObjectKind::Blob, outcome.content.as_bytes())?;
                        merged_index.add(path, *ours_mode, merged_blob)?;
                        continue;
                    }
                    // Deletion on one side vs modification on the other:
                    // keep the modified content and report the conflict.
                    (Some((_, blob)), None) | (None, Some((_, blob))) => {
                        let content = self.store.read_blob(blob)?;
                        self.write_conflicted(path, &content, &mut conflicted_paths)?;
                        continue;
                    }
                    (None, None) => continue,
                }
            };
            if let Some((mode, id)) = chosen {
                merged_index.add(path, *mode, id.clone())?;
            }
        }

        if !conflicted_paths.is_empty() {
            conflicted_paths.sort();
            return Ok(MergeReport {
                commit: None,
                already_up_to_date: false,
                fast_forward: false,
                conflicted_paths,
            });
        }

        let tree = merged_index.build_tree(&self.store)?;
        let commit_id = self.commit_tree(tree, vec![ours_id, theirs_id], message, author)?;
        self.checkout_tree_and_reset_index(&self.store.read_commit(&commit_id)?.tree)?;
        Ok(MergeReport {
            commit: Some(commit_id),
            already_up_to_date: false,
            fast_forward: false,
            conflicted_paths: vec![],
        })
    }

    fn write_conflicted(
        &self,
        path: &str,
        content: &[u8],
        conflicted_paths: &mut Vec<String>,
    ) -> Result<(), RepoError> {
        let disk_path = self.root.join(path);
        if let Some(parent) = disk_path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::write(&disk_path, content).at(&disk_path)?;
        conflicted_paths.push(path.to_string());
        Ok(())
    }
}

#[cfg(unix)]
fn detect_mode(metadata: &fs::Metadata) -> FileMode {
    use std::os::unix::fs::PermissionsExt as _;
    if metadata.permissions().mode() & 0o111 != 0 {
        FileMode::Executable
    } else {
        FileMode::Normal
    }
}

#[cfg(not(unix))]
fn detect_mode(_metadata: &fs::Metadata) -> FileMode {
    FileMode::Normal
}
