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

//! Commit-graph traversals: topological walks, merge bases, reachability.
//!
//! The DAG is acyclic by hash construction and is traversed over ids, never
//! via back-pointers.

use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::object::Commit;
use crate::object_id::ObjectId;
use crate::object_store::ObjectStore;
use crate::object_store::StoreError;

/// A topological walk over ancestors of a set of tips: every commit is
/// yielded before any of its parents, ties broken by committer timestamp
/// descending.
#[derive(Debug)]
pub struct RevWalk {
    commits: HashMap<ObjectId, Commit>,
    // Number of not-yet-yielded children within the reachable set.
    pending_children: HashMap<ObjectId, usize>,
    ready: BinaryHeap<(i64, ObjectId)>,
}

impl RevWalk {
    /// Loads every commit reachable from `tips` and prepares the walk.
    pub fn new(
        store: &ObjectStore,
        tips: impl IntoIterator<Item = ObjectId>,
    ) -> Result<Self, StoreError> {
        let mut commits = HashMap::new();
        let mut pending_children: HashMap<ObjectId, usize> = HashMap::new();
        let mut queue: VecDeque<ObjectId> = tips.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if commits.contains_key(&id) {
                continue;
            }
            let commit = store.read_commit(&id)?;
            for parent in &commit.parents {
                *pending_children.entry(parent.clone()).or_default() += 1;
                queue.push_back(parent.clone());
            }
            commits.insert(id, commit);
        }
        let ready = commits
            .iter()
            .filter(|(id, _)| !pending_children.contains_key(*id))
            .map(|(id, commit)| (commit.committer.timestamp, id.clone()))
            .collect();
        Ok(Self {
            commits,
            pending_children,
            ready,
        })
    }
}

impl Iterator for RevWalk {
    type Item = (ObjectId, Commit);

    fn next(&mut self) -> Option<Self::Item> {
        let (_, id) = self.ready.pop()?;
        let commit = self.commits.remove(&id).unwrap();
        for parent in &commit.parents {
            let count = self
                .pending_children
                .get_mut(parent)
                .expect("every parent has a pending-children count");
            *count -= 1;
            if *count == 0 {
                self.pending_children.remove(parent);
                let parent_commit = &self.commits[parent];
                self.ready
                    .push((parent_commit.committer.timestamp, parent.clone()));
            }
        }
        Some((id, commit))
    }
}

/// Ids of all ancestors of `tip`, including `tip` itself.
pub fn ancestor_set(store: &ObjectStore, tip: &ObjectId) -> Result<HashSet<ObjectId>, StoreError> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([tip.clone()]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let commit = store.read_commit(&id)?;
        queue.extend(commit.parents.iter().cloned());
    }
    Ok(seen)
}

/// Computes a lowest common ancestor of `a` and `b`: all ancestors of `a`
/// are marked, then a breadth-first search from `b` returns the first marked
/// commit it encounters. With multiple independent LCAs the earliest
/// encountered wins, which makes the tie-break deterministic.
pub fn merge_base(
    store: &ObjectStore,
    a: &ObjectId,
    b: &ObjectId,
) -> Result<Option<ObjectId>, StoreError> {
    let marked = ancestor_set(store, a)?;
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([b.clone()]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        if marked.contains(&id) {
            return Ok(Some(id));
        }
        let commit = store.read_commit(&id)?;
        queue.extend(commit.parents.iter().cloned());
    }
    Ok(None)
}

/// Whether `a` is an ancestor of (or equal to) `b`.
pub fn is_ancestor(store: &ObjectStore, a: &ObjectId, b: &ObjectId) -> Result<bool, StoreError> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([b.clone()]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        if id == *a {
            return Ok(true);
        }
        let commit = store.read_commit(&id)?;
        queue.extend(commit.parents.iter().cloned());
    }
    Ok(false)
}
