//! Persisted filesystem state (spec §3): the shape that gets written to a
//! cache file and read back on the next probe.

pub mod builder;
pub mod codec;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::fs_primitives::Hash;
use crate::glob_path::{GlobPath, GlobSegment};
use crate::mtime::ModTime;

/// Cached state for a single declared path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinglePathState {
    /// The file existed at build time, tracked by mtime.
    File(ModTime),
    /// The file existed at build time, tracked by mtime and content hash.
    HashedFile(ModTime, Hash),
    /// The path was absent at build time, as expected.
    Absent,
    /// A `File` dependency was missing when `update_monitor` tried to
    /// measure it. Every subsequent probe reports `Changed` until the next
    /// `update_monitor` call.
    StickyChanged,
    /// As `StickyChanged`, for a `HashedFile` dependency.
    StickyHashChanged,
}

/// Cached state for one level of a glob path, forming a tree that mirrors
/// the declared glob's directory structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobState {
    /// An interior node: this directory's mtime plus the per-matching-subdir
    /// child states, sorted ascending by name with no duplicates. `rest` is
    /// the remaining glob path applied inside each matched subdirectory.
    Dirs(GlobSegment, Box<GlobPath>, Option<ModTime>, Vec<(String, GlobState)>),
    /// A leaf: this directory's mtime plus per-matching-file metadata,
    /// sorted ascending by name with no duplicates.
    Files(GlobSegment, Option<ModTime>, Vec<(String, ModTime, Hash)>),
}

impl GlobState {
    /// The glob path this state tree was built from, reconstructed purely
    /// from the stored segment(s) — no filesystem access needed. Used both
    /// to recurse during a build/probe and to reconstruct the declared
    /// dependency list in `check_monitor`.
    pub fn glob_path(&self) -> GlobPath {
        match self {
            GlobState::Dirs(seg, rest, ..) => GlobPath::dir(seg.clone(), (**rest).clone()),
            GlobState::Files(seg, ..) => GlobPath::file(seg.clone()),
        }
    }

    /// `true` iff this subtree currently has at least one matched file.
    pub fn has_matching_files(&self) -> bool {
        match self {
            GlobState::Files(_, _, entries) => !entries.is_empty(),
            GlobState::Dirs(_, _, _, children) => {
                children.iter().any(|(_, child)| child.has_matching_files())
            }
        }
    }
}

/// The full monitored-file-set snapshot persisted alongside a key/result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStateFileSet {
    /// Relative path -> cached state. A `BTreeMap` so the codec encodes it
    /// as sorted key/value pairs for free, and so probe order is
    /// deterministic between runs.
    pub single_paths: BTreeMap<String, SinglePathState>,
    /// One tree per declared `Glob` dependency, in declaration order.
    pub globs: Vec<GlobState>,
}

impl MonitorStateFileSet {
    pub fn empty() -> Self {
        Self {
            single_paths: BTreeMap::new(),
            globs: Vec::new(),
        }
    }

    /// Projects this state back into the dependency list that would
    /// reproduce it — the "pure projection" from spec §4.C8 step 4:
    /// `File->File`, `HashedFile->HashedFile`, `Absent->Absent`,
    /// `Sticky-Changed->File`, `Sticky-HashChanged->HashedFile`,
    /// glob-state->`Glob(seg-path)`.
    pub fn declared_dependencies(&self) -> Vec<Dependency> {
        let mut deps = Vec::with_capacity(self.single_paths.len() + self.globs.len());
        for (path, state) in &self.single_paths {
            let p = PathBuf::from(path);
            deps.push(match state {
                SinglePathState::File(_) | SinglePathState::StickyChanged => Dependency::File(p),
                SinglePathState::HashedFile(..) | SinglePathState::StickyHashChanged => {
                    Dependency::HashedFile(p)
                }
                SinglePathState::Absent => Dependency::Absent(p),
            });
        }
        for glob in &self.globs {
            deps.push(Dependency::Glob(glob.glob_path()));
        }
        deps
    }
}

/// Stable string key for the single-path map: forward slashes regardless of
/// platform, so the cache is byte-identical across builds run on different
/// operating systems.
pub(crate) fn path_key(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
