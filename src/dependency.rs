//! The declared-dependency type: what a client tells the engine it read.

use std::path::{Path, PathBuf};

use crate::glob_path::GlobPath;

/// A single thing on disk whose state may invalidate a cached result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A file expected to exist, tracked by mtime.
    File(PathBuf),
    /// A file expected to exist, tracked by mtime and content hash.
    HashedFile(PathBuf),
    /// A path expected not to exist.
    Absent(PathBuf),
    /// A set of files matching a globbed filesystem path.
    Glob(GlobPath),
}

/// Build the dependency set for a "search path" lookup: the file was found
/// at `found_at`, having first been looked for (and not found) at each of
/// `not_found_at`. A later appearance at any of those earlier paths must
/// invalidate the result, since it would shadow `found_at`.
pub fn monitor_search_path(not_found_at: &[PathBuf], found_at: &Path) -> Vec<Dependency> {
    let mut deps = vec![Dependency::File(found_at.to_path_buf())];
    deps.extend(not_found_at.iter().cloned().map(Dependency::Absent));
    deps
}

/// As [`monitor_search_path`], but the found file is also content-hashed.
pub fn monitor_hashed_search_path(not_found_at: &[PathBuf], found_at: &Path) -> Vec<Dependency> {
    let mut deps = vec![Dependency::HashedFile(found_at.to_path_buf())];
    deps.extend(not_found_at.iter().cloned().map(Dependency::Absent));
    deps
}
