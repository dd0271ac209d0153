//! State builder (C4): walk declared dependencies against the live
//! filesystem and produce a fresh `MonitorStateFileSet`.

use std::path::Path;

use crate::dependency::Dependency;
use crate::error::StatCacheError;
use crate::fs_primitives;
use crate::glob_path::GlobPath;

use super::{path_key, GlobState, MonitorStateFileSet, SinglePathState};

/// Builds state for every declared dependency, in input order for single
/// paths (collapsed into the map) and declaration order for globs.
pub fn build_state(root: &Path, deps: &[Dependency]) -> Result<MonitorStateFileSet, StatCacheError> {
    let mut state = MonitorStateFileSet::empty();
    for dep in deps {
        match dep {
            Dependency::File(p) => {
                let full = root.join(p);
                let single = match fs_primitives::mtime_opt(&full)? {
                    Some(mtime) => SinglePathState::File(mtime),
                    None => SinglePathState::StickyChanged,
                };
                state.single_paths.insert(path_key(p), single);
            }
            Dependency::HashedFile(p) => {
                let full = root.join(p);
                let single = match fs_primitives::mtime_opt(&full)? {
                    Some(mtime) => {
                        let hash = fs_primitives::hash_file(&full)?;
                        SinglePathState::HashedFile(mtime, hash)
                    }
                    None => SinglePathState::StickyHashChanged,
                };
                state.single_paths.insert(path_key(p), single);
            }
            Dependency::Absent(p) => {
                state.single_paths.insert(path_key(p), SinglePathState::Absent);
            }
            Dependency::Glob(gp) => {
                state.globs.push(build_glob_state(root, ".", gp)?);
            }
        }
    }
    Ok(state)
}

pub(crate) fn join_rel(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Builds a `GlobState` tree for `gp` rooted at `root/dir`.
///
/// If `root/dir` doesn't exist, the matched set is treated as empty with a
/// sentinel (`None`) mtime, so a later appearance of the directory is
/// detected via the parent's mtime change on the next probe — the
/// recommended resolution for spec §4.C4's open question on missing build-
/// time directories.
pub fn build_glob_state(root: &Path, dir: &str, gp: &GlobPath) -> Result<GlobState, StatCacheError> {
    let full_dir = root.join(dir);
    let dir_mtime = fs_primitives::mtime_opt(&full_dir)?;
    let names = match dir_mtime {
        Some(_) => fs_primitives::list_dir(&full_dir)?,
        None => Vec::new(),
    };

    match gp {
        GlobPath::Dir(seg, rest) => {
            let mut matched: Vec<String> = names
                .into_iter()
                .filter(|n| seg.is_match(n))
                .filter(|n| fs_primitives::is_dir(&full_dir.join(n)))
                .collect();
            matched.sort();
            matched.dedup();

            let mut children = Vec::with_capacity(matched.len());
            for name in matched {
                let child_dir = join_rel(dir, &name);
                let child_state = build_glob_state(root, &child_dir, rest)?;
                children.push((name, child_state));
            }
            Ok(GlobState::Dirs(seg.clone(), rest.clone(), dir_mtime, children))
        }
        GlobPath::File(seg) => {
            let mut matched: Vec<String> = names
                .into_iter()
                .filter(|n| seg.is_match(n))
                .filter(|n| fs_primitives::is_file(&full_dir.join(n)))
                .collect();
            matched.sort();
            matched.dedup();

            let mut entries = Vec::with_capacity(matched.len());
            for name in matched {
                let path = full_dir.join(&name);
                // A listed entry can vanish before we get to stat/hash it
                // (a concurrent process, a transient temp file); skip it
                // rather than fail the whole build, matching the "probes
                // report Changed, but builds never fail" design.
                let Some(mtime) = fs_primitives::mtime_opt(&path)? else {
                    continue;
                };
                let hash = fs_primitives::hash_file(&path)?;
                entries.push((name, mtime, hash));
            }
            Ok(GlobState::Files(seg.clone(), dir_mtime, entries))
        }
    }
}
