//! Glob prober (C7): recursively reconcile a cached glob subtree against the
//! live filesystem. This is the subtle half of the engine — see module docs
//! on each branch for why.

use std::path::Path;

use crate::fs_primitives;
use crate::glob_path::{GlobPath, GlobSegment};
use crate::merge::{merge_sorted, merge_sorted_names, MergeItem, NameMergeItem};
use crate::mtime::ModTime;
use crate::state::builder::{build_glob_state, join_rel};
use crate::state::GlobState;
use crate::trace::{emit, TraceEvent, Tracer};

use super::{Dirty, ProbeOutcome, ProbeResult};

#[derive(PartialEq, Eq)]
enum DirCmp {
    /// The directory existed in the cache but is gone now.
    Missing,
    /// Cached and live mtimes agree (including both being the sentinel).
    Equal,
    /// Mtimes disagree, or the directory appeared where the cache had a
    /// sentinel — reconciliation is needed either way.
    Differs,
}

fn compare_dir_mtime(cached: Option<ModTime>, live: Option<ModTime>) -> DirCmp {
    match (cached, live) {
        (Some(_), None) => DirCmp::Missing,
        (c, l) if c == l => DirCmp::Equal,
        _ => DirCmp::Differs,
    }
}

/// Dispatches to the `Dirs` or `Files` branch for `state`.
pub fn probe_glob(
    root: &Path,
    dir: &str,
    state: &GlobState,
    tracer: Option<&dyn Tracer>,
) -> ProbeResult<GlobState> {
    match state {
        GlobState::Dirs(seg, rest, dir_mtime, children) => {
            probe_dirs(root, dir, seg, rest, *dir_mtime, children, tracer)
        }
        GlobState::Files(seg, dir_mtime, entries) => {
            probe_files(root, dir, seg, *dir_mtime, entries, tracer)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn probe_dirs(
    root: &Path,
    dir: &str,
    seg: &GlobSegment,
    rest: &GlobPath,
    dir_mtime: Option<ModTime>,
    children: &[(String, GlobState)],
    tracer: Option<&dyn Tracer>,
) -> ProbeResult<GlobState> {
    let full_dir = root.join(dir);
    let live_mtime = fs_primitives::mtime_opt(&full_dir)?;

    match compare_dir_mtime(dir_mtime, live_mtime) {
        DirCmp::Missing => {
            emit(tracer, TraceEvent::GlobDirMissing { path: dir });
            Ok(ProbeOutcome::Changed)
        }
        DirCmp::Equal => {
            // The directory itself hasn't been touched — recurse into
            // every cached child without re-listing.
            let mut new_children = Vec::with_capacity(children.len());
            let mut dirty = Dirty::Clean;
            for (name, child_state) in children {
                let child_dir = join_rel(dir, name);
                match probe_glob(root, &child_dir, child_state, tracer)? {
                    ProbeOutcome::Changed => return Ok(ProbeOutcome::Changed),
                    ProbeOutcome::Unchanged(new_state, child_dirty) => {
                        dirty = dirty.merge(child_dirty);
                        new_children.push((name.clone(), new_state));
                    }
                }
            }
            Ok(ProbeOutcome::Unchanged(
                GlobState::Dirs(seg.clone(), Box::new(rest.clone()), dir_mtime, new_children),
                dirty,
            ))
        }
        DirCmp::Differs => reconcile_dirs(root, dir, &full_dir, seg, rest, live_mtime, children, tracer),
    }
}

#[allow(clippy::too_many_arguments)]
fn reconcile_dirs(
    root: &Path,
    dir: &str,
    full_dir: &Path,
    seg: &GlobSegment,
    rest: &GlobPath,
    live_mtime: Option<ModTime>,
    children: &[(String, GlobState)],
    tracer: Option<&dyn Tracer>,
) -> ProbeResult<GlobState> {
    let mut live_names: Vec<String> = fs_primitives::list_dir(full_dir)?
        .into_iter()
        .filter(|n| seg.is_match(n))
        .filter(|n| fs_primitives::is_dir(&full_dir.join(n)))
        .collect();
    live_names.sort();
    live_names.dedup();

    let merged = merge_sorted(children, &live_names);
    let mut new_children = Vec::with_capacity(merged.len());
    let mut dirty = Dirty::Clean;

    for item in merged {
        match item {
            MergeItem::Both(name, child_state) => {
                let child_dir = join_rel(dir, name);
                match probe_glob(root, &child_dir, child_state, tracer)? {
                    ProbeOutcome::Changed => return Ok(ProbeOutcome::Changed),
                    ProbeOutcome::Unchanged(new_state, child_dirty) => {
                        dirty = dirty.merge(child_dirty);
                        new_children.push((name.to_string(), new_state));
                    }
                }
            }
            MergeItem::OnlyLive(name) => {
                // A new directory appeared where the cache had nothing.
                let child_dir = join_rel(dir, name);
                let fresh = build_glob_state(root, &child_dir, rest)?;
                if fresh.has_matching_files() {
                    emit(tracer, TraceEvent::GlobNewMatch { path: &child_dir });
                    return Ok(ProbeOutcome::Changed);
                }
                // Appeared but empty: not a change, but the cache now
                // needs to know about this subtree so the next probe
                // doesn't redo this same reconciliation for nothing.
                emit(tracer, TraceEvent::CacheDirty { path: &child_dir });
                dirty = Dirty::Dirty;
                new_children.push((name.to_string(), fresh));
            }
            MergeItem::OnlyCached(name, child_state) => {
                if child_state.has_matching_files() {
                    emit(tracer, TraceEvent::GlobSubtreeDisappeared { path: name });
                    return Ok(ProbeOutcome::Changed);
                }
                // A previously-empty subtree vanished: harmless, drop it
                // silently without marking the cache dirty over it.
                new_children.push((name.to_string(), child_state.clone()));
            }
        }
    }

    // A directory-mtime-only advance never marks the cache dirty on its
    // own — the rewrite would cost more than the single scan it saves.
    Ok(ProbeOutcome::Unchanged(
        GlobState::Dirs(seg.clone(), Box::new(rest.clone()), live_mtime, new_children),
        dirty,
    ))
}

#[allow(clippy::too_many_arguments)]
fn probe_files(
    root: &Path,
    dir: &str,
    seg: &GlobSegment,
    dir_mtime: Option<ModTime>,
    entries: &[(String, ModTime, fs_primitives::Hash)],
    tracer: Option<&dyn Tracer>,
) -> ProbeResult<GlobState> {
    let full_dir = root.join(dir);
    let live_mtime = fs_primitives::mtime_opt(&full_dir)?;

    let new_dir_mtime = match compare_dir_mtime(dir_mtime, live_mtime) {
        DirCmp::Missing => {
            emit(tracer, TraceEvent::GlobDirMissing { path: dir });
            return Ok(ProbeOutcome::Changed);
        }
        DirCmp::Equal => dir_mtime,
        DirCmp::Differs => {
            let mut live_names: Vec<String> = fs_primitives::list_dir(&full_dir)?
                .into_iter()
                .filter(|n| seg.is_match(n))
                .filter(|n| fs_primitives::is_file(&full_dir.join(n)))
                .collect();
            live_names.sort();
            live_names.dedup();

            let cached_names: Vec<String> = entries.iter().map(|(n, _, _)| n.clone()).collect();
            let merged = merge_sorted_names(&cached_names, &live_names);
            if merged.iter().any(|item| !matches!(item, NameMergeItem::Both(_))) {
                emit(tracer, TraceEvent::GlobFileSetChanged { path: dir });
                return Ok(ProbeOutcome::Changed);
            }
            // Same matched set, just a directory mtime bump — adopt it
            // without marking dirty (same reasoning as the Dirs branch).
            live_mtime
        }
    };

    for (name, mtime, hash) in entries {
        let path = full_dir.join(name);
        match fs_primitives::mtime_opt(&path)? {
            None => {
                emit(tracer, TraceEvent::SinglePathMissing { path: name });
                return Ok(ProbeOutcome::Changed);
            }
            Some(live) if live == *mtime => {}
            Some(_) => {
                let live_hash = fs_primitives::hash_file(&path)?;
                if live_hash != *hash {
                    emit(tracer, TraceEvent::GlobEntryChanged { path: name });
                    return Ok(ProbeOutcome::Changed);
                }
            }
        }
    }

    Ok(ProbeOutcome::Unchanged(
        GlobState::Files(seg.clone(), new_dir_mtime, entries.to_vec()),
        Dirty::Clean,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::state::builder::build_glob_state;
    use std::fs;
    use tempfile::TempDir;

    fn glob_file(pattern: &str) -> GlobPath {
        GlobPath::file(GlobSegment::new(pattern).unwrap())
    }

    fn glob_dir(pattern: &str, rest: GlobPath) -> GlobPath {
        GlobPath::dir(GlobSegment::new(pattern).unwrap(), rest)
    }

    #[test]
    fn unchanged_when_nothing_moved() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cabal"), "").unwrap();
        let gp = glob_file("*.cabal");
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();
        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }

    #[test]
    fn changed_when_matching_file_deleted() {
        let tmp = TempDir::new().unwrap();
        let pkgs = tmp.path().join("pkgs");
        fs::create_dir_all(&pkgs).unwrap();
        fs::write(pkgs.join("one.conf"), "").unwrap();
        let gp = glob_dir("pkgs", glob_file("*.conf"));
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        fs::remove_file(pkgs.join("one.conf")).unwrap();
        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn new_empty_sibling_dir_marks_dirty_not_changed() {
        let tmp = TempDir::new().unwrap();
        let proj1 = tmp.path().join("proj1");
        fs::create_dir_all(&proj1).unwrap();
        fs::write(proj1.join("a.cabal"), "").unwrap();
        let gp = glob_dir("proj*", glob_file("*.cabal"));
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        // proj2 appears but stays empty.
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::create_dir_all(tmp.path().join("proj2")).unwrap();

        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        let (new_state, dirty) = match outcome {
            ProbeOutcome::Unchanged(s, d) => (s, d),
            ProbeOutcome::Changed => panic!("expected Unchanged"),
        };
        assert_eq!(dirty, Dirty::Dirty);
        match &new_state {
            GlobState::Dirs(_, _, _, children) => {
                assert_eq!(children.len(), 2);
                let proj2 = children.iter().find(|(n, _)| n == "proj2").unwrap();
                assert!(!proj2.1.has_matching_files());
            }
            GlobState::Files(..) => panic!("expected Dirs"),
        }

        // A second probe against the now-cached state is fully quiet.
        let second = probe_glob(tmp.path(), ".", &new_state, None).unwrap();
        assert!(matches!(second, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }

    #[test]
    fn new_matching_sibling_dir_is_changed() {
        let tmp = TempDir::new().unwrap();
        let proj1 = tmp.path().join("proj1");
        fs::create_dir_all(&proj1).unwrap();
        fs::write(proj1.join("a.cabal"), "").unwrap();
        let gp = glob_dir("proj*", glob_file("*.cabal"));
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let proj2 = tmp.path().join("proj2");
        fs::create_dir_all(&proj2).unwrap();
        fs::write(proj2.join("b.cabal"), "").unwrap();

        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn disappeared_matching_subtree_is_changed() {
        let tmp = TempDir::new().unwrap();
        let proj1 = tmp.path().join("proj1");
        let proj2 = tmp.path().join("proj2");
        fs::create_dir_all(&proj1).unwrap();
        fs::create_dir_all(&proj2).unwrap();
        fs::write(proj1.join("a.cabal"), "").unwrap();
        fs::write(proj2.join("b.cabal"), "").unwrap();
        let gp = glob_dir("proj*", glob_file("*.cabal"));
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::remove_dir_all(&proj2).unwrap();

        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn missing_top_level_dir_is_changed() {
        let tmp = TempDir::new().unwrap();
        let pkgs = tmp.path().join("pkgs");
        fs::create_dir_all(&pkgs).unwrap();
        fs::write(pkgs.join("one.conf"), "").unwrap();
        let gp = glob_dir("pkgs", glob_file("*.conf"));
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        fs::remove_dir_all(&pkgs).unwrap();
        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn hash_equal_content_same_mtime_touched_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cabal"), "x").unwrap();
        let gp = glob_file("*.cabal");
        let state = build_glob_state(tmp.path(), ".", &gp).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        // Rewrite identical content; mtime advances, hash doesn't.
        fs::write(tmp.path().join("a.cabal"), "x").unwrap();

        let outcome = probe_glob(tmp.path(), ".", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }
}
