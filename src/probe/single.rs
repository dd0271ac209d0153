//! Single-path prober (C6): check one file's cached state against the live
//! filesystem. Never refreshes the returned state — single-path cache
//! entries are not rewritten even when mtime drifts without a content
//! change (see spec §4.C6 and the open question in §9, preserved as-is).

use std::path::Path;

use crate::fs_primitives;
use crate::state::SinglePathState;
use crate::trace::{emit, TraceEvent, Tracer};

use super::{Dirty, ProbeOutcome, ProbeResult};

pub fn probe_single(
    root: &Path,
    rel_path: &str,
    state: &SinglePathState,
    tracer: Option<&dyn Tracer>,
) -> ProbeResult<SinglePathState> {
    let path = root.join(rel_path);
    match state {
        SinglePathState::File(mtime) => match fs_primitives::mtime_opt(&path)? {
            None => {
                emit(tracer, TraceEvent::SinglePathMissing { path: rel_path });
                Ok(ProbeOutcome::Changed)
            }
            Some(live) if live == *mtime => Ok(ProbeOutcome::Unchanged(state.clone(), Dirty::Clean)),
            Some(_) => {
                emit(tracer, TraceEvent::SinglePathMtimeChanged { path: rel_path });
                Ok(ProbeOutcome::Changed)
            }
        },
        SinglePathState::HashedFile(mtime, hash) => match fs_primitives::mtime_opt(&path)? {
            None => {
                emit(tracer, TraceEvent::SinglePathMissing { path: rel_path });
                Ok(ProbeOutcome::Changed)
            }
            Some(live) if live == *mtime => Ok(ProbeOutcome::Unchanged(state.clone(), Dirty::Clean)),
            Some(_) => {
                let live_hash = fs_primitives::hash_file(&path)?;
                if live_hash == *hash {
                    // mtime drifted, content didn't: not a change, but we
                    // deliberately don't refresh the stored mtime here (see
                    // module docs).
                    Ok(ProbeOutcome::Unchanged(state.clone(), Dirty::Clean))
                } else {
                    emit(tracer, TraceEvent::SinglePathMtimeChanged { path: rel_path });
                    Ok(ProbeOutcome::Changed)
                }
            }
        },
        SinglePathState::Absent => {
            if fs_primitives::exists(&path)? {
                emit(tracer, TraceEvent::SinglePathMissing { path: rel_path });
                Ok(ProbeOutcome::Changed)
            } else {
                Ok(ProbeOutcome::Unchanged(state.clone(), Dirty::Clean))
            }
        }
        SinglePathState::StickyChanged | SinglePathState::StickyHashChanged => {
            Ok(ProbeOutcome::Changed)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mtime::ModTime;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn mtime_of(path: &Path) -> ModTime {
        ModTime::from_system_time(fs::metadata(path).unwrap().modified().unwrap())
    }

    #[test]
    fn file_unchanged_when_mtime_matches() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("a");
        fs::write(&f, "x").unwrap();
        let state = SinglePathState::File(mtime_of(&f));
        let outcome = probe_single(tmp.path(), "a", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }

    #[test]
    fn file_changed_when_missing() {
        let tmp = TempDir::new().unwrap();
        let state = SinglePathState::File(ModTime::from_system_time(SystemTime::now()));
        let outcome = probe_single(tmp.path(), "missing", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn hashed_file_unchanged_when_hash_matches_despite_mtime_drift() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("b");
        fs::write(&f, "x").unwrap();
        let hash = fs_primitives::hash_file(&f).unwrap();
        let stale_mtime = ModTime::from_system_time(SystemTime::now() - std::time::Duration::from_secs(10));
        let state = SinglePathState::HashedFile(stale_mtime, hash);
        let outcome = probe_single(tmp.path(), "b", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }

    #[test]
    fn hashed_file_changed_when_hash_differs() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("b");
        fs::write(&f, "x").unwrap();
        let stale_mtime = ModTime::from_system_time(SystemTime::now() - std::time::Duration::from_secs(10));
        let state = SinglePathState::HashedFile(stale_mtime, 0xDEAD_BEEF);
        let outcome = probe_single(tmp.path(), "b", &state, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn absent_changed_when_now_present() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("z"), "").unwrap();
        let outcome = probe_single(tmp.path(), "z", &SinglePathState::Absent, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Changed));
    }

    #[test]
    fn absent_unchanged_when_still_absent() {
        let tmp = TempDir::new().unwrap();
        let outcome = probe_single(tmp.path(), "z", &SinglePathState::Absent, None).unwrap();
        assert!(matches!(outcome, ProbeOutcome::Unchanged(_, Dirty::Clean)));
    }

    #[test]
    fn sticky_states_are_always_changed() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            probe_single(tmp.path(), "x", &SinglePathState::StickyChanged, None).unwrap(),
            ProbeOutcome::Changed
        ));
        assert!(matches!(
            probe_single(tmp.path(), "x", &SinglePathState::StickyHashChanged, None).unwrap(),
            ProbeOutcome::Changed
        ));
    }
}
