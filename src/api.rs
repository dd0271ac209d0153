//! Public API (C8): `update_monitor` / `check_monitor` and their
//! trace-enabled variants, plus the `match_file_glob` convenience.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dependency::Dependency;
use crate::error::StatCacheError;
use crate::fs_primitives;
use crate::glob_path::GlobPath;
use crate::probe::{probe_glob, probe_single, Dirty, ProbeOutcome};
use crate::state::builder::build_state;
use crate::state::codec::{decode, encode};
use crate::trace::{emit, TraceEvent, Tracer};

/// The result of [`check_monitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome<V> {
    /// Something monitored has changed (or the cache was unusable); the
    /// caller should rebuild.
    Changed,
    /// Nothing invalidating happened; carries the cached result and the
    /// declared dependencies it was built from.
    Unchanged(V, Vec<Dependency>),
}

/// Measures every declared dependency against `root` and writes
/// `(state, key, result)` to `cache_path`, overwriting any existing file.
///
/// A missing `File`/`HashedFile` dependency is recorded as a sticky state
/// rather than failing the call — see [`crate::state::SinglePathState`].
pub fn update_monitor<K, V>(
    cache_path: &Path,
    root: &Path,
    deps: &[Dependency],
    key: &K,
    result: &V,
) -> Result<(), StatCacheError>
where
    K: Serialize,
    V: Serialize,
{
    let state = build_state(root, deps)?;
    let bytes = encode(&state, key, result)?;
    write_atomic(cache_path, &bytes)
}

/// As [`check_monitor`], additionally reporting diagnostic events through
/// `tracer`.
pub fn check_monitor_with_trace<K, V>(
    cache_path: &Path,
    root: &Path,
    current_key: &K,
    tracer: Option<&dyn Tracer>,
) -> Result<CheckOutcome<V>, StatCacheError>
where
    K: Serialize + DeserializeOwned + PartialEq,
    V: Serialize + DeserializeOwned,
{
    let bytes = match fs::read(cache_path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            emit(tracer, TraceEvent::CacheMissing);
            return Ok(CheckOutcome::Changed);
        }
        Err(e) => return Err(e.into()),
    };

    let (cached_state, cached_key, cached_result) = match decode::<K, V>(&bytes) {
        Ok(v) => v,
        Err(_) => {
            emit(tracer, TraceEvent::CacheCorrupt);
            return Ok(CheckOutcome::Changed);
        }
    };

    if cached_key != *current_key {
        emit(tracer, TraceEvent::KeyMismatch);
        return Ok(CheckOutcome::Changed);
    }

    let mut dirty = Dirty::Clean;
    let mut new_single_paths = std::collections::BTreeMap::new();
    for (path, single_state) in &cached_state.single_paths {
        match probe_single(root, path, single_state, tracer)? {
            ProbeOutcome::Changed => return Ok(CheckOutcome::Changed),
            ProbeOutcome::Unchanged(new_state, single_dirty) => {
                dirty = dirty.merge(single_dirty);
                new_single_paths.insert(path.clone(), new_state);
            }
        }
    }

    let mut new_globs = Vec::with_capacity(cached_state.globs.len());
    for glob_state in &cached_state.globs {
        match probe_glob(root, ".", glob_state, tracer)? {
            ProbeOutcome::Changed => return Ok(CheckOutcome::Changed),
            ProbeOutcome::Unchanged(new_state, glob_dirty) => {
                dirty = dirty.merge(glob_dirty);
                new_globs.push(new_state);
            }
        }
    }

    let new_state = crate::state::MonitorStateFileSet {
        single_paths: new_single_paths,
        globs: new_globs,
    };
    let deps = new_state.declared_dependencies();

    if dirty == Dirty::Dirty {
        let bytes = encode(&new_state, &cached_key, &cached_result)?;
        write_atomic(cache_path, &bytes)?;
        emit(tracer, TraceEvent::CacheRewritten);
    }

    Ok(CheckOutcome::Unchanged(cached_result, deps))
}

/// Reads `cache_path`, probes every declared dependency against `root`, and
/// reports whether anything changed since the matching `update_monitor`.
pub fn check_monitor<K, V>(
    cache_path: &Path,
    root: &Path,
    current_key: &K,
) -> Result<CheckOutcome<V>, StatCacheError>
where
    K: Serialize + DeserializeOwned + PartialEq,
    V: Serialize + DeserializeOwned,
{
    check_monitor_with_trace(cache_path, root, current_key, None)
}

/// Returns every path under `root` matching `glob`, relative to `root`, with
/// no cache involved.
pub fn match_file_glob(root: &Path, glob: &GlobPath) -> Result<Vec<std::path::PathBuf>, StatCacheError> {
    let mut out = Vec::new();
    collect_matches(root, ".", glob, &mut out)?;
    Ok(out)
}

fn collect_matches(
    root: &Path,
    dir: &str,
    glob: &GlobPath,
    out: &mut Vec<std::path::PathBuf>,
) -> Result<(), StatCacheError> {
    let full_dir = root.join(dir);
    let names = fs_primitives::list_dir(&full_dir)?;
    match glob {
        GlobPath::Dir(seg, rest) => {
            let mut matched: Vec<&String> = names
                .iter()
                .filter(|n| seg.is_match(n))
                .filter(|n| fs_primitives::is_dir(&full_dir.join(n)))
                .collect();
            matched.sort();
            for name in matched {
                let child_dir = crate::state::builder::join_rel(dir, name);
                collect_matches(root, &child_dir, rest, out)?;
            }
        }
        GlobPath::File(seg) => {
            let mut matched: Vec<&String> = names
                .iter()
                .filter(|n| seg.is_match(n))
                .filter(|n| fs_primitives::is_file(&full_dir.join(n)))
                .collect();
            matched.sort();
            for name in matched {
                out.push(Path::new(&crate::state::builder::join_rel(dir, name)).to_path_buf());
            }
        }
    }
    Ok(())
}

/// Writes `bytes` to `path` via a temp-file-then-rename so a crash or
/// concurrent reader never observes a torn cache file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StatCacheError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_name = format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("statcache")
    );
    let tmp_path = dir.join(tmp_name);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
