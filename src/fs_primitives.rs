//! File primitives (C2): mtime, existence, directory listing, content
//! hashing, and the does-not-exist recovery convention every probe uses.

use std::fs;
use std::hash::Hasher;
use std::io::{self, Read};
use std::path::Path;

use twox_hash::XxHash64;

use crate::mtime::ModTime;

/// A deterministic, non-cryptographic content hash. `twox-hash`'s `XxHash64`
/// seeded with `0` — stable across runs and platforms, which is all a cache
/// needs; no cryptographic property is required or assumed.
pub type Hash = u64;

/// Runs `action`; if it fails with a "does not exist" condition, returns
/// `default` instead. Any other I/O error propagates. The shared recovery
/// convention every primitive below is built on.
pub fn handle_missing<T>(default: T, action: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    match action() {
        Ok(v) => Ok(v),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(default),
        Err(e) => Err(e),
    }
}

/// `mtime(path) -> ModTime | NotFound` from the spec, expressed as
/// `Ok(None)` for "does not exist" so every other I/O failure can still
/// propagate through `?`.
///
/// Uses `symlink_metadata` rather than `metadata` so a broken symlink is
/// observed as itself (mtime of the link) rather than silently resolving to
/// "missing" via the followed-link error.
pub fn mtime_opt(path: &Path) -> io::Result<Option<ModTime>> {
    handle_missing(None, || {
        let meta = fs::symlink_metadata(path)?;
        Ok(Some(ModTime::from_system_time(meta.modified()?)))
    })
}

/// `true` iff something exists at `path` (any type, including a broken
/// symlink).
pub fn exists(path: &Path) -> io::Result<bool> {
    handle_missing(false, || {
        fs::symlink_metadata(path)?;
        Ok(true)
    })
}

pub fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

pub fn is_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_file())
}

/// Entries only (no `.`/`..`), unsorted. A missing directory yields an empty
/// list rather than an error — callers that care about the distinction use
/// `mtime_opt`/`exists` first.
pub fn list_dir(path: &Path) -> io::Result<Vec<String>> {
    handle_missing(Vec::new(), || {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    })
}

/// Streams the full file content through the hasher without buffering it in
/// memory.
pub fn hash_file(path: &Path) -> io::Result<Hash> {
    let mut file = fs::File::open(path)?;
    let mut hasher = XxHash64::with_seed(0);
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.write(&buf[..n]);
    }
    Ok(hasher.finish())
}
