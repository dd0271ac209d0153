//! Structured diagnostic events, replacing the ad-hoc debug prints a naive
//! port of this engine would otherwise scatter through the probe path.
//!
//! The engine never prints anything itself. Callers that want visibility
//! into *why* a probe reported `Changed`, or why the cache was rewritten,
//! pass a [`Tracer`] into the `_with_trace` entry points; the default
//! `check_monitor`/`update_monitor` simply pass `None`.

/// A single diagnostic moment during a probe or build.
#[derive(Debug, Clone, Copy)]
pub enum TraceEvent<'a> {
    /// A single-path dependency is no longer present on disk.
    SinglePathMissing { path: &'a str },
    /// A single-path dependency's mtime no longer matches the cache.
    SinglePathMtimeChanged { path: &'a str },
    /// A glob-tracked directory that previously existed is now missing.
    GlobDirMissing { path: &'a str },
    /// A glob directory gained a subtree with at least one matching file.
    GlobNewMatch { path: &'a str },
    /// A glob subtree that previously matched files has disappeared.
    GlobSubtreeDisappeared { path: &'a str },
    /// The set of files matching a glob segment changed (added/removed).
    GlobFileSetChanged { path: &'a str },
    /// A file tracked inside a glob's matched set changed.
    GlobEntryChanged { path: &'a str },
    /// A cache entry was refreshed in memory though nothing materially
    /// changed (e.g. a newly-created, still-empty directory).
    CacheDirty { path: &'a str },
    /// The on-disk cache file was rewritten after a dirty probe.
    CacheRewritten,
    /// The cache file does not exist yet.
    CacheMissing,
    /// The cache file exists but failed to decode (wrong version, corrupt).
    CacheCorrupt,
    /// The caller's key no longer matches the cached key.
    KeyMismatch,
}

/// Receives [`TraceEvent`]s emitted during a probe or build.
///
/// Implemented for any `Fn(TraceEvent<'_>)`, so a closure can be passed
/// directly to the `_with_trace` API without a wrapper type.
pub trait Tracer {
    fn trace(&self, event: TraceEvent<'_>);
}

impl<F> Tracer for F
where
    F: Fn(TraceEvent<'_>),
{
    fn trace(&self, event: TraceEvent<'_>) {
        self(event);
    }
}

pub(crate) fn emit(tracer: Option<&dyn Tracer>, event: TraceEvent<'_>) {
    if let Some(t) = tracer {
        t.trace(event);
    }
}
