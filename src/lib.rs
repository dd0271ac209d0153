//! A persistent file status cache: given a declared set of filesystem
//! dependencies, detect whether any of them changed since the cache was last
//! written, without re-running whatever work produced the cached result.
//!
//! The engine is organized around two calls: [`update_monitor`] measures the
//! current filesystem state for a set of [`Dependency`] declarations and
//! persists it alongside an opaque key/result pair; [`check_monitor`] reads
//! that cache back and reports either [`CheckOutcome::Changed`] or
//! [`CheckOutcome::Unchanged`] with the cached result and the dependencies it
//! was built from.

pub mod api;
pub mod dependency;
pub mod error;
pub mod fs_primitives;
pub mod glob_path;
pub mod merge;
pub mod mtime;
pub mod probe;
pub mod state;
pub mod trace;

pub use api::{check_monitor, check_monitor_with_trace, match_file_glob, update_monitor, CheckOutcome};
pub use dependency::{monitor_hashed_search_path, monitor_search_path, Dependency};
pub use error::StatCacheError;
pub use glob_path::{GlobPath, GlobSegment};
pub use mtime::ModTime;
pub use trace::{TraceEvent, Tracer};
