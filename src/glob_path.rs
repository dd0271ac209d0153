//! A single glob segment (C1: the matcher itself is external) and the glob
//! path tree it composes into.
//!
//! A glob path is a non-empty chain of directory segments terminated by a
//! file-matching segment: `GlobPath::Dir(seg, rest)` descends one level,
//! `GlobPath::File(seg)` matches files in the final directory. Segments are
//! opaque patterns from the matcher; this engine never inspects their
//! grammar, only whether a single path component matches.

use serde::{Deserialize, Serialize};

use crate::error::StatCacheError;

/// One glob pattern, matched against a single path component (never a full
/// relative path — each directory level gets its own segment and its own
/// matcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobSegment(String);

impl GlobSegment {
    /// Validates `pattern` by compiling it once; returns an error for a
    /// malformed pattern rather than deferring the failure to first match.
    pub fn new(pattern: impl Into<String>) -> Result<Self, StatCacheError> {
        let pattern = pattern.into();
        Self::compile(&pattern).map_err(|source| StatCacheError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Self(pattern))
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// `literal_separator` keeps `*` from crossing a path separator even
    /// though we only ever match a single bare component — a pattern like
    /// `*.cabal` must not accidentally swallow one matched against a
    /// filename that happens to contain a literal `/` by mistake upstream.
    fn compile(pattern: &str) -> Result<globset::GlobMatcher, globset::Error> {
        Ok(globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher())
    }

    /// Compiled fresh on every call. Glob compilation is cheap relative to
    /// the filesystem I/O surrounding every use site, and segments need to
    /// stay plain data (see module docs) so they round-trip through the
    /// cache file.
    pub(crate) fn is_match(&self, name: &str) -> bool {
        Self::compile(&self.0)
            .map(|m| m.is_match(name))
            .unwrap_or(false)
    }
}

/// A glob path: a chain of directory-matching segments ending in a
/// file-matching segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobPath {
    Dir(GlobSegment, Box<GlobPath>),
    File(GlobSegment),
}

impl GlobPath {
    pub fn dir(seg: GlobSegment, rest: GlobPath) -> Self {
        Self::Dir(seg, Box::new(rest))
    }

    pub fn file(seg: GlobSegment) -> Self {
        Self::File(seg)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_pattern() {
        assert!(GlobSegment::new("[").is_err());
    }

    #[test]
    fn matches_bare_component_name() {
        let seg = GlobSegment::new("*.cabal").unwrap();
        assert!(seg.is_match("foo.cabal"));
        assert!(!seg.is_match("foo/bar.cabal"));
        assert!(!seg.is_match("foo.txt"));
    }

    #[test]
    fn pattern_returns_the_original_string() {
        let seg = GlobSegment::new("*.cabal").unwrap();
        assert_eq!(seg.pattern(), "*.cabal");
    }
}
