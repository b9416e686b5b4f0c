//! Dot-delimited property paths and the ignore list built from them.
//!
//! Paths address nested properties in a state snapshot (`"messages.world"`).
//! Numeric segments address array indices (`"items.0.name"`). Parsing is
//! infallible: a degenerate path is representable and simply matches nothing
//! the comparison walk visits.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dot-delimited property path into a state snapshot.
///
/// # Examples
///
/// ```
/// use statewatch::PropPath;
///
/// let path = PropPath::from("messages.world");
/// assert_eq!(path.segments(), ["messages", "world"]);
/// assert_eq!(path.to_string(), "messages.world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PropPath {
    segments: Vec<String>,
}

impl PropPath {
    /// Builds a path from pre-split segments.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The path's segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path names exactly the given walk position.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, walk: &[S]) -> bool {
        self.segments.len() == walk.len()
            && self
                .segments
                .iter()
                .zip(walk)
                .all(|(seg, step)| seg == step.as_ref())
    }
}

impl From<&str> for PropPath {
    fn from(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }
}

impl From<String> for PropPath {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl From<PropPath> for String {
    fn from(path: PropPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// The set of property paths excluded from dirty comparison.
///
/// Only comparison is affected; the underlying state is never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreSet {
    paths: HashSet<PropPath>,
}

impl IgnoreSet {
    /// Creates an empty ignore set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path. Returns true if it was not present yet.
    pub fn insert(&mut self, path: impl Into<PropPath>) -> bool {
        self.paths.insert(path.into())
    }

    /// Returns true if the exact path is in the set.
    #[must_use]
    pub fn contains(&self, path: &PropPath) -> bool {
        self.paths.contains(path)
    }

    /// Returns true if any ignored path names the given walk position.
    ///
    /// The comparison walk calls this at every node; a match excludes the
    /// node and its whole subtree from the diff.
    #[must_use]
    pub fn matches_segments<S: AsRef<str>>(&self, walk: &[S]) -> bool {
        !self.paths.is_empty() && self.paths.iter().any(|p| p.matches(walk))
    }

    /// Number of ignored paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if nothing is ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates the ignored paths in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &PropPath> {
        self.paths.iter()
    }
}

impl<P: Into<PropPath>> Extend<P> for IgnoreSet {
    fn extend<T: IntoIterator<Item = P>>(&mut self, iter: T) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}
