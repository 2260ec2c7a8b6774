//! Namespaces and composed keys
//!
//! A namespace is an ordered list of segments. Keys are composed by joining the
//! segments and the id with a delimiter, so `["users", "42"]` + `"profile"`
//! becomes `users==42==profile` with the default delimiter.
//!
//! Segments are not escaped: an id or segment that itself contains the
//! delimiter can collide with a different namespace/id pair.

use serde::{Deserialize, Serialize};

/// Delimiter used when none is configured
pub const DEFAULT_NAMESPACE_DELIMITER: &str = "==";

/// Ordered grouping prefix for cache keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// The empty namespace
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a namespace from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The namespace segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the empty namespace
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a namespace with `segment` appended
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Joins the namespace segments and `id` with `delimiter`
    pub fn compose(&self, id: &str, delimiter: &str) -> String {
        let mut key = String::new();
        for segment in &self.segments {
            key.push_str(segment);
            key.push_str(delimiter);
        }
        key.push_str(id);
        key
    }

    /// Key prefix shared by every entry in this namespace
    ///
    /// Returns `None` for the root namespace, which covers every key.
    pub fn prefix(&self, delimiter: &str) -> Option<String> {
        if self.is_root() {
            return None;
        }
        let mut prefix = self.segments.join(delimiter);
        prefix.push_str(delimiter);
        Some(prefix)
    }
}

impl From<()> for Namespace {
    fn from(_: ()) -> Self {
        Self::root()
    }
}

impl From<&str> for Namespace {
    fn from(segment: &str) -> Self {
        Self::new([segment])
    }
}

impl From<String> for Namespace {
    fn from(segment: String) -> Self {
        Self::new([segment])
    }
}

impl From<Vec<String>> for Namespace {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for Namespace {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Namespace {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Option<&str>> for Namespace {
    fn from(segment: Option<&str>) -> Self {
        segment.map(Self::from).unwrap_or_default()
    }
}
