//! Addressing of locations inside the schema tree and the live value.
//!
//! # Wire Format
//! ```text
//! Services.0.Endpoints.2.AllowedRoles.1
//! └──────┘ │ └───────┘ │ └──────────┘ │
//!   name  index  name index    name   index
//! ```
//!
//! # Design Decisions
//! - A path is an immutable value; every operation returns a new path
//! - An index always belongs to the segment before it
//! - Parsing is the left inverse of `Display` for every path built here

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Separator between wire tokens.
pub const SEPARATOR: char = '.';

/// Errors produced when parsing a wire path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),

    #[error("path '{0}' starts with an index")]
    LeadingIndex(String),

    #[error("segment '{segment}' in path '{path}' carries more than one index")]
    DoubleIndex { path: String, segment: String },
}

/// One step of a path: a field name plus an optional list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl Segment {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }
}

/// A location in the schema tree or the live value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path, addressing the configuration root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path with a single named segment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::named(name)],
        }
    }

    /// Parse a wire path. The empty string parses to the root.
    pub fn parse(wire: &str) -> Result<Self, PathError> {
        let mut segments: Vec<Segment> = Vec::new();
        if wire.is_empty() {
            return Ok(Self { segments });
        }

        for token in wire.split(SEPARATOR) {
            if token.is_empty() {
                return Err(PathError::EmptySegment(wire.to_string()));
            }

            match token.parse::<usize>() {
                Ok(index) => {
                    let last = segments
                        .last_mut()
                        .ok_or_else(|| PathError::LeadingIndex(wire.to_string()))?;
                    if last.index.is_some() {
                        return Err(PathError::DoubleIndex {
                            path: wire.to_string(),
                            segment: last.name.clone(),
                        });
                    }
                    last.index = Some(index);
                }
                Err(_) => segments.push(Segment::named(token)),
            }
        }

        Ok(Self { segments })
    }

    /// Append a named segment.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::named(name));
        Self { segments }
    }

    /// Set the index of the last segment. Indexing the root is a no-op.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.index = Some(index);
        }
        Self { segments }
    }

    /// The path without its last segment.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// The same path with every index removed; used for schema lookups.
    pub fn without_indices(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|s| Segment::named(s.name.clone()))
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Whether `prefix` addresses this path or one of its ancestors.
    ///
    /// Names must match segment by segment. An indexed prefix segment only
    /// matches the same index; an un-indexed one matches any index.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        if prefix.segments.len() > self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&prefix.segments)
            .all(|(ours, theirs)| {
                ours.name == theirs.name
                    && match theirs.index {
                        Some(index) => ours.index == Some(index),
                        None => true,
                    }
            })
    }

    /// The index this path carries at the position of the prefix's last
    /// segment, or `None` when the prefix does not match or no index is set.
    pub fn index_after(&self, prefix: &Path) -> Option<usize> {
        if prefix.is_root() || !self.has_prefix(prefix) {
            return None;
        }
        self.segments[prefix.segments.len() - 1].index
    }

    /// The ordered wire tokens: names and indices interleaved.
    pub fn segments(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.segments.len() * 2);
        for segment in &self.segments {
            tokens.push(segment.name.clone());
            if let Some(index) = segment.index {
                tokens.push(index.to_string());
            }
        }
        tokens
    }

    /// Longest path that is a prefix of every given path.
    pub fn common_prefix<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Path {
        let mut paths = paths.into_iter();
        let Some(first) = paths.next() else {
            return Path::root();
        };

        let mut shared = first.segments.clone();
        for path in paths {
            let mut keep = 0;
            for (ours, theirs) in shared.iter().zip(&path.segments) {
                if ours.name != theirs.name {
                    break;
                }
                keep += 1;
                if ours.index != theirs.index {
                    break;
                }
            }
            shared.truncate(keep);
            if let Some(last) = shared.last_mut() {
                if path.segments.get(keep - 1).map(|s| s.index) != Some(last.index) {
                    last.index = None;
                }
            }
        }

        Path { segments: shared }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.segments().iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}
