//! Absolute POSIX-style node paths.
//!
//! Rules:
//! - Must start with `/` (relative paths are rejected)
//! - Repeated slashes, a trailing slash, and `.` segments are collapsed
//! - `..` segments are rejected (no parent traversal)
//! - Segments must not contain NUL
//!
//! The root group is `/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A validated, normalized absolute path into a hierarchical store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorePath(String);

impl StorePath {
    /// The root group.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize a path string.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_store::StorePath;
    ///
    /// assert_eq!(StorePath::parse("/a//b/").unwrap().as_str(), "/a/b");
    /// assert!(StorePath::parse("relative").is_err());
    /// assert!(StorePath::parse("/a/../b").is_err());
    /// ```
    pub fn parse(path: &str) -> StoreResult<Self> {
        if !path.starts_with('/') {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "path must be absolute".into(),
            });
        }

        let mut normalized = String::with_capacity(path.len());
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            validate_segment(segment).map_err(|reason| StoreError::InvalidPath {
                path: path.to_string(),
                reason,
            })?;
            normalized.push('/');
            normalized.push_str(segment);
        }

        if normalized.is_empty() {
            return Ok(Self::root());
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments from the root down. Empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The final segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// The containing group, or `None` for the root.
    pub fn parent(&self) -> Option<StorePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a single child segment.
    pub fn join(&self, segment: &str) -> StoreResult<StorePath> {
        if segment.is_empty() || segment == "." {
            return Err(StoreError::InvalidPath {
                path: format!("{}/{segment}", self.0.trim_end_matches('/')),
                reason: "child segment must be a non-empty name".into(),
            });
        }
        validate_segment(segment).map_err(|reason| StoreError::InvalidPath {
            path: format!("{}/{segment}", self.0.trim_end_matches('/')),
            reason,
        })?;
        if self.is_root() {
            Ok(Self(format!("/{segment}")))
        } else {
            Ok(Self(format!("{}/{segment}", self.0)))
        }
    }

    /// Every proper ancestor, from the root down (excluding `self`).
    pub fn ancestors(&self) -> Vec<StorePath> {
        let mut out = Vec::new();
        let mut cur = self.parent();
        while let Some(p) = cur {
            cur = p.parent();
            out.push(p);
        }
        out.reverse();
        out
    }
}

fn validate_segment(segment: &str) -> Result<(), String> {
    if segment == ".." {
        return Err("must not contain '..'".into());
    }
    if segment.contains('/') {
        return Err(format!("segment must not contain '/': {segment:?}"));
    }
    if segment.contains('\0') {
        return Err("must not contain NUL".into());
    }
    Ok(())
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StorePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for StorePath {
    type Error = StoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}
