//! Scope path - identity of every node in the semantic graph
//!
//! Format: `<file id>/<outer scope>/<inner scope>/...`
//!
//! Examples:
//! - `pkg/mod.py` (a script)
//! - `pkg/mod.py/OuterClass/inner_method`
//!
//! The file id is the repository-relative path with `/` separators; drive
//! or volume markers (`:`) are encoded as `.` so the string is portable.

use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Identity of a scope node: the file it lives in plus the chain of
/// enclosing definition names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopePath {
    /// Repository-relative file id
    file: String,
    /// Enclosing definition names, outermost first
    scopes: Vec<String>,
}

impl ScopePath {
    /// Path of a script (file) node.
    pub fn script(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            scopes: Vec::new(),
        }
    }

    /// Build a path from a file id and a scope chain.
    pub fn new(file: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            file: file.into(),
            scopes,
        }
    }

    /// Rebuild a path from its file id and its joined string form.
    pub fn from_parts(file: &str, joined: &str) -> Result<Self> {
        let rest = joined
            .strip_prefix(file)
            .ok_or_else(|| Error::InvalidPath(format!("{} is not inside {}", joined, file)))?;

        if rest.is_empty() {
            return Ok(Self::script(file));
        }

        let rest = rest
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| Error::InvalidPath(format!("{} is not inside {}", joined, file)))?;

        Ok(Self::new(file, rest.split(SEPARATOR).map(str::to_string).collect()))
    }

    /// Path of a definition nested directly inside this one.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(name.into());
        Self {
            file: self.file.clone(),
            scopes,
        }
    }

    /// Path one level up, `None` for a script.
    pub fn parent(&self) -> Option<Self> {
        if self.scopes.is_empty() {
            return None;
        }
        let mut scopes = self.scopes.clone();
        scopes.pop();
        Some(Self {
            file: self.file.clone(),
            scopes,
        })
    }

    /// The enclosing file id.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Path of the enclosing script node.
    pub fn file_path(&self) -> Self {
        Self::script(self.file.clone())
    }

    /// Enclosing definition names, outermost first.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn is_script(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of definitions between the file and this scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// All segments: the file id split on `/`, then the scope chain.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.file
            .split(SEPARATOR)
            .chain(self.scopes.iter().map(String::as_str))
    }

    /// Last segment (`mod.py` for a script, the definition name otherwise).
    pub fn last_segment(&self) -> &str {
        match self.scopes.last() {
            Some(name) => name,
            None => self.file.rsplit(SEPARATOR).next().unwrap_or(&self.file),
        }
    }

    /// Module name of the enclosing file (`mod` for `pkg/mod.py`).
    pub fn module_name(&self) -> &str {
        let file_name = self.file.rsplit(SEPARATOR).next().unwrap_or(&self.file);
        file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name)
    }

    /// Whether the trailing segments of this path equal `suffix`.
    ///
    /// Matching happens on whole segments, so `Base` never matches `MyBase`.
    pub fn ends_with_segments(&self, suffix: &[&str]) -> bool {
        if suffix.is_empty() {
            return false;
        }
        let segments: Vec<&str> = self.segments().collect();
        segments.len() >= suffix.len() && segments[segments.len() - suffix.len()..] == *suffix
    }

    /// Joined string form.
    pub fn to_path_string(&self) -> String {
        let mut out = self.file.clone();
        for scope in &self.scopes {
            out.push(SEPARATOR);
            out.push_str(scope);
        }
        out
    }
}

/// Turn a repository-relative file path into a file id.
pub fn normalize_file_id(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            _ => None,
        })
        .map(|part| part.replace(':', "."))
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

impl Serialize for ScopePath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_path_string())
    }
}
