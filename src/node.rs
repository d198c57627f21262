//! Scope nodes - the vertices of the semantic graph
//!
//! Every lexical scope maps to one of three kinds:
//! - `Script`: a source file
//! - `Class`: a class definition
//! - `Function`: a function or method definition

use crate::{Error, Result};
use crate::scope_path::ScopePath;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of lexical scope a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// A whole source file
    Script,
    /// A class definition
    Class,
    /// A function or method definition
    Function,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Script => "script",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
        }
    }

    /// Display color handed to visualization collaborators.
    pub fn color(&self) -> &'static str {
        match self {
            ScopeKind::Script => "green",
            ScopeKind::Class => "blue",
            ScopeKind::Function => "orange",
        }
    }

    pub fn all() -> &'static [ScopeKind] {
        &[ScopeKind::Script, ScopeKind::Class, ScopeKind::Function]
    }
}

impl FromStr for ScopeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "script" | "file" | "module" => Ok(ScopeKind::Script),
            "class" => Ok(ScopeKind::Class),
            "function" | "method" | "def" => Ok(ScopeKind::Function),
            _ => Err(Error::Parse(format!("Unknown scope kind: {}", s))),
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row/column position in a source file (both 0-indexed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub col: usize,
}

impl Point {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

/// Byte and point range of a scope body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl Span {
    pub fn new(start_byte: usize, end_byte: usize, start_point: Point, end_point: Point) -> Self {
        Self {
            start_byte,
            end_byte,
            start_point,
            end_point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte >= self.end_byte
    }
}

impl From<tree_sitter::Range> for Span {
    fn from(range: tree_sitter::Range) -> Self {
        Self::new(
            range.start_byte,
            range.end_byte,
            range.start_point.into(),
            range.end_point.into(),
        )
    }
}

/// A vertex of the semantic graph.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeNode {
    /// Unique identity
    pub path: ScopePath,
    pub kind: ScopeKind,
    /// 0 for scripts, 1 for top-level definitions, and so on
    pub nesting: usize,
    /// Body span of the definition (whole file for scripts)
    pub span: Span,
}

impl ScopeNode {
    pub fn new(path: ScopePath, kind: ScopeKind, nesting: usize, span: Span) -> Self {
        Self {
            path,
            kind,
            nesting,
            span,
        }
    }

    /// Script node for a whole file.
    pub fn script(file: impl Into<String>, span: Span) -> Self {
        Self::new(ScopePath::script(file), ScopeKind::Script, 0, span)
    }

    pub fn name(&self) -> &str {
        self.path.last_segment()
    }

    pub fn file(&self) -> &str {
        self.path.file()
    }

    pub fn is_script(&self) -> bool {
        self.kind == ScopeKind::Script
    }
}

impl PartialEq for ScopeNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ScopeNode {}

impl std::hash::Hash for ScopeNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
