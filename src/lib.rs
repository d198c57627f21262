//! # Semgraph - Semantic graph builder
//!
//! Builds one directed multi-relation graph per repository whose vertices are
//! lexical scopes (files, classes, functions) and whose edges record:
//! - `Encapsulation`: file → top-level definition
//! - `Ownership`: definition → nested definition
//! - `Import`: file → imported file or symbol
//! - `ClassHierarchy`: child class → base class
//! - `Invoke`: caller → callee, validated against the static structure
//!
//! Parsing is delegated to tree-sitter through the capture adapter; the rest
//! of the pipeline only sees flat capture lists.

pub mod scope_path;
pub mod node;
pub mod edge;
pub mod graph;
pub mod adapter;
pub mod scope;
pub mod linker;
pub mod callgraph;
pub mod builder;
pub mod discovery;
pub mod ignore;
pub mod export;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use scope_path::ScopePath;
pub use node::{ScopeKind, ScopeNode};
pub use edge::{Edge, RelationKind};
pub use graph::SemanticGraph;
pub use builder::SemanticGraphBuilder;
pub use callgraph::CallGraph;
pub use storage::SqliteStore;

/// Result type alias for Semgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Semgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Capture data produced a negative nesting depth.
    #[error("Structural inconsistency in {file}: scope closed at byte {offset} with no open scope")]
    StructuralInconsistency { file: String, offset: usize },

    /// A dependency was still being resolved when it was needed again.
    #[error("Circular import: {importer} imports {dependency}, which is still being resolved")]
    CircularImport { importer: String, dependency: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Call graph error: {0}")]
    CallGraph(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}
