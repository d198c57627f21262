//! Storage Layer - SQLite-backed persistence
//!
//! One database per repository graph, with tables:
//! - graph_meta(key, value)
//! - scope_nodes(path, file, kind, nesting, color, span...)
//! - edges(source, target, relation) unique per triple

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore};
