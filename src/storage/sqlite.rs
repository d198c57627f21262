//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, params};
use crate::{Error, Result};
use crate::edge::{Edge, RelationKind};
use crate::graph::SemanticGraph;
use crate::node::{Point, ScopeKind, ScopeNode, Span};
use crate::scope_path::ScopePath;
use super::schema;

const NODE_COLUMNS: &str =
    "path, file, kind, nesting, start_byte, end_byte, start_line, start_col, end_line, end_col";

/// SQLite-backed storage for a semantic graph
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Graph Operations ==========

    /// Replace the stored graph with `graph` in a single transaction.
    pub fn save_graph(&mut self, repository: &str, graph: &SemanticGraph) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM edges", [])?;
        tx.execute("DELETE FROM scope_nodes", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO graph_meta (key, value) VALUES ('repository', ?1)",
            [repository],
        )?;

        {
            let mut insert_node = tx.prepare(
                r#"
                INSERT OR REPLACE INTO scope_nodes
                    (path, file, kind, nesting, color, start_byte, end_byte,
                     start_line, start_col, end_line, end_col, seq)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;
            for (seq, node) in graph.nodes().enumerate() {
                insert_node.execute(params![
                    node.path.to_path_string(),
                    node.file(),
                    node.kind.as_str(),
                    node.nesting as i64,
                    node.kind.color(),
                    node.span.start_byte as i64,
                    node.span.end_byte as i64,
                    node.span.start_point.line as i64,
                    node.span.start_point.col as i64,
                    node.span.end_point.line as i64,
                    node.span.end_point.col as i64,
                    seq as i64,
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT OR IGNORE INTO edges (source, target, relation) VALUES (?1, ?2, ?3)",
            )?;
            for edge in graph.edges() {
                insert_edge.execute(params![
                    edge.source.to_path_string(),
                    edge.target.to_path_string(),
                    edge.relation.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Saved {} nodes and {} edges for {}",
            graph.node_count(),
            graph.edge_count(),
            repository
        );
        Ok(())
    }

    /// Load the stored graph back into memory, nodes in their saved order.
    pub fn load_graph(&self) -> Result<SemanticGraph> {
        let mut graph = SemanticGraph::new();

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM scope_nodes ORDER BY seq", NODE_COLUMNS))?;
        let nodes = stmt.query_map([], |row| self.row_to_node(row))?;
        for node in nodes {
            graph.add_node(node?);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT source, target, relation FROM edges ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (source, target, relation) = row?;
            let relation: RelationKind = relation.parse()?;
            let (Some(source), Some(target)) = (self.path_of(&graph, &source), self.path_of(&graph, &target)) else {
                tracing::warn!("Skipping edge {} -> {}: unknown node", source, target);
                continue;
            };
            graph.add_edge(Edge::new(source, target, relation));
        }

        Ok(graph)
    }

    fn path_of(&self, graph: &SemanticGraph, joined: &str) -> Option<ScopePath> {
        let file: String = self
            .conn
            .query_row("SELECT file FROM scope_nodes WHERE path = ?1", [joined], |row| row.get(0))
            .optional()
            .ok()??;
        let path = ScopePath::from_parts(&file, joined).ok()?;
        graph.contains_node(&path).then_some(path)
    }

    /// Get a node by its joined path string
    pub fn get_node(&self, path: &str) -> Result<Option<ScopeNode>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM scope_nodes WHERE path = ?1", NODE_COLUMNS),
                [path],
                |row| self.row_to_node(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Targets of edges leaving `path`, optionally restricted to one relation
    pub fn targets_of(&self, path: &str, relation: Option<RelationKind>) -> Result<Vec<(String, RelationKind)>> {
        let mut stmt = self.conn.prepare(
            "SELECT target, relation FROM edges WHERE source = ?1 AND (?2 IS NULL OR relation = ?2) ORDER BY id",
        )?;

        let rows = stmt.query_map(params![path, relation.map(|r| r.as_str())], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut targets = Vec::new();
        for row in rows {
            let (target, relation) = row?;
            targets.push((target, relation.parse()?));
        }
        Ok(targets)
    }

    /// Helper to convert a row to a ScopeNode
    fn row_to_node(&self, row: &rusqlite::Row) -> rusqlite::Result<ScopeNode> {
        let joined: String = row.get(0)?;
        let file: String = row.get(1)?;
        let kind_str: String = row.get(2)?;

        let path = ScopePath::from_parts(&file, &joined).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let kind: ScopeKind = kind_str.parse().map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let span = Span::new(
            row.get::<_, i64>(4)? as usize,
            row.get::<_, i64>(5)? as usize,
            Point::new(row.get::<_, i64>(6)? as usize, row.get::<_, i64>(7)? as usize),
            Point::new(row.get::<_, i64>(8)? as usize, row.get::<_, i64>(9)? as usize),
        );

        Ok(ScopeNode::new(path, kind, row.get::<_, i64>(3)? as usize, span))
    }

    /// Name of the repository the stored graph belongs to
    pub fn repository(&self) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM graph_meta WHERE key = 'repository'", [], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    // ========== Counts ==========

    /// Count all nodes
    pub fn count_nodes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM scope_nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_nodes_of(&self, kind: ScopeKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scope_nodes WHERE kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Count all edges
    pub fn count_edges(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_edges_of(&self, relation: RelationKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE relation = ?1",
            [relation.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete all data
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM edges", [])?;
        self.conn.execute("DELETE FROM scope_nodes", [])?;
        self.conn.execute("DELETE FROM graph_meta", [])?;
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let mut edges_by_relation = Vec::new();
        for relation in RelationKind::all() {
            edges_by_relation.push((*relation, self.count_edges_of(*relation)?));
        }

        Ok(DbStats {
            repository: self.repository()?,
            files: self.count_nodes_of(ScopeKind::Script)?,
            classes: self.count_nodes_of(ScopeKind::Class)?,
            functions: self.count_nodes_of(ScopeKind::Function)?,
            edges: self.count_edges()?,
            edges_by_relation,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub repository: Option<String>,
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub edges: usize,
    pub edges_by_relation: Vec<(RelationKind, usize)>,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        if let Some(repository) = &self.repository {
            writeln!(f, "  Repository: {}", repository)?;
        }
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Classes: {}", self.classes)?;
        writeln!(f, "  Functions: {}", self.functions)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        for (relation, count) in &self.edges_by_relation {
            writeln!(f, "    {}: {}", relation, count)?;
        }
        Ok(())
    }
}
