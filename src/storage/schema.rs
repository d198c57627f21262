//! Database schema definitions

/// SQL to create the graph metadata table
pub const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS graph_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// SQL to create the scope_nodes table
pub const CREATE_SCOPE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS scope_nodes (
    path TEXT PRIMARY KEY,
    file TEXT NOT NULL,
    kind TEXT NOT NULL,
    nesting INTEGER NOT NULL,
    color TEXT NOT NULL,
    start_byte INTEGER NOT NULL,
    end_byte INTEGER NOT NULL,
    start_line INTEGER NOT NULL,
    start_col INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    end_col INTEGER NOT NULL,
    seq INTEGER NOT NULL
)
"#;

/// SQL to create the edges table
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relation TEXT NOT NULL,
    UNIQUE(source, target, relation)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_scope_nodes_file ON scope_nodes(file)",
    "CREATE INDEX IF NOT EXISTS idx_scope_nodes_kind ON scope_nodes(kind)",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target)",
    "CREATE INDEX IF NOT EXISTS idx_edges_relation ON edges(relation)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_META_TABLE, CREATE_SCOPE_NODES_TABLE, CREATE_EDGES_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
