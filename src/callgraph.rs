//! Call graph input for the Invoke Integrator
//!
//! [`CallGraph`] is the in-process transfer object: `uid → qualified name`
//! plus caller/callee uid pairs. Names follow code2flow's convention,
//! `pkg.module::Class.method`, with `(global)` standing for module scope.
//!
//! Sources:
//! - [`JsonCallGraph`]: a code2flow JSON document already on disk
//! - [`Code2Flow`]: runs the `code2flow` program against the repository

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Externally observed calls between qualified names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallGraph {
    /// uid → qualified name
    pub nodes: BTreeMap<String, String>,
    /// (caller uid, callee uid)
    pub edges: Vec<(String, String)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, uid: impl Into<String>, name: impl Into<String>) {
        self.nodes.insert(uid.into(), name.into());
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.edges.push((source.into(), target.into()));
    }

    pub fn name_of(&self, uid: &str) -> Option<&str> {
        self.nodes.get(uid).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Parse a code2flow JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Code2FlowDocument = serde_json::from_str(json)?;

        let nodes = document
            .graph
            .nodes
            .into_iter()
            .map(|(key, node)| (node.uid.unwrap_or(key), node.name))
            .collect();
        let edges = document
            .graph
            .edges
            .into_iter()
            .map(|edge| (edge.source, edge.target))
            .collect();

        Ok(Self { nodes, edges })
    }
}

#[derive(Debug, Deserialize)]
struct Code2FlowDocument {
    graph: Code2FlowGraph,
}

#[derive(Debug, Deserialize)]
struct Code2FlowGraph {
    #[serde(default)]
    nodes: BTreeMap<String, Code2FlowNode>,
    #[serde(default)]
    edges: Vec<Code2FlowEdge>,
}

#[derive(Debug, Deserialize)]
struct Code2FlowNode {
    name: String,
    uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Code2FlowEdge {
    source: String,
    target: String,
}

/// Anything able to produce the call graph of a repository.
pub trait CallGraphSource: Send + Sync {
    fn call_graph(&self, root: &Path) -> Result<CallGraph>;
}

impl CallGraphSource for CallGraph {
    fn call_graph(&self, _root: &Path) -> Result<CallGraph> {
        Ok(self.clone())
    }
}

/// A code2flow JSON document on disk. The repository root is ignored.
#[derive(Debug, Clone)]
pub struct JsonCallGraph {
    path: PathBuf,
}

impl JsonCallGraph {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CallGraphSource for JsonCallGraph {
    fn call_graph(&self, _root: &Path) -> Result<CallGraph> {
        let json = std::fs::read_to_string(&self.path)?;
        CallGraph::from_json(&json)
    }
}

/// Runs code2flow against the repository root and reads back its JSON output.
#[derive(Debug, Clone)]
pub struct Code2Flow {
    program: String,
}

impl Default for Code2Flow {
    fn default() -> Self {
        Self::new("code2flow")
    }
}

impl Code2Flow {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CallGraphSource for Code2Flow {
    fn call_graph(&self, root: &Path) -> Result<CallGraph> {
        // code2flow picks its output format from the extension
        let output = tempfile::Builder::new()
            .prefix("semgraph-calls-")
            .suffix(".json")
            .tempfile()?;

        tracing::debug!("Running {} on {}", self.program, root.display());
        let status = Command::new(&self.program)
            .arg(root)
            .arg("--output")
            .arg(output.path())
            .arg("--language")
            .arg("py")
            .arg("--skip-parse-errors")
            .arg("--quiet")
            .status()
            .map_err(|e| Error::CallGraph(format!("Failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(Error::CallGraph(format!(
                "{} exited with {} on {}",
                self.program,
                status,
                root.display()
            )));
        }

        let json = std::fs::read_to_string(output.path())?;
        CallGraph::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "graph": {
            "directed": true,
            "nodes": {
                "node_a1": {"uid": "node_a1", "label": "12: main()", "name": "app::main"},
                "node_b2": {"uid": "node_b2", "label": "3: run()", "name": "pkg.util::Runner.run"},
                "node_c3": {"name": "app::(global)"}
            },
            "edges": [
                {"source": "node_a1", "target": "node_b2", "directed": true},
                {"source": "node_c3", "target": "node_a1", "directed": true}
            ]
        }
    }"#;

    #[test]
    fn test_parse_code2flow_document() {
        let graph = CallGraph::from_json(DOCUMENT).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.name_of("node_b2"), Some("pkg.util::Runner.run"));
        // uid falls back to the map key
        assert_eq!(graph.name_of("node_c3"), Some("app::(global)"));
        assert_eq!(graph.edges[0], ("node_a1".to_string(), "node_b2".to_string()));
    }

    #[test]
    fn test_json_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        let graph = JsonCallGraph::new(&path).call_graph(dir.path()).unwrap();
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(CallGraph::from_json("{\"nodes\": []}"), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_program_is_reported() {
        let source = Code2Flow::new("semgraph-no-such-program");
        let err = source.call_graph(Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::CallGraph(_)));
    }
}
