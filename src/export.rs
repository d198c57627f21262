//! Produced-graph document
//!
//! The JSON form handed to visualization and persistence collaborators.
//! Every node carries `{nesting, color, startByte, endByte, startPoint,
//! endPoint}` and every edge carries `{type}`.

use crate::Result;
use crate::edge::{Edge, RelationKind};
use crate::graph::SemanticGraph;
use crate::node::{Point, ScopeKind, ScopeNode, Span};
use crate::scope_path::ScopePath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub repository: String,
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub file: String,
    pub kind: ScopeKind,
    pub nesting: usize,
    pub color: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation: RelationKind,
}

impl From<&ScopeNode> for NodeRecord {
    fn from(node: &ScopeNode) -> Self {
        Self {
            id: node.path.to_path_string(),
            file: node.file().to_string(),
            kind: node.kind,
            nesting: node.nesting,
            color: node.kind.color().to_string(),
            start_byte: node.span.start_byte,
            end_byte: node.span.end_byte,
            start_point: node.span.start_point,
            end_point: node.span.end_point,
        }
    }
}

impl NodeRecord {
    pub fn to_node(&self) -> Result<ScopeNode> {
        let path = ScopePath::from_parts(&self.file, &self.id)?;
        let span = Span::new(self.start_byte, self.end_byte, self.start_point, self.end_point);
        Ok(ScopeNode::new(path, self.kind, self.nesting, span))
    }
}

impl GraphDocument {
    pub fn from_graph(repository: &str, graph: &SemanticGraph) -> Self {
        Self {
            repository: repository.to_string(),
            directed: true,
            multigraph: true,
            nodes: graph.nodes().map(NodeRecord::from).collect(),
            edges: graph
                .edges()
                .iter()
                .map(|edge| EdgeRecord {
                    source: edge.source.to_path_string(),
                    target: edge.target.to_path_string(),
                    relation: edge.relation,
                })
                .collect(),
        }
    }

    /// Rebuild a graph. Edge endpoints are resolved through the node table;
    /// edges naming unknown nodes are dropped.
    pub fn to_graph(&self) -> Result<SemanticGraph> {
        let mut graph = SemanticGraph::new();
        let mut paths = std::collections::HashMap::new();
        for record in &self.nodes {
            let node = record.to_node()?;
            paths.insert(record.id.as_str(), node.path.clone());
            graph.add_node(node);
        }

        for record in &self.edges {
            match (paths.get(record.source.as_str()), paths.get(record.target.as_str())) {
                (Some(source), Some(target)) => {
                    graph.add_edge(Edge::new(source.clone(), target.clone(), record.relation));
                }
                _ => tracing::warn!("Dropping edge {} -> {}: unknown node", record.source, record.target),
            }
        }
        Ok(graph)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Write `<out_dir>/<repository>.json` and return its path.
pub fn write_json(out_dir: &Path, repository: &str, graph: &SemanticGraph) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.json", repository));
    let document = GraphDocument::from_graph(repository, graph);
    std::fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SemanticGraph {
        let mut graph = SemanticGraph::new();
        let script = ScopePath::script("pkg/m.py");
        let class = script.child("Base");
        graph.add_node(ScopeNode::script("pkg/m.py", Span::new(0, 40, Point::new(0, 0), Point::new(3, 0))));
        graph.add_node(ScopeNode::new(
            class.clone(),
            ScopeKind::Class,
            1,
            Span::new(16, 40, Point::new(1, 4), Point::new(2, 12)),
        ));
        graph.add_edge(Edge::structural(script, class));
        graph
    }

    #[test]
    fn test_document_attributes() {
        let document = GraphDocument::from_graph("demo", &sample());
        let json = serde_json::to_value(&document).unwrap();

        let class = &json["nodes"][1];
        assert_eq!(class["id"], "pkg/m.py/Base");
        assert_eq!(class["color"], "blue");
        assert_eq!(class["nesting"], 1);
        assert_eq!(class["startByte"], 16);
        assert_eq!(class["endPoint"]["line"], 2);
        assert_eq!(json["nodes"][0]["color"], "green");
        assert_eq!(json["edges"][0]["type"], "Encapsulation");
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "demo", &sample()).unwrap();
        assert!(path.ends_with("demo.json"));

        let graph = GraphDocument::read(&path).unwrap().to_graph().unwrap();
        let base = ScopePath::script("pkg/m.py").child("Base");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.get_node(&base).unwrap().span.start_point, Point::new(1, 4));
        assert!(graph.has_edge(&ScopePath::script("pkg/m.py"), &base, RelationKind::Encapsulation));
    }
}
