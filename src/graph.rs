//! Semantic Graph - in-memory directed multigraph of scope nodes
//!
//! One graph instance is owned per repository build and passed by mutable
//! reference through every phase. Edges are stored as inserted, so the same
//! `(source, target, relation)` triple may appear several times until
//! [`SemanticGraph::deduplicate`] runs.

use std::collections::{HashMap, HashSet, VecDeque};
use crate::edge::{Edge, RelationKind};
use crate::node::{ScopeKind, ScopeNode};
use crate::scope_path::ScopePath;

#[derive(Debug, Default)]
pub struct SemanticGraph {
    /// All nodes indexed by path
    nodes: HashMap<ScopePath, ScopeNode>,
    /// Node paths in creation order
    node_order: Vec<ScopePath>,
    /// All edges in insertion order
    edges: Vec<Edge>,
    /// Outgoing edge indices per node
    edges_from: HashMap<ScopePath, Vec<usize>>,
    /// Incoming edge indices per node
    edges_to: HashMap<ScopePath, Vec<usize>>,
    /// Node paths indexed by file id
    nodes_by_file: HashMap<String, Vec<ScopePath>>,
    /// Node paths indexed by last segment (for suffix lookups)
    nodes_by_name: HashMap<String, Vec<ScopePath>>,
}

impl SemanticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` (and keeps the existing node) when the
    /// path is already present.
    pub fn add_node(&mut self, node: ScopeNode) -> bool {
        if self.nodes.contains_key(&node.path) {
            return false;
        }

        let path = node.path.clone();
        self.nodes_by_file
            .entry(path.file().to_string())
            .or_default()
            .push(path.clone());
        self.nodes_by_name
            .entry(path.last_segment().to_string())
            .or_default()
            .push(path.clone());
        self.node_order.push(path.clone());
        self.nodes.insert(path, node);
        true
    }

    /// Add an edge. Duplicates are kept until deduplication.
    pub fn add_edge(&mut self, edge: Edge) {
        let index = self.edges.len();
        self.edges_from.entry(edge.source.clone()).or_default().push(index);
        self.edges_to.entry(edge.target.clone()).or_default().push(index);
        self.edges.push(edge);
    }

    pub fn get_node(&self, path: &ScopePath) -> Option<&ScopeNode> {
        self.nodes.get(path)
    }

    pub fn contains_node(&self, path: &ScopePath) -> bool {
        self.nodes.contains_key(path)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &ScopeNode> {
        self.node_order.iter().filter_map(|path| self.nodes.get(path))
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of a node
    pub fn edges_from(&self, path: &ScopePath) -> impl Iterator<Item = &Edge> {
        self.edges_from
            .get(path)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
    }

    /// Incoming edges of a node
    pub fn edges_to(&self, path: &ScopePath) -> impl Iterator<Item = &Edge> {
        self.edges_to
            .get(path)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
    }

    /// Targets of outgoing edges of one relation, in insertion order
    pub fn targets(&self, path: &ScopePath, relation: RelationKind) -> Vec<&ScopePath> {
        self.edges_from(path)
            .filter(|edge| edge.relation == relation)
            .map(|edge| &edge.target)
            .collect()
    }

    pub fn has_edge(&self, source: &ScopePath, target: &ScopePath, relation: RelationKind) -> bool {
        self.edges_from(source)
            .any(|edge| edge.relation == relation && &edge.target == target)
    }

    /// Lexical parents of a node (sources of incoming Encapsulation/Ownership edges)
    pub fn structural_parents(&self, path: &ScopePath) -> Vec<&ScopePath> {
        self.edges_to(path)
            .filter(|edge| edge.relation.is_structural())
            .map(|edge| &edge.source)
            .collect()
    }

    /// All nodes that belong to a file, script first
    pub fn nodes_in_file(&self, file: &str) -> Vec<&ScopeNode> {
        self.nodes_by_file
            .get(file)
            .map(|paths| paths.iter().filter_map(|path| self.nodes.get(path)).collect())
            .unwrap_or_default()
    }

    /// Whether a script node exists for this file id
    pub fn has_file(&self, file: &str) -> bool {
        self.nodes_by_file.contains_key(file)
    }

    /// Find the node of a file whose body starts at `start_byte`
    pub fn node_at(&self, file: &str, kind: ScopeKind, start_byte: usize) -> Option<&ScopeNode> {
        self.nodes_in_file(file)
            .into_iter()
            .find(|node| node.kind == kind && node.span.start_byte == start_byte)
    }

    /// Every node path ending with `suffix` (whole segments), in creation order.
    ///
    /// This is the single lookup primitive behind base-class and invoke
    /// resolution; picking among several matches is left to the caller.
    pub fn resolve_by_suffix(&self, suffix: &[&str]) -> Vec<&ScopePath> {
        let Some(last) = suffix.last() else {
            return Vec::new();
        };

        self.nodes_by_name
            .get(*last)
            .map(|paths| {
                paths
                    .iter()
                    .filter(|path| path.ends_with_segments(suffix))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes reachable from `start` following only relations accepted by `follow`.
    /// The start node itself is included.
    pub fn reachable_from<F>(&self, start: &ScopePath, follow: F) -> HashSet<ScopePath>
    where
        F: Fn(RelationKind) -> bool,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            for edge in self.edges_from(&current) {
                if follow(edge.relation) && visited.insert(edge.target.clone()) {
                    queue.push_back(edge.target.clone());
                }
            }
        }

        visited
    }

    /// Collapse edges sharing `(source, target, relation)`, keeping the first
    /// occurrence. Returns the number of edges removed.
    pub fn deduplicate(&mut self) -> usize {
        let before = self.edges.len();
        let mut seen = HashSet::new();
        let edges = std::mem::take(&mut self.edges);
        self.edges_from.clear();
        self.edges_to.clear();

        for edge in edges {
            if seen.insert((edge.source.clone(), edge.target.clone(), edge.relation)) {
                self.add_edge(edge);
            }
        }

        before - self.edges.len()
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_kind: HashMap<ScopeKind, usize> = HashMap::new();
        for node in self.nodes.values() {
            *nodes_by_kind.entry(node.kind).or_default() += 1;
        }

        let mut edges_by_relation: HashMap<RelationKind, usize> = HashMap::new();
        for edge in &self.edges {
            *edges_by_relation.entry(edge.relation).or_default() += 1;
        }

        GraphStats {
            files: nodes_by_kind.get(&ScopeKind::Script).copied().unwrap_or(0),
            classes: nodes_by_kind.get(&ScopeKind::Class).copied().unwrap_or(0),
            functions: nodes_by_kind.get(&ScopeKind::Function).copied().unwrap_or(0),
            total_edges: self.edges.len(),
            edges_by_relation: RelationKind::all()
                .iter()
                .map(|kind| (*kind, edges_by_relation.get(kind).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

/// Statistics about a semantic graph
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub total_edges: usize,
    pub edges_by_relation: Vec<(RelationKind, usize)>,
}

impl GraphStats {
    pub fn total_nodes(&self) -> usize {
        self.files + self.classes + self.functions
    }

    pub fn edges_of(&self, relation: RelationKind) -> usize {
        self.edges_by_relation
            .iter()
            .find(|(kind, _)| *kind == relation)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Semantic Graph Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Classes: {}", self.classes)?;
        writeln!(f, "  Functions: {}", self.functions)?;
        writeln!(f, "  Edges: {}", self.total_edges)?;
        for (relation, count) in &self.edges_by_relation {
            writeln!(f, "    {}: {}", relation, count)?;
        }
        Ok(())
    }
}
