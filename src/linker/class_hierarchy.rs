//! Class Hierarchy Resolver
//!
//! Attributes every captured base-class token to its class with a linear
//! merge over both position-sorted lists, then resolves the bare parent name
//! to a class node anywhere in the repository.

use crate::adapter::{BaseClassCapture, DefinitionCapture, FileCaptures};
use crate::edge::{Edge, RelationKind};
use crate::graph::SemanticGraph;
use crate::node::ScopeKind;
use super::{pick_candidate, LinkerStats};

/// Pair each base-class token with the class whose argument list holds it.
///
/// A token belongs to a class when it lies strictly between the class name
/// and the start of the class body.
pub fn attribute_bases(captures: &FileCaptures) -> Vec<(&DefinitionCapture, &BaseClassCapture)> {
    let mut classes: Vec<&DefinitionCapture> = captures.classes().collect();
    classes.sort_by_key(|class| class.name_byte);
    let mut bases: Vec<&BaseClassCapture> = captures.base_classes.iter().collect();
    bases.sort_by_key(|base| base.byte);

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < classes.len() && j < bases.len() {
        let (class, base) = (classes[i], bases[j]);
        if class.name_byte < base.byte && base.byte < class.body.start_byte {
            pairs.push((class, base));
            j += 1;
        } else if base.byte <= class.name_byte {
            // Precedes every remaining class
            j += 1;
        } else {
            i += 1;
        }
    }
    pairs
}

pub struct ClassHierarchyResolver<'a> {
    graph: &'a mut SemanticGraph,
    stats: LinkerStats,
}

impl<'a> ClassHierarchyResolver<'a> {
    pub fn new(graph: &'a mut SemanticGraph) -> Self {
        Self {
            graph,
            stats: LinkerStats::new("Class Hierarchy"),
        }
    }

    pub fn run(mut self, files: &[FileCaptures]) -> LinkerStats {
        for captures in files {
            let edges = self.resolve_file(captures);
            for edge in edges {
                self.graph.add_edge(edge);
            }
        }

        tracing::info!(
            "Class hierarchy: {} edges, {} external parents",
            self.stats.resolved,
            self.stats.unresolved
        );
        self.stats
    }

    fn resolve_file(&mut self, captures: &FileCaptures) -> Vec<Edge> {
        let graph = &*self.graph;
        let mut edges = Vec::new();

        for (class, base) in attribute_bases(captures) {
            self.stats.total += 1;
            let Some(child) = graph.node_at(&captures.file_id, ScopeKind::Class, class.body.start_byte) else {
                tracing::debug!("{}: no node for class {}", captures.file_id, class.name);
                self.stats.unresolved += 1;
                continue;
            };

            let candidates: Vec<_> = graph
                .resolve_by_suffix(&[base.name.as_str()])
                .into_iter()
                .filter(|path| **path != child.path)
                .filter(|path| graph.get_node(path).is_some_and(|node| node.kind == ScopeKind::Class))
                .collect();
            if candidates.len() > 1 {
                self.stats.ambiguous += 1;
            }

            match pick_candidate(graph, &candidates, None) {
                Some(parent) => {
                    edges.push(Edge::new(child.path.clone(), parent.clone(), RelationKind::ClassHierarchy));
                    self.stats.resolved += 1;
                }
                None => {
                    tracing::debug!("{}: base class {} is external", child.path, base.name);
                    self.stats.unresolved += 1;
                }
            }
        }

        edges
    }
}
