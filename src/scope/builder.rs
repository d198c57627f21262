//! Interval stacking over definition bodies
//!
//! Every definition contributes an `Enter` event at its body start and an
//! `Exit` event at its body end. Sweeping the sorted events with a path stack
//! reconstructs arbitrary nesting without walking the syntax tree, because
//! body spans are either strictly nested or disjoint.

use crate::{Error, Result};
use crate::adapter::{DefinitionCapture, FileCaptures};
use crate::edge::Edge;
use crate::graph::SemanticGraph;
use crate::node::ScopeNode;
use crate::scope_path::ScopePath;

#[derive(Debug, Clone, Copy)]
enum ScopeEvent<'a> {
    Enter(&'a DefinitionCapture),
    Exit(usize),
}

impl ScopeEvent<'_> {
    fn offset(&self) -> usize {
        match self {
            ScopeEvent::Enter(def) => def.body.start_byte,
            ScopeEvent::Exit(offset) => *offset,
        }
    }

    /// At equal offsets a scope closes before the next one opens.
    fn sort_key(&self) -> (usize, u8) {
        match self {
            ScopeEvent::Exit(_) => (self.offset(), 0),
            ScopeEvent::Enter(_) => (self.offset(), 1),
        }
    }
}

/// Add the script node, one node per definition, and the structural edges
/// of a single file. Returns the number of definitions added.
pub fn build_file_scopes(graph: &mut SemanticGraph, captures: &FileCaptures) -> Result<usize> {
    let script = ScopePath::script(captures.file_id.clone());
    graph.add_node(ScopeNode::script(captures.file_id.clone(), captures.span));

    let mut events: Vec<ScopeEvent> = Vec::with_capacity(captures.definitions.len() * 2);
    for def in &captures.definitions {
        events.push(ScopeEvent::Enter(def));
        events.push(ScopeEvent::Exit(def.body.end_byte));
    }
    events.sort_by_key(ScopeEvent::sort_key);

    let mut stack: Vec<ScopePath> = vec![script];
    let mut added = 0;

    for event in events {
        match event {
            ScopeEvent::Enter(def) => {
                let parent = stack.last().cloned().unwrap_or_else(|| ScopePath::script(captures.file_id.clone()));
                let path = parent.child(def.name.clone());
                let nesting = stack.len();

                if graph.add_node(ScopeNode::new(path.clone(), def.kind, nesting, def.body)) {
                    added += 1;
                }
                graph.add_edge(Edge::structural(parent, path.clone()));
                stack.push(path);
            }
            ScopeEvent::Exit(offset) => {
                // The script entry never pops
                if stack.len() <= 1 {
                    return Err(Error::StructuralInconsistency {
                        file: captures.file_id.clone(),
                        offset,
                    });
                }
                stack.pop();
            }
        }
    }

    tracing::debug!("{}: {} scopes", captures.file_id, added);
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CaptureAdapter, PythonAdapter};
    use crate::edge::RelationKind;
    use crate::node::{ScopeKind, Span};

    fn build(source: &str) -> SemanticGraph {
        let adapter = PythonAdapter::new().unwrap();
        let captures = adapter.capture("pkg/mod.py", source).unwrap();
        let mut graph = SemanticGraph::new();
        build_file_scopes(&mut graph, &captures).unwrap();
        graph
    }

    fn path(parts: &[&str]) -> ScopePath {
        ScopePath::new("pkg/mod.py", parts.iter().map(|s| s.to_string()).collect())
    }

    fn def(name: &str, start: usize, end: usize) -> DefinitionCapture {
        DefinitionCapture {
            kind: ScopeKind::Function,
            name: name.to_string(),
            name_byte: start.saturating_sub(1),
            body: Span { start_byte: start, end_byte: end, ..Span::default() },
            params: None,
        }
    }

    #[test]
    fn test_nested_scopes() {
        let graph = build(
            r#"
class Outer:
    def method(self):
        class Local:
            def deep(self):
                pass
        return Local

    def other(self):
        pass

def top():
    def helper():
        pass
    return helper
"#,
        );

        let script = ScopePath::script("pkg/mod.py");
        assert!(graph.has_edge(&script, &path(&["Outer"]), RelationKind::Encapsulation));
        assert!(graph.has_edge(&script, &path(&["top"]), RelationKind::Encapsulation));
        assert!(graph.has_edge(&path(&["Outer"]), &path(&["Outer", "method"]), RelationKind::Ownership));
        assert!(graph.has_edge(&path(&["Outer"]), &path(&["Outer", "other"]), RelationKind::Ownership));
        assert!(graph.has_edge(
            &path(&["Outer", "method", "Local"]),
            &path(&["Outer", "method", "Local", "deep"]),
            RelationKind::Ownership
        ));
        assert!(graph.has_edge(&path(&["top"]), &path(&["top", "helper"]), RelationKind::Ownership));

        let deep = graph.get_node(&path(&["Outer", "method", "Local", "deep"])).unwrap();
        assert_eq!(deep.nesting, 4);
        assert_eq!(deep.kind, ScopeKind::Function);
        assert_eq!(graph.get_node(&path(&["Outer", "method", "Local"])).unwrap().kind, ScopeKind::Class);
        assert_eq!(graph.get_node(&script).unwrap().nesting, 0);
    }

    #[test]
    fn test_every_definition_has_one_parent() {
        let graph = build(
            r#"
class A:
    def f(self):
        pass
    def g(self):
        def h():
            pass

def k():
    pass
"#,
        );

        for node in graph.nodes() {
            let parents = graph.structural_parents(&node.path);
            if node.kind == ScopeKind::Script {
                assert!(parents.is_empty());
            } else {
                assert_eq!(parents.len(), 1, "{} has {} parents", node.path, parents.len());
                assert_eq!(Some(parents[0].clone()), node.path.parent());
            }
        }
    }

    #[test]
    fn test_sibling_sharing_boundary_closes_first() {
        // b opens exactly where a closes: a must be popped first
        let captures = FileCaptures {
            file_id: "pkg/mod.py".into(),
            definitions: vec![def("a", 10, 20), def("b", 20, 30)],
            ..FileCaptures::default()
        };
        let mut graph = SemanticGraph::new();
        build_file_scopes(&mut graph, &captures).unwrap();

        let script = ScopePath::script("pkg/mod.py");
        assert!(graph.has_edge(&script, &path(&["b"]), RelationKind::Encapsulation));
        assert!(!graph.contains_node(&path(&["a", "b"])));
    }

    #[test]
    fn test_malformed_spans_are_fatal() {
        // Body ends before it starts: the exit arrives with nothing open
        let captures = FileCaptures {
            file_id: "pkg/mod.py".into(),
            definitions: vec![def("broken", 50, 5)],
            ..FileCaptures::default()
        };
        let mut graph = SemanticGraph::new();
        let err = build_file_scopes(&mut graph, &captures).unwrap_err();
        assert!(matches!(err, Error::StructuralInconsistency { offset: 5, .. }));
    }
}
