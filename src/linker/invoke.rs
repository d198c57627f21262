//! Invoke Integrator
//!
//! Maps call-graph names onto scope nodes and keeps only the calls the static
//! structure can explain: the caller's file must reach the callee through
//! Encapsulation, Ownership or Import edges.

use crate::callgraph::CallGraph;
use crate::edge::{Edge, RelationKind};
use crate::graph::SemanticGraph;
use crate::scope_path::ScopePath;
use super::LinkerStats;
use std::collections::{HashMap, HashSet};

const GLOBAL_MARKER: &str = "(global)";

/// Translate a code2flow qualified name into path segments.
///
/// `pkg.util::Runner.run` → `["pkg", "util.py", "Runner", "run"]`;
/// `app::(global)` → `["app.py"]`.
pub fn translate_qualified_name(name: &str) -> Vec<String> {
    let (module, scope) = name.split_once("::").unwrap_or(("", name));

    let mut segments: Vec<String> = Vec::new();
    let module_parts: Vec<&str> = module.split('.').filter(|part| !part.is_empty()).collect();
    if let Some((stem, dirs)) = module_parts.split_last() {
        segments.extend(dirs.iter().map(|dir| dir.to_string()));
        segments.push(format!("{}.py", stem));
    }

    segments.extend(
        scope
            .split(['.', ':'])
            .filter(|part| !part.is_empty() && *part != GLOBAL_MARKER)
            .map(str::to_string),
    );
    segments
}

pub struct InvokeIntegrator<'a> {
    graph: &'a mut SemanticGraph,
    /// Static reach of each caller file
    reach: HashMap<String, HashSet<ScopePath>>,
    stats: LinkerStats,
}

impl<'a> InvokeIntegrator<'a> {
    pub fn new(graph: &'a mut SemanticGraph) -> Self {
        Self {
            graph,
            reach: HashMap::new(),
            stats: LinkerStats::new("Invoke Integrator"),
        }
    }

    /// Non-script nodes matching a qualified name.
    fn candidates(&self, name: &str) -> Vec<ScopePath> {
        let segments = translate_qualified_name(name);
        let suffix: Vec<&str> = segments.iter().map(String::as_str).collect();
        self.graph
            .resolve_by_suffix(&suffix)
            .into_iter()
            .filter(|path| !path.is_script())
            .cloned()
            .collect()
    }

    fn reaches(&mut self, source: &ScopePath, target: &ScopePath) -> bool {
        let graph = &*self.graph;
        self.reach
            .entry(source.file().to_string())
            .or_insert_with(|| {
                graph.reachable_from(&source.file_path(), |relation| relation.is_static_reach())
            })
            .contains(target)
    }

    pub fn run(mut self, calls: &CallGraph) -> LinkerStats {
        let resolved: HashMap<&str, Vec<ScopePath>> = calls
            .nodes
            .iter()
            .map(|(uid, name)| (uid.as_str(), self.candidates(name)))
            .collect();

        for (source_uid, target_uid) in &calls.edges {
            self.stats.total += 1;
            let sources = resolved.get(source_uid.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let targets = resolved.get(target_uid.as_str()).map(Vec::as_slice).unwrap_or(&[]);

            if sources.is_empty() || targets.is_empty() {
                tracing::debug!("Call {} -> {} has no matching nodes", source_uid, target_uid);
                self.stats.unresolved += 1;
                continue;
            }
            if sources.len() > 1 || targets.len() > 1 {
                self.stats.ambiguous += 1;
            }

            for source in sources {
                for target in targets {
                    if self.reaches(source, target) {
                        self.graph
                            .add_edge(Edge::new(source.clone(), target.clone(), RelationKind::Invoke));
                        self.stats.resolved += 1;
                    } else {
                        tracing::debug!("Rejected call {} -> {}", source, target);
                        self.stats.rejected += 1;
                    }
                }
            }
        }

        tracing::info!(
            "Invoke: {} edges, {} rejected candidates",
            self.stats.resolved,
            self.stats.rejected
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CaptureAdapter, FileCaptures, PythonAdapter};
    use crate::linker::ImportResolver;
    use crate::scope::build_file_scopes;

    fn static_graph(files: &[(&str, &str)]) -> SemanticGraph {
        let adapter = PythonAdapter::new().unwrap();
        let captures: Vec<FileCaptures> = files
            .iter()
            .map(|(id, source)| adapter.capture(id, source).unwrap())
            .collect();
        let mut graph = SemanticGraph::new();
        for file in &captures {
            build_file_scopes(&mut graph, file).unwrap();
        }
        ImportResolver::new(&mut graph, &captures).run().unwrap();
        graph
    }

    fn calls(edges: &[(&str, &str)]) -> CallGraph {
        let mut calls = CallGraph::new();
        for (source, target) in edges {
            calls.add_node(*source, *source);
            calls.add_node(*target, *target);
            calls.add_edge(*source, *target);
        }
        calls
    }

    fn path(file: &str, scopes: &[&str]) -> ScopePath {
        ScopePath::new(file, scopes.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_translate_qualified_name() {
        assert_eq!(translate_qualified_name("pkg.util::Runner.run"), vec!["pkg", "util.py", "Runner", "run"]);
        assert_eq!(translate_qualified_name("app::(global)"), vec!["app.py"]);
        assert_eq!(translate_qualified_name("helper"), vec!["helper"]);
    }

    #[test]
    fn test_unrelated_same_name_is_rejected() {
        let mut graph = static_graph(&[
            ("a.py", "def work():\n    pass\n"),
            ("b.py", "def work():\n    pass\n"),
        ]);
        let stats = InvokeIntegrator::new(&mut graph).run(&calls(&[("a::work", "b::work")]));

        assert!(!graph.has_edge(&path("a.py", &["work"]), &path("b.py", &["work"]), RelationKind::Invoke));
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.resolved, 0);
    }

    #[test]
    fn test_imported_callee_is_accepted() {
        let mut graph = static_graph(&[
            ("a.py", "def work():\n    pass\n"),
            ("b.py", "from a import work\n\ndef main():\n    work()\n"),
        ]);
        let stats = InvokeIntegrator::new(&mut graph).run(&calls(&[("b::main", "a::work")]));

        assert!(graph.has_edge(&path("b.py", &["main"]), &path("a.py", &["work"]), RelationKind::Invoke));
        assert_eq!(stats.resolved, 1);
    }

    #[test]
    fn test_ambiguous_callee_filtered_by_reach() {
        let mut graph = static_graph(&[
            ("x/main.py", "from util import helper\n\ndef run():\n    helper()\n"),
            ("x/util.py", "def helper():\n    pass\n"),
            ("y/util.py", "def helper():\n    pass\n"),
        ]);
        let stats = InvokeIntegrator::new(&mut graph).run(&calls(&[("main::run", "util::helper")]));

        let run = path("x/main.py", &["run"]);
        assert!(graph.has_edge(&run, &path("x/util.py", &["helper"]), RelationKind::Invoke));
        assert!(!graph.has_edge(&run, &path("y/util.py", &["helper"]), RelationKind::Invoke));
        assert_eq!(stats.ambiguous, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_global_callers_are_dropped() {
        let mut graph = static_graph(&[("a.py", "def work():\n    pass\n\nwork()\n")]);
        let stats = InvokeIntegrator::new(&mut graph).run(&calls(&[("a::(global)", "a::work")]));

        assert_eq!(stats.unresolved, 1);
        assert_eq!(graph.stats().edges_of(RelationKind::Invoke), 0);
    }

    #[test]
    fn test_same_file_call() {
        let mut graph = static_graph(&[(
            "svc.py",
            "class Service:\n    def start(self):\n        self.load()\n\n    def load(self):\n        pass\n",
        )]);
        InvokeIntegrator::new(&mut graph).run(&calls(&[("svc::Service.start", "svc::Service.load")]));

        assert!(graph.has_edge(
            &path("svc.py", &["Service", "start"]),
            &path("svc.py", &["Service", "load"]),
            RelationKind::Invoke
        ));
    }
}
