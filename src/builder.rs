//! Semantic graph builder
//!
//! Orchestrates one repository build:
//! 1. discover source files
//! 2. extract captures on a worker pool (read-only, per file)
//! 3. build scope nodes for every file
//! 4. resolve imports, then class hierarchy, then invoke edges
//! 5. deduplicate
//!
//! Steps 3 to 5 mutate a single graph sequentially. A structural
//! inconsistency or a circular import aborts the repository; in batch mode
//! the other repositories are unaffected.

use crate::{Error, Result};
use crate::adapter::{default_registry, AdapterRegistry, FileCaptures};
use crate::callgraph::CallGraphSource;
use crate::discovery::{discover_files, discover_repositories, SourceFile};
use crate::graph::SemanticGraph;
use crate::linker::{ClassHierarchyResolver, ImportResolver, InvokeIntegrator, LinkerStats};
use crate::scope::build_file_scopes;
use crate::ui::{ProgressMessage, ProgressPhase};
use crossbeam::channel::{self, Sender};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of one repository build.
#[derive(Debug)]
pub struct BuildReport {
    pub repository: String,
    pub root: PathBuf,
    pub graph: SemanticGraph,
    /// Files captured successfully
    pub files: usize,
    /// Files skipped because they could not be read or parsed
    pub skipped: usize,
    pub duplicates_removed: usize,
    pub linkers: Vec<LinkerStats>,
    pub duration: Duration,
}

/// Outcome of one repository in batch mode.
#[derive(Debug)]
pub struct RepositoryOutcome {
    pub root: PathBuf,
    pub result: Result<BuildReport>,
}

pub struct SemanticGraphBuilder {
    registry: AdapterRegistry,
    call_graph: Option<Box<dyn CallGraphSource>>,
    excludes: Vec<String>,
    threads: usize,
    progress: Option<Sender<ProgressMessage>>,
}

impl SemanticGraphBuilder {
    /// Builder with every built-in adapter registered.
    pub fn new() -> Result<Self> {
        Ok(Self::with_registry(default_registry()?))
    }

    pub fn with_registry(registry: AdapterRegistry) -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            registry,
            call_graph: None,
            excludes: Vec::new(),
            threads,
            progress: None,
        }
    }

    pub fn call_graph(mut self, source: impl CallGraphSource + 'static) -> Self {
        self.call_graph = Some(Box::new(source));
        self
    }

    pub fn excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Worker count for capture extraction and batch builds (at least 1).
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn progress(mut self, sender: Sender<ProgressMessage>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn report(&self, message: ProgressMessage) {
        if let Some(tx) = &self.progress {
            tx.send(message).ok();
        }
    }

    /// Build the graph of a single repository.
    pub fn build_from_one(&self, root: &Path) -> Result<BuildReport> {
        let started = Instant::now();
        let repository = repository_name(root);
        tracing::info!("Building semantic graph for {} ({})", repository, root.display());

        let files = discover_files(root, &self.registry, &self.excludes);
        let captures = self.capture_all(&files)?;
        let skipped = files.len() - captures.len();

        let mut graph = SemanticGraph::new();
        let mut linkers = Vec::new();

        self.report(ProgressMessage::Started { phase: ProgressPhase::Scoping, total: captures.len() });
        for file in &captures {
            build_file_scopes(&mut graph, file)?;
        }
        self.report(ProgressMessage::Finished { phase: ProgressPhase::Scoping });

        self.report(ProgressMessage::Started { phase: ProgressPhase::Imports, total: captures.len() });
        linkers.push(ImportResolver::new(&mut graph, &captures).run()?);
        self.report(ProgressMessage::Finished { phase: ProgressPhase::Imports });

        self.report(ProgressMessage::Started { phase: ProgressPhase::Hierarchy, total: captures.len() });
        linkers.push(ClassHierarchyResolver::new(&mut graph).run(&captures));
        self.report(ProgressMessage::Finished { phase: ProgressPhase::Hierarchy });

        if let Some(source) = &self.call_graph {
            self.report(ProgressMessage::Started { phase: ProgressPhase::Invoke, total: 0 });
            match source.call_graph(root) {
                Ok(calls) => {
                    if calls.is_empty() {
                        tracing::warn!("Call graph for {} has no edges", repository);
                    }
                    linkers.push(InvokeIntegrator::new(&mut graph).run(&calls));
                }
                Err(e) => {
                    tracing::warn!("No call graph for {}: {}", repository, e);
                    self.report(ProgressMessage::Error(e.to_string()));
                }
            }
            self.report(ProgressMessage::Finished { phase: ProgressPhase::Invoke });
        }

        self.report(ProgressMessage::Started { phase: ProgressPhase::Finalizing, total: graph.edge_count() });
        let duplicates_removed = graph.deduplicate();
        self.report(ProgressMessage::Finished { phase: ProgressPhase::Finalizing });

        tracing::info!(
            "{}: {} nodes, {} edges ({} duplicates removed)",
            repository,
            graph.node_count(),
            graph.edge_count(),
            duplicates_removed
        );

        Ok(BuildReport {
            repository,
            root: root.to_path_buf(),
            files: captures.len(),
            skipped,
            graph,
            duplicates_removed,
            linkers,
            duration: started.elapsed(),
        })
    }

    /// Build one graph per child directory of `root`, in parallel.
    ///
    /// Each repository gets its own graph; a failed repository is reported in
    /// its outcome without affecting the rest.
    pub fn build_from_repos(&self, root: &Path) -> Result<Vec<RepositoryOutcome>> {
        let repos = discover_repositories(root)?;
        let (job_tx, job_rx) = channel::unbounded::<(usize, PathBuf)>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, RepositoryOutcome)>();

        for job in repos.iter().cloned().enumerate() {
            job_tx.send(job).ok();
        }
        drop(job_tx);

        let workers = self.threads.min(repos.len()).max(1);
        crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for (index, repo) in job_rx {
                        let result = self.build_from_one(&repo);
                        if let Err(e) = &result {
                            tracing::error!("Build failed for {}: {}", repo.display(), e);
                        }
                        result_tx.send((index, RepositoryOutcome { root: repo, result })).ok();
                    }
                });
            }
        })
        .map_err(|_| Error::Adapter("repository worker panicked".to_string()))?;
        drop(result_tx);

        let mut outcomes: Vec<(usize, RepositoryOutcome)> = result_rx.iter().collect();
        outcomes.sort_by_key(|(index, _)| *index);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }

    /// Extract captures of every file on a worker pool, in discovery order.
    fn capture_all(&self, files: &[SourceFile]) -> Result<Vec<FileCaptures>> {
        self.report(ProgressMessage::Started { phase: ProgressPhase::Parsing, total: files.len() });

        let (job_tx, job_rx) = channel::unbounded::<(usize, &SourceFile)>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, Option<FileCaptures>)>();
        for job in files.iter().enumerate() {
            job_tx.send(job).ok();
        }
        drop(job_tx);

        let workers = self.threads.min(files.len()).max(1);
        crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for (index, file) in job_rx {
                        let captures = self.capture_file(file);
                        self.report(ProgressMessage::Progress {
                            phase: ProgressPhase::Parsing,
                            current: index + 1,
                            file: Some(file.file_id.clone()),
                        });
                        result_tx.send((index, captures)).ok();
                    }
                });
            }
        })
        .map_err(|_| Error::Adapter("capture worker panicked".to_string()))?;
        drop(result_tx);

        let mut slots: Vec<Option<FileCaptures>> = vec![None; files.len()];
        for (index, captures) in result_rx {
            slots[index] = captures;
        }

        self.report(ProgressMessage::Finished { phase: ProgressPhase::Parsing });
        Ok(slots.into_iter().flatten().collect())
    }

    fn capture_file(&self, file: &SourceFile) -> Option<FileCaptures> {
        let adapter = self.registry.find_adapter(&file.path)?;
        let source = match std::fs::read_to_string(&file.path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file.path.display(), e);
                return None;
            }
        };

        match adapter.capture(&file.file_id, &source) {
            Ok(captures) => Some(captures),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", file.file_id, e);
                None
            }
        }
    }
}

fn repository_name(root: &Path) -> String {
    // `.` and `..` have no file name of their own
    let canonical = root.canonicalize().ok();
    root.file_name()
        .or_else(|| canonical.as_deref().and_then(Path::file_name))
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::CallGraph;
    use crate::edge::RelationKind;
    use crate::scope_path::ScopePath;
    use std::fs;

    fn write(root: &Path, file: &str, source: &str) {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }

    fn builder() -> SemanticGraphBuilder {
        SemanticGraphBuilder::new().unwrap().threads(2)
    }

    #[test]
    fn test_two_file_inheritance_scenario() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m.py", "class Base:\n    def run(self):\n        pass\n");
        write(dir.path(), "n.py", "from m import Base\n\nclass Child(Base):\n    pass\n");

        let report = builder().build_from_one(dir.path()).unwrap();
        let graph = &report.graph;

        let m = ScopePath::script("m.py");
        let n = ScopePath::script("n.py");
        let base = m.child("Base");
        let child = n.child("Child");

        assert!(graph.has_edge(&m, &base, RelationKind::Encapsulation));
        assert!(graph.has_edge(&n, &child, RelationKind::Encapsulation));
        assert!(graph.has_edge(&base, &base.child("run"), RelationKind::Ownership));
        assert!(graph.has_edge(&n, &base, RelationKind::Import));
        assert!(graph.has_edge(&child, &base, RelationKind::ClassHierarchy));
        assert_eq!(report.files, 2);
    }

    #[test]
    fn test_circular_import_aborts_repository() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "from b import x\n");
        write(dir.path(), "b.py", "from c import y\n");
        write(dir.path(), "c.py", "from a import z\n");

        let err = builder().build_from_one(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CircularImport { .. }));
    }

    #[test]
    fn test_duplicate_edges_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m.py", "def f():\n    pass\n");
        write(dir.path(), "n.py", "from m import f\nfrom m import f\nfrom m import *\n");

        let report = builder().build_from_one(dir.path()).unwrap();
        let n = ScopePath::script("n.py");
        let f = ScopePath::script("m.py").child("f");

        let imports = report
            .graph
            .edges_from(&n)
            .filter(|edge| edge.relation == RelationKind::Import && edge.target == f)
            .count();
        assert_eq!(imports, 1);
        assert_eq!(report.duplicates_removed, 2);
    }

    #[test]
    fn test_invoke_edges_from_call_graph() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib.py", "def helper():\n    pass\n");
        write(dir.path(), "app.py", "from lib import helper\n\ndef main():\n    helper()\n");

        let mut calls = CallGraph::new();
        calls.add_node("n1", "app::main");
        calls.add_node("n2", "lib::helper");
        calls.add_edge("n1", "n2");

        let report = builder().call_graph(calls).build_from_one(dir.path()).unwrap();
        assert!(report.graph.has_edge(
            &ScopePath::script("app.py").child("main"),
            &ScopePath::script("lib.py").child("helper"),
            RelationKind::Invoke
        ));
        assert_eq!(report.linkers.len(), 3);
    }

    #[test]
    fn test_capture_order_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            write(dir.path(), &format!("pkg/mod_{:02}.py", i), "def f():\n    pass\n");
        }

        let report = builder().threads(4).build_from_one(dir.path()).unwrap();
        let scripts: Vec<String> = report
            .graph
            .nodes()
            .filter(|node| node.is_script())
            .map(|node| node.file().to_string())
            .collect();
        let mut sorted = scripts.clone();
        sorted.sort();
        assert_eq!(scripts, sorted);
        assert_eq!(scripts.len(), 12);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good/a.py", "def f():\n    pass\n");
        write(dir.path(), "bad/a.py", "from b import x\n");
        write(dir.path(), "bad/b.py", "from a import y\n");

        let outcomes = builder().build_from_repos(dir.path()).unwrap();
        assert_eq!(outcomes.len(), 2);

        // Sorted by directory name
        assert!(outcomes[0].root.ends_with("bad"));
        assert!(matches!(outcomes[0].result, Err(Error::CircularImport { .. })));

        let good = outcomes[1].result.as_ref().unwrap();
        assert_eq!(good.repository, "good");
        assert_eq!(good.graph.stats().functions, 1);
    }

    #[test]
    fn test_progress_messages() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "def f():\n    pass\n");

        let (tx, rx) = channel::unbounded();
        builder().progress(tx).build_from_one(dir.path()).unwrap();

        let messages: Vec<ProgressMessage> = rx.try_iter().collect();
        assert!(matches!(
            messages.first(),
            Some(ProgressMessage::Started { phase: ProgressPhase::Parsing, total: 1 })
        ));
        assert!(matches!(
            messages.last(),
            Some(ProgressMessage::Finished { phase: ProgressPhase::Finalizing })
        ));
    }
}
