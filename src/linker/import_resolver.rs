//! Import Resolver
//!
//! Resolves every import statement of every file to `Import` edges:
//! - `import X` → file-to-file edge
//! - `from X import Y` → edge to the symbol `Y` (or to submodule `X/Y`)
//! - `from X import *` → edges to everything `X` exposes
//!
//! A `from` import needs the dependency's own imports linked first so that
//! re-exported names can be followed. Files are therefore resolved depth
//! first on an explicit work-list, with [`FileResolutionState`] as the cycle
//! guard. A first walk over `from` dependencies rejects circular imports; the
//! second walk links, also visiting files pulled in by plain `import`.

use crate::{Error, Result};
use crate::adapter::{FileCaptures, ImportKind, ImportStatement, ModuleRef};
use crate::edge::{Edge, RelationKind};
use crate::graph::SemanticGraph;
use crate::scope_path::{ScopePath, SEPARATOR};
use super::LinkerStats;
use std::collections::{HashMap, HashSet, VecDeque};

const SOURCE_EXTENSION: &str = ".py";
const PACKAGE_INIT: &str = "__init__.py";

/// Resolution progress of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileResolutionState {
    #[default]
    Unvisited,
    InProgress,
    Resolved,
}

/// What a module reference points at inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleTarget {
    /// A single source file
    File(String),
    /// A package directory, with its `__init__.py` when there is one
    Package { dir: String, init: Option<String> },
}

impl ModuleTarget {
    /// The file whose graph stands for the module, if any.
    pub fn module_file(&self) -> Option<&str> {
        match self {
            ModuleTarget::File(file) => Some(file),
            ModuleTarget::Package { init, .. } => init.as_deref(),
        }
    }
}

/// Maps module references to repository file ids.
#[derive(Debug, Clone, Default)]
pub struct ModuleLocator {
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl ModuleLocator {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: HashSet<String> = files.into_iter().map(Into::into).collect();
        let mut dirs = HashSet::new();
        dirs.insert(String::new());
        for file in &files {
            let mut dir = parent_dir(file);
            while let Some(current) = dir {
                if !dirs.insert(current.to_string()) {
                    break;
                }
                dir = parent_dir(current);
            }
        }
        Self { files, dirs }
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.files.contains(file)
    }

    /// Resolve a module reference written in `importer`.
    ///
    /// The base directory is the importer's directory, ascended one level per
    /// leading dot beyond the first. The dotted remainder is then searched in
    /// the base directory, one level above it, and finally at the repository
    /// root. `None` means the module lives outside the repository.
    pub fn locate(&self, importer: &str, module: &ModuleRef) -> Option<ModuleTarget> {
        let mut base = parent_dir(importer).unwrap_or("");
        for _ in 1..module.leading_dots {
            base = parent_dir(base)?;
        }

        let segments = module.segments();
        if segments.is_empty() {
            // `from . import x` names the package itself
            return module.is_relative().then(|| self.package(base));
        }

        let relative = segments.join("/");
        let mut candidates = vec![base];
        if let Some(up) = parent_dir(base) {
            candidates.push(up);
        }
        candidates.push("");
        candidates.dedup();

        candidates
            .into_iter()
            .find_map(|dir| self.lookup(dir, &relative))
    }

    /// `dir/name.py`, else `dir/name/__init__.py`.
    pub fn submodule(&self, dir: &str, name: &str) -> Option<String> {
        let file = join(dir, &format!("{}{}", name, SOURCE_EXTENSION));
        if self.files.contains(&file) {
            return Some(file);
        }
        let init = join(&join(dir, name), PACKAGE_INIT);
        self.files.contains(&init).then_some(init)
    }

    fn lookup(&self, dir: &str, relative: &str) -> Option<ModuleTarget> {
        let file = join(dir, &format!("{}{}", relative, SOURCE_EXTENSION));
        if self.files.contains(&file) {
            return Some(ModuleTarget::File(file));
        }
        let package = join(dir, relative);
        self.dirs.contains(&package).then(|| self.package(&package))
    }

    fn package(&self, dir: &str) -> ModuleTarget {
        let init = join(dir, PACKAGE_INIT);
        ModuleTarget::Package {
            dir: dir.to_string(),
            init: self.files.contains(&init).then_some(init),
        }
    }
}

/// Directory part of a file id or directory; `None` above the root.
fn parent_dir(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once(SEPARATOR).map(|(dir, _)| dir).unwrap_or(""))
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{}{}{}", dir, SEPARATOR, rest)
    }
}

/// Which walk over the import graph is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// `from` dependencies only; meeting an in-progress file is a cycle
    CycleCheck,
    /// `from` dependencies plus every file a symbol lookup may walk into
    Link,
}

/// One file on the resolution work-list, with the dependencies still to visit.
struct Frame {
    file: String,
    pending: VecDeque<String>,
}

pub struct ImportResolver<'a> {
    graph: &'a mut SemanticGraph,
    locator: ModuleLocator,
    /// File ids sorted, so results do not depend on discovery order
    order: Vec<&'a str>,
    imports: HashMap<&'a str, &'a [ImportStatement]>,
    state: HashMap<String, FileResolutionState>,
    stats: LinkerStats,
}

impl<'a> ImportResolver<'a> {
    pub fn new(graph: &'a mut SemanticGraph, files: &'a [FileCaptures]) -> Self {
        let locator = ModuleLocator::new(files.iter().map(|f| f.file_id.clone()));
        let mut order: Vec<&str> = files.iter().map(|f| f.file_id.as_str()).collect();
        order.sort_unstable();
        order.dedup();
        let imports = files
            .iter()
            .map(|f| (f.file_id.as_str(), f.imports.as_slice()))
            .collect();

        Self {
            graph,
            locator,
            order,
            imports,
            state: HashMap::new(),
            stats: LinkerStats::new("Import Resolver"),
        }
    }

    pub fn state_of(&self, file: &str) -> FileResolutionState {
        self.state.get(file).copied().unwrap_or_default()
    }

    /// Resolve every file. A circular `from` import aborts the whole run
    /// before any edge is added.
    pub fn run(mut self) -> Result<LinkerStats> {
        self.walk_all(Pass::CycleCheck)?;
        self.walk_all(Pass::Link)?;

        tracing::info!(
            "Imports: {} resolved, {} unresolved",
            self.stats.resolved,
            self.stats.unresolved
        );
        Ok(self.stats)
    }

    fn walk_all(&mut self, pass: Pass) -> Result<()> {
        self.state.clear();
        let order = self.order.clone();
        for file in order {
            if self.state_of(file) == FileResolutionState::Unvisited {
                self.walk(file, pass)?;
            }
        }
        Ok(())
    }

    fn walk(&mut self, root: &str, pass: Pass) -> Result<()> {
        self.state.insert(root.to_string(), FileResolutionState::InProgress);
        let mut stack = vec![self.frame(root, pass)];

        while let Some(frame) = stack.last_mut() {
            match frame.pending.pop_front() {
                Some(dependency) => match self.state_of(&dependency) {
                    FileResolutionState::Unvisited => {
                        self.state.insert(dependency.clone(), FileResolutionState::InProgress);
                        let next = self.frame(&dependency, pass);
                        stack.push(next);
                    }
                    FileResolutionState::InProgress if pass == Pass::CycleCheck => {
                        return Err(Error::CircularImport {
                            importer: frame.file.clone(),
                            dependency,
                        });
                    }
                    // Plain imports may loop; the lookup sees what is linked so far
                    FileResolutionState::InProgress => {
                        tracing::debug!("{}: {} is still being linked", frame.file, dependency);
                    }
                    FileResolutionState::Resolved => {}
                },
                None => {
                    let file = frame.file.clone();
                    stack.pop();
                    if pass == Pass::Link {
                        self.link_file(&file);
                    }
                    self.state.insert(file, FileResolutionState::Resolved);
                }
            }
        }

        Ok(())
    }

    fn statements(&self, file: &str) -> &'a [ImportStatement] {
        self.imports.get(file).copied().unwrap_or(&[])
    }

    /// Files that must be walked before `file` is finished.
    ///
    /// A `from` import reads its module's graph. In the link pass, files that
    /// `file` imports as a whole are added too, since lookups through `file`
    /// follow those edges.
    fn frame(&self, file: &str, pass: Pass) -> Frame {
        let mut pending = VecDeque::new();
        let mut push = |dependency: String| {
            if !pending.contains(&dependency) {
                pending.push_back(dependency);
            }
        };

        for statement in self.statements(file) {
            let Some(target) = self.locator.locate(file, &statement.module) else {
                continue;
            };
            match (&target, &statement.kind) {
                (_, ImportKind::Module) => {
                    if pass == Pass::Link {
                        if let Some(module) = target.module_file() {
                            push(module.to_string());
                        }
                    }
                }
                (ModuleTarget::Package { dir, init }, ImportKind::Names(names)) => {
                    let mut needs_init = false;
                    for name in names {
                        match self.locator.submodule(dir, name) {
                            Some(submodule) if pass == Pass::Link => push(submodule),
                            Some(_) => {}
                            // Only names that are not submodules are looked up in __init__
                            None => needs_init = true,
                        }
                    }
                    if needs_init {
                        if let Some(init) = init {
                            push(init.clone());
                        }
                    }
                }
                _ => {
                    if let Some(module) = target.module_file() {
                        push(module.to_string());
                    }
                }
            }
        }

        Frame {
            file: file.to_string(),
            pending,
        }
    }

    fn link_file(&mut self, file: &str) {
        let importer = ScopePath::script(file);
        for statement in self.statements(file) {
            match &statement.kind {
                ImportKind::Module => self.link_module(&importer, statement),
                ImportKind::Wildcard => self.link_wildcard(&importer, statement),
                ImportKind::Names(names) => self.link_names(&importer, statement, names),
            }
        }
    }

    fn add_import(&mut self, importer: &ScopePath, target: ScopePath) {
        self.graph
            .add_edge(Edge::new(importer.clone(), target, RelationKind::Import));
        self.stats.resolved += 1;
    }

    fn unresolved(&mut self, importer: &ScopePath, what: &str) {
        tracing::debug!("{}: unresolved import {}", importer, what);
        self.stats.unresolved += 1;
    }

    fn link_module(&mut self, importer: &ScopePath, statement: &ImportStatement) {
        self.stats.total += 1;
        let target = self.locator.locate(importer.file(), &statement.module);
        match target.as_ref().and_then(ModuleTarget::module_file) {
            Some(module) if module != importer.file() => {
                self.add_import(importer, ScopePath::script(module));
            }
            Some(_) => {}
            None => self.unresolved(importer, &statement.module.to_string()),
        }
    }

    fn link_wildcard(&mut self, importer: &ScopePath, statement: &ImportStatement) {
        self.stats.total += 1;
        let target = self.locator.locate(importer.file(), &statement.module);
        let Some(module) = target.as_ref().and_then(ModuleTarget::module_file) else {
            self.unresolved(importer, &format!("{}.*", statement.module));
            return;
        };

        let module = ScopePath::script(module);
        let exposed: Vec<ScopePath> = self
            .graph
            .targets(&module, RelationKind::Import)
            .into_iter()
            .chain(self.graph.targets(&module, RelationKind::Encapsulation))
            .filter(|target| *target != importer)
            .cloned()
            .collect();

        tracing::debug!("{}: {} names from {}.*", importer, exposed.len(), module);
        for target in exposed {
            self.graph
                .add_edge(Edge::new(importer.clone(), target, RelationKind::Import));
        }
        self.stats.resolved += 1;
    }

    fn link_names(&mut self, importer: &ScopePath, statement: &ImportStatement, names: &[String]) {
        self.stats.total += names.len();
        let target = self.locator.locate(importer.file(), &statement.module);

        for name in names {
            let resolved = match &target {
                Some(ModuleTarget::File(module)) => self.find_symbol(module, name),
                Some(ModuleTarget::Package { dir, init }) => self
                    .locator
                    .submodule(dir, name)
                    .map(ScopePath::script)
                    .or_else(|| init.as_deref().and_then(|init| self.find_symbol(init, name))),
                None => None,
            };

            match resolved {
                Some(symbol) => self.add_import(importer, symbol),
                None => self.unresolved(importer, &format!("{}.{}", statement.module, name)),
            }
        }
    }

    /// Find what `name` refers to inside `module`.
    ///
    /// A top-level definition wins. Otherwise the module's own imports are
    /// searched breadth first: an imported node named `name`, or an imported
    /// file whose module name is `name`, or a top-level definition of an
    /// imported file.
    fn find_symbol(&self, module: &str, name: &str) -> Option<ScopePath> {
        let script = ScopePath::script(module);
        let direct = script.child(name);
        if self.graph.has_edge(&script, &direct, RelationKind::Encapsulation) {
            return Some(direct);
        }

        let mut visited: HashSet<ScopePath> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(script.clone());
        queue.push_back(script);

        while let Some(current) = queue.pop_front() {
            let imported = self.graph.targets(&current, RelationKind::Import);

            let reexport = imported.iter().find(|target| {
                if target.is_script() {
                    target.module_name() == name
                } else {
                    target.last_segment() == name
                }
            });
            if let Some(found) = reexport {
                return Some((*found).clone());
            }

            for target in imported.into_iter().filter(|target| target.is_script()) {
                if !visited.insert(target.clone()) {
                    continue;
                }
                let child = target.child(name);
                if self.graph.has_edge(target, &child, RelationKind::Encapsulation) {
                    return Some(child);
                }
                queue.push_back(target.clone());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CaptureAdapter, PythonAdapter};
    use crate::scope::build_file_scopes;

    fn captures(files: &[(&str, &str)]) -> Vec<FileCaptures> {
        let adapter = PythonAdapter::new().unwrap();
        files
            .iter()
            .map(|(id, source)| adapter.capture(id, source).unwrap())
            .collect()
    }

    fn link(files: &[(&str, &str)]) -> Result<SemanticGraph> {
        let captures = captures(files);
        let mut graph = SemanticGraph::new();
        for file in &captures {
            build_file_scopes(&mut graph, file)?;
        }
        ImportResolver::new(&mut graph, &captures).run()?;
        Ok(graph)
    }

    fn import_targets(graph: &SemanticGraph, file: &str) -> Vec<String> {
        let mut targets: Vec<String> = graph
            .targets(&ScopePath::script(file), RelationKind::Import)
            .into_iter()
            .map(ScopePath::to_path_string)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    #[test]
    fn test_locator_search_order() {
        let locator = ModuleLocator::new(["pkg/sub/b.py", "pkg/a.py", "util.py", "pkg/sub/util.py"]);

        // Computed directory first
        assert_eq!(
            locator.locate("pkg/sub/b.py", &ModuleRef::parse("util")),
            Some(ModuleTarget::File("pkg/sub/util.py".into()))
        );
        // Then one level up
        assert_eq!(
            locator.locate("pkg/sub/b.py", &ModuleRef::parse("a")),
            Some(ModuleTarget::File("pkg/a.py".into()))
        );
        // Then the repository root
        assert_eq!(
            locator.locate("pkg/a.py", &ModuleRef::parse("util")),
            Some(ModuleTarget::File("util.py".into()))
        );
        assert_eq!(locator.locate("pkg/a.py", &ModuleRef::parse("os.path")), None);
    }

    #[test]
    fn test_locator_relative_levels() {
        let locator = ModuleLocator::new(["pkg/__init__.py", "pkg/a.py", "pkg/sub/b.py"]);

        assert_eq!(
            locator.locate("pkg/sub/b.py", &ModuleRef::parse("..")),
            Some(ModuleTarget::Package {
                dir: "pkg".into(),
                init: Some("pkg/__init__.py".into())
            })
        );
        assert_eq!(
            locator.locate("pkg/sub/b.py", &ModuleRef::parse("..a")),
            Some(ModuleTarget::File("pkg/a.py".into()))
        );
        // Ascending past the repository root
        assert_eq!(locator.locate("pkg/a.py", &ModuleRef::parse("...x")), None);
        assert_eq!(locator.submodule("pkg", "a"), Some("pkg/a.py".into()));
        assert_eq!(locator.submodule("pkg", "missing"), None);
    }

    #[test]
    fn test_relative_import_targets_parent_package() {
        let graph = link(&[
            ("pkg/a.py", "def f():\n    pass\n"),
            ("pkg/sub/a.py", "def g():\n    pass\n"),
            ("pkg/sub/b.py", "from .. import a\n"),
        ])
        .unwrap();

        assert_eq!(import_targets(&graph, "pkg/sub/b.py"), vec!["pkg/a.py"]);
    }

    #[test]
    fn test_from_import_symbol_and_module() {
        let graph = link(&[
            ("m.py", "class Base:\n    pass\n"),
            ("n.py", "from m import Base\nimport m as mod\nimport os\n"),
        ])
        .unwrap();

        assert_eq!(import_targets(&graph, "n.py"), vec!["m.py", "m.py/Base"]);
    }

    #[test]
    fn test_circular_import_is_fatal() {
        let err = link(&[
            ("a.py", "from b import x\n"),
            ("b.py", "from c import y\n"),
            ("c.py", "from a import z\n"),
        ])
        .unwrap_err();

        match err {
            Error::CircularImport { importer, dependency } => {
                let cycle = ["a.py", "b.py", "c.py"];
                assert!(cycle.contains(&importer.as_str()));
                assert!(cycle.contains(&dependency.as_str()));
                assert_ne!(importer, dependency);
            }
            other => panic!("expected CircularImport, got {other}"),
        }
    }

    #[test]
    fn test_import_chain_without_cycle() {
        let graph = link(&[
            ("a.py", "from b import x\n"),
            ("b.py", "from c import x\n"),
            ("c.py", "def x():\n    pass\n"),
        ])
        .unwrap();

        assert_eq!(import_targets(&graph, "b.py"), vec!["c.py/x"]);
        // a.py finds x through b's re-export
        assert_eq!(import_targets(&graph, "a.py"), vec!["c.py/x"]);
    }

    #[test]
    fn test_plain_imports_do_not_participate_in_cycles() {
        let graph = link(&[("a.py", "import b\n"), ("b.py", "import a\n")]).unwrap();
        assert_eq!(import_targets(&graph, "a.py"), vec!["b.py"]);
        assert_eq!(import_targets(&graph, "b.py"), vec!["a.py"]);
    }

    #[test]
    fn test_reexport_through_plain_import_ignores_file_order() {
        let files = [
            ("a.py", "from x import Z\n"),
            ("x.py", "import y\n"),
            ("y.py", "from w import Z\n"),
            ("w.py", "class Z:\n    pass\n"),
        ];
        let mut reversed = files;
        reversed.reverse();

        let forward = link(&files).unwrap();
        let backward = link(&reversed).unwrap();

        assert_eq!(import_targets(&forward, "a.py"), vec!["w.py/Z"]);
        for (file, _) in files {
            assert_eq!(import_targets(&forward, file), import_targets(&backward, file));
        }
    }

    #[test]
    fn test_plain_import_loop_with_from_import() {
        let files = [
            ("x.py", "import y\n\nclass Q:\n    pass\n"),
            ("y.py", "from x import Q\n"),
        ];
        let mut reversed = files;
        reversed.reverse();

        for order in [&files, &reversed] {
            let graph = link(order).unwrap();
            assert_eq!(import_targets(&graph, "x.py"), vec!["y.py"]);
            assert_eq!(import_targets(&graph, "y.py"), vec!["x.py/Q"]);
        }
    }

    #[test]
    fn test_from_import_of_itself_is_circular() {
        let err = link(&[("a.py", "from a import f\n\ndef f():\n    pass\n")]).unwrap_err();
        assert!(matches!(
            err,
            Error::CircularImport { ref importer, ref dependency } if importer == "a.py" && dependency == "a.py"
        ));
    }

    #[test]
    fn test_wildcard_exposes_local_and_reexported_names() {
        let graph = link(&[
            ("z.py", "from x import *\n"),
            ("x.py", "from y import g\n\ndef f():\n    pass\n\nclass C:\n    pass\n"),
            ("y.py", "def g():\n    pass\n"),
        ])
        .unwrap();

        assert_eq!(import_targets(&graph, "z.py"), vec!["x.py/C", "x.py/f", "y.py/g"]);
    }

    #[test]
    fn test_package_init_reexport() {
        let graph = link(&[
            ("pkg/__init__.py", "from .impl import Engine\n"),
            ("pkg/impl.py", "class Engine:\n    pass\n"),
            ("pkg/tools.py", "def run():\n    pass\n"),
            ("app.py", "from pkg import Engine, tools\n"),
        ])
        .unwrap();

        assert_eq!(import_targets(&graph, "app.py"), vec!["pkg/impl.py/Engine", "pkg/tools.py"]);
    }

    #[test]
    fn test_unresolved_names_are_skipped() {
        let captures = captures(&[
            ("a.py", "from b import missing\nfrom numpy import array\n"),
            ("b.py", "def present():\n    pass\n"),
        ]);
        let mut graph = SemanticGraph::new();
        for file in &captures {
            build_file_scopes(&mut graph, file).unwrap();
        }
        let stats = ImportResolver::new(&mut graph, &captures).run().unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.unresolved, 2);
        assert!(import_targets(&graph, "a.py").is_empty());
    }
}
