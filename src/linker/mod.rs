//! Cross-file linkers
//!
//! Each linker runs once per repository over the fully built scope graph and
//! adds one relation:
//! - [`ImportResolver`]: `Import` edges, cycle-checked
//! - [`ClassHierarchyResolver`]: `ClassHierarchy` edges
//! - [`InvokeIntegrator`]: `Invoke` edges from an external call graph

pub mod import_resolver;
pub mod class_hierarchy;
pub mod invoke;

pub use import_resolver::{FileResolutionState, ImportResolver, ModuleLocator, ModuleTarget};
pub use class_hierarchy::ClassHierarchyResolver;
pub use invoke::{InvokeIntegrator, translate_qualified_name};

use crate::graph::SemanticGraph;
use crate::node::ScopeKind;
use crate::scope_path::ScopePath;
use std::fmt;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LinkerStats {
    pub name: &'static str,
    pub total: usize,
    pub resolved: usize,
    /// Names with no in-repository match (treated as external)
    pub unresolved: usize,
    /// Names matching several nodes, settled by [`pick_candidate`]
    pub ambiguous: usize,
    /// Candidates dropped by validation
    pub rejected: usize,
}

impl LinkerStats {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

impl fmt::Display for LinkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Stats:", self.name)?;
        writeln!(f, "  Total: {}", self.total)?;
        writeln!(f, "  ✅ Resolved: {}", self.resolved)?;
        writeln!(f, "  🤔 Ambiguous: {}", self.ambiguous)?;
        writeln!(f, "  🌍 Unresolved: {}", self.unresolved)?;
        write!(f, "  🚫 Rejected: {}", self.rejected)
    }
}

/// Deterministic tie-break among suffix matches.
///
/// Nodes of `preferred` kind win, then the shortest path, then the
/// lexicographically first path string.
pub fn pick_candidate<'g>(
    graph: &SemanticGraph,
    candidates: &[&'g ScopePath],
    preferred: Option<ScopeKind>,
) -> Option<&'g ScopePath> {
    candidates
        .iter()
        .copied()
        .min_by_key(|path| {
            let kind_rank = match (preferred, graph.get_node(path).map(|node| node.kind)) {
                (Some(want), Some(kind)) if want == kind => 0,
                (Some(_), _) => 1,
                (None, _) => 0,
            };
            let text = path.to_path_string();
            (kind_rank, text.len(), text)
        })
}
