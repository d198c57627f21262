//! Edge types - relations between scope nodes
//!
//! Five relations make up the semantic graph:
//! - `Encapsulation`: script → top-level definition
//! - `Ownership`: definition → directly nested definition
//! - `Import`: script → imported script or symbol
//! - `Invoke`: caller → callee (externally observed, structurally validated)
//! - `ClassHierarchy`: child class → parent class

use crate::scope_path::ScopePath;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    Encapsulation,
    Ownership,
    Import,
    Invoke,
    ClassHierarchy,
}

impl RelationKind {
    /// Get the string representation of the relation
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Encapsulation => "Encapsulation",
            RelationKind::Ownership => "Ownership",
            RelationKind::Import => "Import",
            RelationKind::Invoke => "Invoke",
            RelationKind::ClassHierarchy => "ClassHierarchy",
        }
    }

    pub fn all() -> &'static [RelationKind] {
        &[
            RelationKind::Encapsulation,
            RelationKind::Ownership,
            RelationKind::Import,
            RelationKind::Invoke,
            RelationKind::ClassHierarchy,
        ]
    }

    /// Lexical parent → child relations.
    pub fn is_structural(&self) -> bool {
        matches!(self, RelationKind::Encapsulation | RelationKind::Ownership)
    }

    /// Relations followed when validating invoke candidates.
    pub fn is_static_reach(&self) -> bool {
        matches!(
            self,
            RelationKind::Encapsulation | RelationKind::Ownership | RelationKind::Import
        )
    }
}

impl FromStr for RelationKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "encapsulation" => Ok(RelationKind::Encapsulation),
            "ownership" => Ok(RelationKind::Ownership),
            "import" => Ok(RelationKind::Import),
            "invoke" | "call" => Ok(RelationKind::Invoke),
            "classhierarchy" | "class_hierarchy" | "inherits" => Ok(RelationKind::ClassHierarchy),
            _ => Err(crate::Error::Parse(format!("Unknown relation kind: {}", s))),
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge. Identity is the `(source, target, relation)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: ScopePath,
    pub target: ScopePath,
    pub relation: RelationKind,
}

impl Edge {
    pub fn new(source: ScopePath, target: ScopePath, relation: RelationKind) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// Structural edge from a lexical parent: `Encapsulation` when the parent
    /// is the script itself, `Ownership` otherwise.
    pub fn structural(parent: ScopePath, child: ScopePath) -> Self {
        let relation = if parent.is_script() {
            RelationKind::Encapsulation
        } else {
            RelationKind::Ownership
        };
        Self::new(parent, child, relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_roundtrip() {
        for kind in RelationKind::all() {
            let parsed: RelationKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_structural_relation_by_depth() {
        let script = ScopePath::script("m.py");
        let class = script.child("Base");
        let method = class.child("run");

        assert_eq!(Edge::structural(script, class.clone()).relation, RelationKind::Encapsulation);
        assert_eq!(Edge::structural(class, method).relation, RelationKind::Ownership);
    }

    #[test]
    fn test_static_reach_excludes_dynamic_relations() {
        assert!(RelationKind::Import.is_static_reach());
        assert!(!RelationKind::Invoke.is_static_reach());
        assert!(!RelationKind::ClassHierarchy.is_static_reach());
    }
}
