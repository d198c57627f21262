//! Syntax Capture Adapter
//!
//! Each language provides a tree-sitter grammar and a `.scm` query pack whose
//! matches are flattened into typed capture lists. Nothing downstream of the
//! adapter touches a syntax tree.

pub mod framework;
pub mod python;

pub use framework::{
    AdapterRegistry, BaseClassCapture, CaptureAdapter, DefinitionCapture, FileCaptures,
    ImportKind, ImportStatement, ModuleRef, default_registry,
};
pub use python::PythonAdapter;
