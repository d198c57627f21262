//! Core adapter framework
//!
//! Defines the capture types every adapter produces and the trait adapters
//! implement. Downstream phases only ever see these flat capture lists.

use crate::Result;
use crate::node::{ScopeKind, Span};
use std::path::Path;

/// A class or function definition captured from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionCapture {
    pub kind: ScopeKind,
    pub name: String,
    /// Byte offset of the name token
    pub name_byte: usize,
    /// Body block span
    pub body: Span,
    /// Parameter list span (functions only)
    pub params: Option<Span>,
}

/// A base-class identifier from a class's argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseClassCapture {
    pub name: String,
    pub byte: usize,
}

/// Module reference as written in an import (`..pkg.mod` → 2 dots, `pkg.mod`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub leading_dots: usize,
    pub dotted: String,
}

impl ModuleRef {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let without_dots = trimmed.trim_start_matches('.');
        Self {
            leading_dots: trimmed.len() - without_dots.len(),
            dotted: without_dots.split_whitespace().collect(),
        }
    }

    /// Dotted name split into path segments
    pub fn segments(&self) -> Vec<&str> {
        self.dotted.split('.').filter(|s| !s.is_empty()).collect()
    }

    pub fn is_relative(&self) -> bool {
        self.leading_dots > 0
    }
}

impl std::fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", ".".repeat(self.leading_dots), self.dotted)
    }
}

/// Whether a pending record names the module or an imported instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportRecordKind {
    File,
    Instance,
}

/// One token of a `from X import ...` statement, before the statement is
/// reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingImportRecord {
    pub kind: ImportRecordKind,
    pub name: String,
    pub source_byte: usize,
}

/// What an import statement brings into the importing file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    /// `import X` / `import X as Y`
    Module,
    /// `from X import a, b as c` (aliases already dropped)
    Names(Vec<String>),
    /// `from X import *`
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStatement {
    pub module: ModuleRef,
    pub kind: ImportKind,
    /// Byte offset of the module token
    pub offset: usize,
}

/// Rebuild `from` statements out of their pending records.
///
/// Records are ordered by source position; every `File` record opens a new
/// statement and the `Instance` records after it belong to that statement.
/// Instance records seen before any file record are dropped.
pub fn fold_import_records(mut records: Vec<PendingImportRecord>) -> Vec<ImportStatement> {
    records.sort_by_key(|record| (record.source_byte, record.kind == ImportRecordKind::Instance));
    records.dedup();

    let mut statements: Vec<ImportStatement> = Vec::new();
    for record in records {
        match record.kind {
            ImportRecordKind::File => statements.push(ImportStatement {
                module: ModuleRef::parse(&record.name),
                kind: ImportKind::Names(Vec::new()),
                offset: record.source_byte,
            }),
            ImportRecordKind::Instance => {
                if let Some(ImportStatement { kind: ImportKind::Names(names), .. }) = statements.last_mut() {
                    names.push(record.name);
                }
            }
        }
    }
    statements
}

/// Everything captured from one source file.
#[derive(Debug, Clone, Default)]
pub struct FileCaptures {
    /// Repository-relative file id
    pub file_id: String,
    /// Whole-file span
    pub span: Span,
    /// Class and function definitions, ordered by body start
    pub definitions: Vec<DefinitionCapture>,
    /// Base-class tokens, ordered by position
    pub base_classes: Vec<BaseClassCapture>,
    /// Import statements, ordered by position
    pub imports: Vec<ImportStatement>,
}

impl FileCaptures {
    pub fn new(file_id: impl Into<String>, span: Span) -> Self {
        Self {
            file_id: file_id.into(),
            span,
            ..Self::default()
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &DefinitionCapture> {
        self.definitions.iter().filter(|d| d.kind == ScopeKind::Class)
    }
}

/// Trait for capture adapters
///
/// An adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Parsing them with tree-sitter
/// 3. Running its fixed query pack and returning typed captures
pub trait CaptureAdapter: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    /// Parse one file and return its captures
    fn capture(&self, file_id: &str, source: &str) -> Result<FileCaptures>;
}

/// Registry of capture adapters
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn CaptureAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: impl CaptureAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Find an adapter for a file
    pub fn find_adapter(&self, path: &Path) -> Option<&dyn CaptureAdapter> {
        self.adapters
            .iter()
            .find(|a| a.can_handle(path))
            .map(|a| a.as_ref())
    }

    pub fn can_handle(&self, path: &Path) -> bool {
        self.find_adapter(path).is_some()
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    registry.register(super::python::PythonAdapter::new()?);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestAdapter;

    impl CaptureAdapter for TestAdapter {
        fn language_name(&self) -> &str { "test" }
        fn file_extensions(&self) -> &[&str] { &["test"] }
        fn capture(&self, file_id: &str, _source: &str) -> Result<FileCaptures> {
            Ok(FileCaptures::new(file_id, Span::default()))
        }
    }

    fn record(kind: ImportRecordKind, name: &str, source_byte: usize) -> PendingImportRecord {
        PendingImportRecord { kind, name: name.to_string(), source_byte }
    }

    #[test]
    fn test_registry() {
        let mut registry = AdapterRegistry::new();
        registry.register(TestAdapter);

        assert!(registry.find_adapter(Path::new("foo.test")).is_some());
        assert!(registry.find_adapter(Path::new("foo.other")).is_none());
    }

    #[test]
    fn test_module_ref_parse() {
        let relative = ModuleRef::parse("..pkg.mod");
        assert_eq!(relative.leading_dots, 2);
        assert_eq!(relative.segments(), vec!["pkg", "mod"]);

        let bare = ModuleRef::parse("..");
        assert_eq!(bare.leading_dots, 2);
        assert!(bare.segments().is_empty());
        assert_eq!(bare.to_string(), "..");

        let absolute = ModuleRef::parse("os.path");
        assert!(!absolute.is_relative());
    }

    #[test]
    fn test_fold_import_records_rebuilds_statements() {
        // from a import x, y   /   from .b import z
        let records = vec![
            record(ImportRecordKind::Instance, "z", 40),
            record(ImportRecordKind::File, "a", 5),
            record(ImportRecordKind::Instance, "y", 17),
            record(ImportRecordKind::File, ".b", 30),
            record(ImportRecordKind::Instance, "x", 14),
            // Repeated by a second query match
            record(ImportRecordKind::File, "a", 5),
        ];

        let statements = fold_import_records(records);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].module.dotted, "a");
        assert_eq!(statements[0].kind, ImportKind::Names(vec!["x".into(), "y".into()]));
        assert_eq!(statements[1].module.leading_dots, 1);
        assert_eq!(statements[1].kind, ImportKind::Names(vec!["z".into()]));
    }

    #[test]
    fn test_fold_drops_orphan_instances() {
        let statements = fold_import_records(vec![record(ImportRecordKind::Instance, "x", 3)]);
        assert!(statements.is_empty());
    }
}
