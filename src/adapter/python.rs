//! Python capture adapter
//!
//! Runs the fixed query pack in `queries/python.scm` over each file and turns
//! the matches into [`FileCaptures`].
//!
//! Capture naming convention:
//! - `class.name` / `class.body` → class definition
//! - `function.name` / `function.params` / `function.body` → function definition
//! - `class.parent` → bare base-class identifier
//! - `import.module` → `import X` (aliases dropped)
//! - `import.from_module` / `import.name` → `from X import Y`
//! - `import.wildcard_module` → `from X import *`

use crate::{Error, Result};
use crate::node::{Point, ScopeKind, Span};
use super::framework::{
    fold_import_records, BaseClassCapture, CaptureAdapter, DefinitionCapture, FileCaptures,
    ImportKind, ImportRecordKind, ImportStatement, ModuleRef, PendingImportRecord,
};
use std::collections::{HashMap, HashSet};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

/// Python adapter backed by tree-sitter-python
pub struct PythonAdapter {
    language: Language,
    query: Query,
}

impl PythonAdapter {
    /// Create the adapter and compile its query pack
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let query_source = include_str!("../../queries/python.scm");
        let query = Query::new(&language, query_source)
            .map_err(|e| Error::Adapter(format!("Query parse error: {}", e)))?;

        Ok(Self { language, query })
    }

    fn text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
        node.utf8_text(source).unwrap_or("")
    }

    fn definition(
        kind: ScopeKind,
        name: &Node,
        body: &Node,
        params: Option<&Node>,
        source: &[u8],
    ) -> Option<DefinitionCapture> {
        let body_span: Span = body.range().into();
        if body_span.is_empty() {
            // Zero-width bodies only come out of error recovery
            tracing::debug!(
                "Skipping {} {} with empty body at byte {}",
                kind,
                Self::text(name, source),
                body_span.start_byte
            );
            return None;
        }

        Some(DefinitionCapture {
            kind,
            name: Self::text(name, source).to_string(),
            name_byte: name.start_byte(),
            body: body_span,
            params: params.map(|p| p.range().into()),
        })
    }
}

impl CaptureAdapter for PythonAdapter {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn capture(&self, file_id: &str, content: &str) -> Result<FileCaptures> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::Parse(format!("Failed to parse {}", file_id)))?;

        let root = tree.root_node();
        let source_bytes = content.as_bytes();
        let file_span = Span::new(0, content.len(), Point::default(), root.end_position().into());
        let mut result = FileCaptures::new(file_id, file_span);

        let mut from_records: Vec<PendingImportRecord> = Vec::new();
        let mut seen_imports: HashSet<(usize, bool)> = HashSet::new();
        let mut seen_bases: HashSet<usize> = HashSet::new();

        let mut cursor = QueryCursor::new();
        let matches = cursor.matches(&self.query, root, source_bytes);
        for query_match in matches {
            let mut captures: HashMap<&str, Node> = HashMap::new();
            for capture in query_match.captures {
                let capture_name = self.query.capture_names()[capture.index as usize];
                captures.insert(capture_name, capture.node);
            }

            if let (Some(name), Some(body)) = (captures.get("class.name"), captures.get("class.body")) {
                if let Some(def) = Self::definition(ScopeKind::Class, name, body, None, source_bytes) {
                    result.definitions.push(def);
                }
            }

            if let (Some(name), Some(body)) = (captures.get("function.name"), captures.get("function.body")) {
                let params = captures.get("function.params");
                if let Some(def) = Self::definition(ScopeKind::Function, name, body, params, source_bytes) {
                    result.definitions.push(def);
                }
            }

            if let Some(parent) = captures.get("class.parent") {
                if seen_bases.insert(parent.start_byte()) {
                    result.base_classes.push(BaseClassCapture {
                        name: Self::text(parent, source_bytes).to_string(),
                        byte: parent.start_byte(),
                    });
                }
            }

            if let Some(module) = captures.get("import.module") {
                if seen_imports.insert((module.start_byte(), false)) {
                    result.imports.push(ImportStatement {
                        module: ModuleRef::parse(Self::text(module, source_bytes)),
                        kind: ImportKind::Module,
                        offset: module.start_byte(),
                    });
                }
            }

            if let (Some(module), Some(name)) = (captures.get("import.from_module"), captures.get("import.name")) {
                from_records.push(PendingImportRecord {
                    kind: ImportRecordKind::File,
                    name: Self::text(module, source_bytes).to_string(),
                    source_byte: module.start_byte(),
                });
                from_records.push(PendingImportRecord {
                    kind: ImportRecordKind::Instance,
                    name: Self::text(name, source_bytes).to_string(),
                    source_byte: name.start_byte(),
                });
            }

            if let Some(module) = captures.get("import.wildcard_module") {
                if seen_imports.insert((module.start_byte(), true)) {
                    result.imports.push(ImportStatement {
                        module: ModuleRef::parse(Self::text(module, source_bytes)),
                        kind: ImportKind::Wildcard,
                        offset: module.start_byte(),
                    });
                }
            }
        }

        result.imports.extend(fold_import_records(from_records));
        result.imports.sort_by_key(|statement| statement.offset);
        result.definitions.sort_by_key(|def| def.body.start_byte);
        result.base_classes.sort_by_key(|base| base.byte);

        Ok(result)
    }
}
